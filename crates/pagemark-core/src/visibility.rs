// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Provenance-driven visibility and masking policy.
//
// The on-screen overlay and the exporter both ask this module how a text box
// should appear, so the two can never disagree. Nothing here is stored; every
// answer is re-derived from the annotation at the time of the read.

use crate::annotation::{Annotation, AnnotationKind, TextAnnotation};
use crate::types::Color;

/// Where a text box's content came from, and whether it was edited since.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextProvenance {
    /// Written by the user; no OCR original.
    Authored,
    /// Recognised by OCR and still equal to the recognised text.
    OcrUnmodified,
    /// Recognised by OCR, then edited.
    OcrModified,
}

impl TextProvenance {
    pub fn of(text: &TextAnnotation) -> Self {
        match &text.original_content {
            None => Self::Authored,
            Some(original) if *original == text.content => Self::OcrUnmodified,
            Some(_) => Self::OcrModified,
        }
    }

    pub fn has_original(self) -> bool {
        !matches!(self, Self::Authored)
    }
}

/// How a text box renders on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextVisibility {
    /// Glyphs drawn in their real colour. When false they are transparent and
    /// the rasterized page supplies the visible text.
    pub glyphs_visible: bool,
    /// Opaque background covering the original page pixels.
    pub mask_visible: bool,
}

/// Visibility rule: glyphs show when selected, modified or new; the mask
/// shows when selected or modified.
pub fn text_visibility(text: &TextAnnotation, selected: bool) -> TextVisibility {
    let provenance = TextProvenance::of(text);
    let modified = provenance == TextProvenance::OcrModified;
    let is_new = provenance == TextProvenance::Authored;
    TextVisibility {
        glyphs_visible: selected || modified || is_new,
        mask_visible: selected || modified,
    }
}

/// Extent of the covering rectangle drawn behind exported text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskExtent {
    /// Full annotation box — hides the original glyphs underneath.
    FullBox,
    /// Measured text width plus padding — must not blot out neighbours.
    TextExtent,
}

/// What the exporter does with a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextExport {
    /// The rasterized page already shows this text.
    Skip,
    /// Cover with a mask, then draw the text on top.
    Redraw { mask: MaskExtent, mask_color: Color },
}

/// Export rule for text boxes, the export-time face of [`text_visibility`].
pub fn text_export(text: &TextAnnotation) -> TextExport {
    let mask_color = text.background.unwrap_or(Color::WHITE);
    match TextProvenance::of(text) {
        TextProvenance::OcrUnmodified => TextExport::Skip,
        TextProvenance::OcrModified => TextExport::Redraw {
            mask: MaskExtent::FullBox,
            mask_color,
        },
        TextProvenance::Authored => TextExport::Redraw {
            mask: MaskExtent::TextExtent,
            mask_color,
        },
    }
}

/// Compositing mode of an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    Multiply,
}

/// Fill of an annotation's overlay box on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub fill: Option<Color>,
    pub opacity: f64,
    pub blend: BlendMode,
}

/// Overlay fill for any annotation. Lines and images draw their own content
/// and get no fill.
pub fn overlay_style(annotation: &Annotation, selected: bool) -> OverlayStyle {
    let (fill, blend) = match &annotation.kind {
        AnnotationKind::Text(text) => {
            let fill = if text_visibility(text, selected).mask_visible {
                Some(text.background.unwrap_or(Color::WHITE))
            } else {
                text.background
            };
            (fill, BlendMode::Normal)
        }
        AnnotationKind::Highlight { color } => (Some(*color), BlendMode::Multiply),
        AnnotationKind::Erase => (Some(Color::WHITE), BlendMode::Normal),
        AnnotationKind::Line { .. } | AnnotationKind::Image { .. } => (None, BlendMode::Normal),
    };
    OverlayStyle {
        fill,
        opacity: annotation.opacity,
        blend,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;

    fn ocr(content: &str, original: &str) -> TextAnnotation {
        let mut text = TextAnnotation::recognized(original, 20.0);
        text.content = content.to_string();
        text
    }

    #[test]
    fn unedited_ocr_text_is_see_through() {
        let text = ocr("Invoice", "Invoice");
        assert_eq!(
            text_visibility(&text, false),
            TextVisibility {
                glyphs_visible: false,
                mask_visible: false
            }
        );
        assert_eq!(text_export(&text), TextExport::Skip);
    }

    #[test]
    fn selecting_ocr_text_reveals_it() {
        let text = ocr("Invoice", "Invoice");
        assert_eq!(
            text_visibility(&text, true),
            TextVisibility {
                glyphs_visible: true,
                mask_visible: true
            }
        );
    }

    #[test]
    fn edited_ocr_text_masks_the_full_box() {
        let text = ocr("Invoices", "Invoice");
        let vis = text_visibility(&text, false);
        assert!(vis.glyphs_visible && vis.mask_visible);
        assert_eq!(
            text_export(&text),
            TextExport::Redraw {
                mask: MaskExtent::FullBox,
                mask_color: Color::WHITE
            }
        );
    }

    #[test]
    fn reverting_an_edit_restores_skip() {
        let mut text = ocr("Invoices", "Invoice");
        text.content = "Invoice".into();
        assert_eq!(TextProvenance::of(&text), TextProvenance::OcrUnmodified);
    }

    #[test]
    fn authored_text_is_visible_without_mask() {
        let mut text = TextAnnotation::authored("Hello", 24.0);
        let vis = text_visibility(&text, false);
        assert!(vis.glyphs_visible);
        assert!(!vis.mask_visible);

        text.background = Some(Color::rgb(255, 0, 0));
        assert_eq!(
            text_export(&text),
            TextExport::Redraw {
                mask: MaskExtent::TextExtent,
                mask_color: Color::rgb(255, 0, 0)
            }
        );
    }

    #[test]
    fn overlay_fills_follow_variant() {
        let erase = Annotation::erase(Bounds::default());
        assert_eq!(overlay_style(&erase, false).fill, Some(Color::WHITE));

        let highlight = Annotation::highlight(Bounds::default(), Color::HIGHLIGHT);
        let style = overlay_style(&highlight, false);
        assert_eq!(style.blend, BlendMode::Multiply);
        assert_eq!(style.opacity, 0.4);

        let ocr_text = Annotation::text(Bounds::default(), ocr("a", "a"));
        assert_eq!(overlay_style(&ocr_text, false).fill, None);
        assert_eq!(overlay_style(&ocr_text, true).fill, Some(Color::WHITE));
    }
}
