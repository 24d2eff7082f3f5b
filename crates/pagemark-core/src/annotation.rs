// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Annotation data model — a tagged union over the five annotation variants,
// each carrying only the fields it uses.

use serde::{Deserialize, Serialize};

use crate::geometry::Bounds;
use crate::types::{AnnotationId, Color, FontFamily, ImageData};

/// Opacity given to new highlights so the page shows through.
pub const HIGHLIGHT_OPACITY: f64 = 0.4;

/// One mark placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    /// Position and size as percentages of the unrotated raster.
    pub bounds: Bounds,
    /// 0.0–1.0.
    pub opacity: f64,
    pub kind: AnnotationKind,
}

/// Variant-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotationKind {
    Text(TextAnnotation),
    Line {
        color: Color,
        /// Stroke thickness in display pixels.
        line_width: f64,
    },
    Highlight {
        color: Color,
    },
    /// Opaque white cover, whatever colour the tool had selected.
    Erase,
    Image {
        data: ImageData,
    },
}

/// Which variant an annotation is, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationType {
    Text,
    Line,
    Highlight,
    Erase,
    Image,
}

/// Text box content and style, plus OCR provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnnotation {
    /// Current text.
    pub content: String,
    /// Text as recognised by OCR. `None` means the user wrote this box.
    pub original_content: Option<String>,
    /// Display-space pixels.
    pub font_size: f64,
    pub font_family: FontFamily,
    pub bold: bool,
    pub color: Color,
    /// Mask colour drawn behind the text; `None` is transparent.
    pub background: Option<Color>,
    /// OCR-sourced boxes stay see-through until selected or edited.
    pub interactive: bool,
}

impl TextAnnotation {
    /// A user-authored text box.
    pub fn authored(content: impl Into<String>, font_size: f64) -> Self {
        Self {
            content: content.into(),
            original_content: None,
            font_size,
            font_family: FontFamily::Helvetica,
            bold: false,
            color: Color::BLACK,
            background: None,
            interactive: false,
        }
    }

    /// A text box recognised by OCR; content and original start identical.
    pub fn recognized(text: impl Into<String>, font_size: f64) -> Self {
        let text = text.into();
        Self {
            content: text.clone(),
            original_content: Some(text),
            font_size,
            font_family: FontFamily::Helvetica,
            bold: false,
            color: Color::BLACK,
            background: None,
            interactive: true,
        }
    }
}

impl Annotation {
    /// New annotation with a fresh id and opacity 1.
    pub fn new(bounds: Bounds, kind: AnnotationKind) -> Self {
        Self {
            id: AnnotationId::new(),
            bounds,
            opacity: 1.0,
            kind,
        }
    }

    pub fn text(bounds: Bounds, text: TextAnnotation) -> Self {
        Self::new(bounds, AnnotationKind::Text(text))
    }

    pub fn line(bounds: Bounds, color: Color, line_width: f64) -> Self {
        Self::new(bounds, AnnotationKind::Line { color, line_width })
    }

    pub fn highlight(bounds: Bounds, color: Color) -> Self {
        Self {
            opacity: HIGHLIGHT_OPACITY,
            ..Self::new(bounds, AnnotationKind::Highlight { color })
        }
    }

    pub fn erase(bounds: Bounds) -> Self {
        Self::new(bounds, AnnotationKind::Erase)
    }

    pub fn image(bounds: Bounds, data: ImageData) -> Self {
        Self::new(bounds, AnnotationKind::Image { data })
    }

    /// Builder-style opacity override.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    pub fn annotation_type(&self) -> AnnotationType {
        match self.kind {
            AnnotationKind::Text(_) => AnnotationType::Text,
            AnnotationKind::Line { .. } => AnnotationType::Line,
            AnnotationKind::Highlight { .. } => AnnotationType::Highlight,
            AnnotationKind::Erase => AnnotationType::Erase,
            AnnotationKind::Image { .. } => AnnotationType::Image,
        }
    }

    pub fn as_text(&self) -> Option<&TextAnnotation> {
        match &self.kind {
            AnnotationKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Lines keep signed extents; every other variant is a box.
    pub fn is_line(&self) -> bool {
        matches!(self.kind, AnnotationKind::Line { .. })
    }

    /// Apply a partial update. Fields that do not belong to this variant are
    /// ignored; the id and variant can never change.
    pub fn apply(&mut self, patch: &AnnotationPatch) {
        if let Some(x) = patch.x {
            self.bounds.x = x;
        }
        if let Some(y) = patch.y {
            self.bounds.y = y;
        }
        if let Some(width) = patch.width {
            self.bounds.width = width;
        }
        if let Some(height) = patch.height {
            self.bounds.height = height;
        }
        if !self.is_line() {
            normalize_extents(&mut self.bounds);
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity.clamp(0.0, 1.0);
        }

        match &mut self.kind {
            AnnotationKind::Text(text) => {
                if let Some(content) = &patch.content {
                    text.content.clone_from(content);
                }
                if let Some(size) = patch.font_size {
                    text.font_size = size;
                }
                if let Some(family) = patch.font_family {
                    text.font_family = family;
                }
                if let Some(bold) = patch.bold {
                    text.bold = bold;
                }
                if let Some(color) = patch.color {
                    text.color = color;
                }
                if let Some(background) = patch.background {
                    text.background = background;
                }
            }
            AnnotationKind::Line { color, line_width } => {
                if let Some(new_color) = patch.color {
                    *color = new_color;
                }
                if let Some(width) = patch.line_width {
                    *line_width = width;
                }
            }
            AnnotationKind::Highlight { color } => {
                if let Some(new_color) = patch.color {
                    *color = new_color;
                }
            }
            AnnotationKind::Erase | AnnotationKind::Image { .. } => {}
        }
    }
}

/// Keep box extents non-negative by moving the origin instead.
fn normalize_extents(bounds: &mut Bounds) {
    if bounds.width < 0.0 {
        bounds.x += bounds.width;
        bounds.width = -bounds.width;
    }
    if bounds.height < 0.0 {
        bounds.y += bounds.height;
        bounds.height = -bounds.height;
    }
}

/// Partial update for [`Annotation::apply`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationPatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub opacity: Option<f64>,
    pub content: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<FontFamily>,
    pub bold: Option<bool>,
    pub color: Option<Color>,
    /// `Some(None)` clears the mask colour back to transparent.
    pub background: Option<Option<Color>>,
    pub line_width: Option<f64>,
}

impl AnnotationPatch {
    /// Move to a new origin.
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Replace the text content.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_ignores_fields_of_other_variants() {
        let mut erase = Annotation::erase(Bounds::new(1.0, 2.0, 3.0, 4.0));
        let before = erase.clone();
        erase.apply(&AnnotationPatch {
            content: Some("nope".into()),
            color: Some(Color::WHITE),
            ..AnnotationPatch::default()
        });
        assert_eq!(erase, before);
    }

    #[test]
    fn patch_updates_text_fields() {
        let mut ann = Annotation::text(Bounds::default(), TextAnnotation::authored("a", 24.0));
        ann.apply(&AnnotationPatch {
            content: Some("b".into()),
            bold: Some(true),
            background: Some(Some(Color::WHITE)),
            ..AnnotationPatch::default()
        });
        let text = ann.as_text().unwrap();
        assert_eq!(text.content, "b");
        assert!(text.bold);
        assert_eq!(text.background, Some(Color::WHITE));

        ann.apply(&AnnotationPatch {
            background: Some(None),
            ..AnnotationPatch::default()
        });
        assert_eq!(ann.as_text().unwrap().background, None);
    }

    #[test]
    fn boxes_stay_non_negative_lines_stay_signed() {
        let mut highlight = Annotation::highlight(Bounds::new(50.0, 50.0, 10.0, 10.0), Color::HIGHLIGHT);
        highlight.apply(&AnnotationPatch {
            width: Some(-20.0),
            ..AnnotationPatch::default()
        });
        assert_eq!(highlight.bounds, Bounds::new(30.0, 50.0, 20.0, 10.0));

        let mut line = Annotation::line(Bounds::new(50.0, 50.0, 10.0, 10.0), Color::BLACK, 3.0);
        line.apply(&AnnotationPatch {
            width: Some(-20.0),
            ..AnnotationPatch::default()
        });
        assert_eq!(line.bounds, Bounds::new(50.0, 50.0, -20.0, 10.0));
    }

    #[test]
    fn highlight_defaults_to_translucent() {
        let ann = Annotation::highlight(Bounds::default(), Color::HIGHLIGHT);
        assert_eq!(ann.opacity, HIGHLIGHT_OPACITY);
        assert_eq!(ann.annotation_type(), AnnotationType::Highlight);
    }

    #[test]
    fn serializes_with_type_tag() {
        let ann = Annotation::line(Bounds::new(1.0, 2.0, 3.0, -4.0), Color::BLACK, 2.0);
        let json = serde_json::to_value(&ann).unwrap();
        assert_eq!(json["kind"]["type"], "line");
        assert_eq!(json["kind"]["color"], "#000000");
        let back: Annotation = serde_json::from_value(json).unwrap();
        assert_eq!(back, ann);
    }
}
