// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export — replay the annotation store onto copies of the source pages.
//
// Pages are emitted in store order, deleted pages excluded. Each page gets
// its additive rotation, then its annotations in paint order. A failure on a
// single page or annotation is recorded in the report and the export goes on;
// source loading, font fallback and `save` failures abort with `Export`.

use std::collections::{BTreeSet, HashMap};

use pagemark_core::annotation::{Annotation, AnnotationKind, TextAnnotation};
use pagemark_core::config::EditorConfig;
use pagemark_core::error::{PagemarkError, Result};
use pagemark_core::geometry::{DocBox, DocPoint, DocRect, PageSize, bounds_to_document};
use pagemark_core::page::Page;
use pagemark_core::traits::{
    DocumentCompositor, FontHandle, FontSource, ImageHandle, ImageParams, LineParams, PageHandle, RectParams,
    TextParams,
};
use pagemark_core::types::{AnnotationId, Color, ImageData, PageId, StandardFont};
use pagemark_core::visibility::{MaskExtent, TextExport, text_export};
use pagemark_editor::busy::BusyFlag;
use pagemark_editor::store::AnnotationStore;
use tracing::{debug, info, instrument, warn};

use crate::text::transliterate;

/// Padding around the measured text extent of an authored-text mask, in points.
const TEXT_MASK_PADDING: f64 = 4.0;

/// Something left out of the exported document.
#[derive(Debug, Clone, PartialEq)]
pub enum SkippedItem {
    Page {
        page: PageId,
        reason: String,
    },
    Annotation {
        page: PageId,
        annotation: AnnotationId,
        reason: String,
    },
}

/// Result of a successful export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Serialised output document.
    pub bytes: Vec<u8>,
    /// Pages written.
    pub pages: usize,
    pub skipped: Vec<SkippedItem>,
}

impl ExportReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Builds the output document from an [`AnnotationStore`].
#[derive(Debug)]
pub struct Exporter {
    config: EditorConfig,
    busy: BusyFlag,
}

impl Exporter {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            busy: BusyFlag::new("export"),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Export every non-deleted page of `store` through `compositor`.
    ///
    /// The store is only read; a failed export leaves it untouched.
    #[instrument(skip_all, fields(pages = store.pages().len()))]
    pub fn export<C: DocumentCompositor>(&self, store: &AnnotationStore, compositor: &mut C) -> Result<ExportReport> {
        let _guard = self.busy.try_acquire()?;

        let mut session = Session {
            config: &self.config,
            fonts: FontResolver::new(&self.config, compositor),
            images: HashMap::new(),
            skipped: Vec::new(),
        };

        let needed: BTreeSet<usize> = store
            .pages()
            .iter()
            .filter(|page| !page.deleted)
            .map(|page| page.source_index)
            .collect();
        for index in needed {
            // Pages pointing at an unknown source are skipped at copy time.
            let Some(source) = store.source(index) else {
                continue;
            };
            compositor
                .load_source(source)
                .map_err(|err| PagemarkError::Export(format!("cannot read source document {index}: {err}")))?;
        }

        let mut written = 0;
        for page in store.pages().iter().filter(|page| !page.deleted) {
            match session.export_page(compositor, page) {
                Ok(()) => written += 1,
                Err(err @ PagemarkError::Export(_)) => return Err(err),
                Err(err) => {
                    warn!(page = %page.id, %err, "Page skipped");
                    session.skipped.push(SkippedItem::Page {
                        page: page.id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let bytes = compositor
            .save()
            .map_err(|err| PagemarkError::Export(format!("cannot write document: {err}")))?;
        info!(pages = written, skipped = session.skipped.len(), bytes = bytes.len(), "Export complete");
        Ok(ExportReport {
            bytes,
            pages: written,
            skipped: session.skipped,
        })
    }
}

/// State of one export run.
struct Session<'a> {
    config: &'a EditorConfig,
    fonts: FontResolver,
    /// Embedded images keyed by the address of their shared bytes, so a
    /// watermark repeated on every page is embedded once.
    images: HashMap<(usize, usize), ImageHandle>,
    skipped: Vec<SkippedItem>,
}

impl Session<'_> {
    fn export_page<C: DocumentCompositor>(&mut self, compositor: &mut C, page: &Page) -> Result<()> {
        let handle = compositor.copy_page(page.source_index, page.source_page_index)?;

        let delta = page.rotation.degrees();
        if delta != 0 {
            let existing = compositor.rotation(handle)?;
            compositor.set_rotation(handle, (existing + delta).rem_euclid(360))?;
        }

        let size = compositor.page_size(handle)?;
        for annotation in page.annotations() {
            match self.draw_annotation(compositor, handle, size, annotation) {
                Ok(()) => {}
                Err(err @ PagemarkError::Export(_)) => return Err(err),
                Err(err) => {
                    let err = PagemarkError::AnnotationConversion {
                        annotation: annotation.id,
                        reason: err.to_string(),
                    };
                    warn!(page = %page.id, %err, "Annotation skipped");
                    self.skipped.push(SkippedItem::Annotation {
                        page: page.id,
                        annotation: annotation.id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        compositor.add_page(handle)?;
        debug!(page = %page.id, annotations = page.annotations().len(), "Page exported");
        Ok(())
    }

    fn draw_annotation<C: DocumentCompositor>(
        &mut self,
        compositor: &mut C,
        page: PageHandle,
        size: PageSize,
        annotation: &Annotation,
    ) -> Result<()> {
        let doc_box = bounds_to_document(&annotation.bounds, size);
        match &annotation.kind {
            AnnotationKind::Line { color, line_width } => {
                let (start, end) = doc_box.line_endpoints();
                compositor.draw_line(
                    page,
                    &LineParams {
                        start,
                        end,
                        thickness: *line_width,
                        color: *color,
                        opacity: annotation.opacity,
                    },
                )
            }
            AnnotationKind::Highlight { color } => compositor.draw_rectangle(
                page,
                &RectParams {
                    rect: doc_box.rect(),
                    color: *color,
                    opacity: annotation.opacity,
                },
            ),
            AnnotationKind::Erase => compositor.draw_rectangle(
                page,
                &RectParams {
                    rect: doc_box.rect(),
                    color: Color::WHITE,
                    opacity: 1.0,
                },
            ),
            AnnotationKind::Image { data } => {
                let image = self.embed_image(compositor, data)?;
                compositor.draw_image(
                    page,
                    &ImageParams {
                        image,
                        rect: doc_box.rect(),
                        opacity: annotation.opacity,
                    },
                )
            }
            AnnotationKind::Text(text) => self.draw_text(compositor, page, doc_box, text, annotation.opacity),
        }
    }

    fn embed_image<C: DocumentCompositor>(&mut self, compositor: &mut C, data: &ImageData) -> Result<ImageHandle> {
        let bytes = data.bytes();
        let key = (bytes.as_ptr() as usize, bytes.len());
        if let Some(handle) = self.images.get(&key) {
            return Ok(*handle);
        }
        let handle = compositor.embed_image(bytes)?;
        self.images.insert(key, handle);
        Ok(handle)
    }

    fn draw_text<C: DocumentCompositor>(
        &mut self,
        compositor: &mut C,
        page: PageHandle,
        doc_box: DocBox,
        text: &TextAnnotation,
        opacity: f64,
    ) -> Result<()> {
        // The box background covers the whole box, even when the text itself
        // is left to the page. Plain white always paints opaque.
        if let Some(background) = text.background {
            let (color, opacity) = if background.is_white() {
                (Color::WHITE, 1.0)
            } else {
                (background, opacity)
            };
            compositor.draw_rectangle(
                page,
                &RectParams {
                    rect: doc_box.rect(),
                    color,
                    opacity,
                },
            )?;
        }

        let (mask, mask_color) = match text_export(text) {
            TextExport::Skip => return Ok(()),
            TextExport::Redraw { mask, mask_color } => (mask, mask_color),
        };
        if text.content.is_empty() {
            return Ok(());
        }

        let (font, fallback) = self.fonts.resolve(compositor, text)?;
        let content = if fallback {
            transliterate(&text.content)
        } else {
            text.content.clone()
        };
        let size = text.font_size / self.config.px_per_pt;
        let lines: Vec<&str> = content.split('\n').collect();

        let mask_rect = match mask {
            MaskExtent::FullBox => doc_box.rect(),
            MaskExtent::TextExtent => {
                let mut widest: f64 = 0.0;
                for line in &lines {
                    widest = widest.max(compositor.text_width(font, line, size)?);
                }
                let height = size * lines.len() as f64;
                DocRect::new(
                    doc_box.x,
                    doc_box.top - height,
                    widest + TEXT_MASK_PADDING,
                    height + TEXT_MASK_PADDING,
                )
            }
        };
        compositor.draw_rectangle(
            page,
            &RectParams {
                rect: mask_rect,
                color: mask_color,
                opacity: 1.0,
            },
        )?;

        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            compositor.draw_text(
                page,
                &TextParams {
                    text: (*line).to_string(),
                    origin: DocPoint::new(doc_box.x, doc_box.top - size * (i + 1) as f64),
                    size,
                    font,
                    color: text.color,
                },
            )?;
        }
        Ok(())
    }
}

/// Picks the font for each text box: the configured full-coverage font when
/// it embeds, otherwise the standard font for the box's family and weight.
struct FontResolver {
    custom: Option<FontHandle>,
    standard: HashMap<StandardFont, FontHandle>,
}

impl FontResolver {
    fn new<C: DocumentCompositor>(config: &EditorConfig, compositor: &mut C) -> Self {
        let custom = config.custom_font_path.as_ref().and_then(|path| {
            let bytes = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(path = %path.display(), %err, "Custom font unreadable, using standard fonts");
                    return None;
                }
            };
            match compositor.embed_font(FontSource::Embedded(&bytes)) {
                Ok(handle) => Some(handle),
                Err(err) => {
                    warn!(path = %path.display(), %err, "Custom font rejected, using standard fonts");
                    None
                }
            }
        });
        Self {
            custom,
            standard: HashMap::new(),
        }
    }

    /// Font for `text`, and whether it is a narrow-coverage fallback.
    fn resolve<C: DocumentCompositor>(&mut self, compositor: &mut C, text: &TextAnnotation) -> Result<(FontHandle, bool)> {
        if let Some(handle) = self.custom {
            return Ok((handle, false));
        }
        let font = StandardFont::for_family(text.font_family, text.bold);
        if let Some(handle) = self.standard.get(&font) {
            return Ok((*handle, true));
        }
        let handle = compositor
            .embed_font(FontSource::Standard(font))
            .map_err(|err| PagemarkError::Export(format!("cannot embed {}: {err}", font.base_name())))?;
        self.standard.insert(font, handle);
        Ok((handle, true))
    }
}
