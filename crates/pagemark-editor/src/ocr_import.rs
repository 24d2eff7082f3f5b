// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR import — recognises a page preview and turns each line into an
// editable, see-through text box.
//
// Recognition runs on a clone of the preview, so the store is only touched
// when the finished annotations are appended. A recognition failure adds
// nothing and leaves the page's existing annotations in place.

use std::sync::Arc;

use pagemark_core::annotation::{Annotation, TextAnnotation};
use pagemark_core::config::EditorConfig;
use pagemark_core::error::{PagemarkError, Result};
use pagemark_core::geometry::pixels_to_bounds;
use pagemark_core::page::Page;
use pagemark_core::traits::{OcrEngine, OcrLine};
use pagemark_core::types::{AnnotationId, PageId, RasterImage};
use tracing::{debug, info, instrument};

use crate::busy::BusyFlag;
use crate::store::AnnotationStore;

/// Text boxes recognised on one page, ready to append.
#[derive(Debug, Clone)]
pub struct RecognizedPage {
    pub page: PageId,
    pub annotations: Vec<Annotation>,
}

impl RecognizedPage {
    /// Append to the page, after whatever it already holds. A page removed
    /// in the meantime receives nothing.
    pub fn commit(self, store: &mut AnnotationStore) -> Vec<AnnotationId> {
        store.append_annotations(self.page, self.annotations)
    }
}

/// Runs an [`OcrEngine`] over page previews.
pub struct OcrImporter<E> {
    engine: E,
    language: String,
    min_line_chars: usize,
    font_ratio: f64,
    busy: BusyFlag,
}

impl<E: OcrEngine> OcrImporter<E> {
    pub fn new(engine: E, config: &EditorConfig) -> Self {
        Self {
            engine,
            language: config.ocr_language.clone(),
            min_line_chars: config.ocr_min_line_chars,
            font_ratio: config.ocr_font_ratio,
            busy: BusyFlag::new("ocr"),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Recognise `page`. Engine failures become `Recognition` errors.
    #[instrument(skip_all, fields(page = %page.id))]
    pub async fn recognize(&self, page: &Page) -> Result<RecognizedPage> {
        let _guard = self.busy.try_acquire()?;
        let preview: Arc<RasterImage> = Arc::clone(&page.preview);
        if preview.width() == 0 || preview.height() == 0 {
            return Err(PagemarkError::Recognition("page preview is empty".into()));
        }

        let lines = self
            .engine
            .recognize(&preview, &self.language)
            .await
            .map_err(|e| PagemarkError::Recognition(e.to_string()))?;

        let total = lines.len();
        let annotations: Vec<Annotation> = lines
            .into_iter()
            .filter_map(|line| self.to_annotation(line, &preview))
            .collect();

        info!(recognised = total, kept = annotations.len(), "OCR complete");
        Ok(RecognizedPage {
            page: page.id,
            annotations,
        })
    }

    /// Recognise the page and append the results to the store.
    pub async fn run(&self, store: &mut AnnotationStore, page_id: PageId) -> Result<Vec<AnnotationId>> {
        let page = store
            .page(page_id)
            .cloned()
            .ok_or_else(|| PagemarkError::Recognition("page no longer exists".into()))?;
        let recognized = self.recognize(&page).await?;
        Ok(recognized.commit(store))
    }

    fn to_annotation(&self, line: OcrLine, image: &RasterImage) -> Option<Annotation> {
        let text = line.text.trim();
        if text.chars().count() < self.min_line_chars {
            debug!(text, "Dropping OCR noise");
            return None;
        }
        let bbox = line.bbox;
        let bounds = pixels_to_bounds(
            bbox.x0,
            bbox.y0,
            bbox.x1,
            bbox.y1,
            image.width() as f64,
            image.height() as f64,
        );
        let font_size = (bbox.y1 - bbox.y0) * self.font_ratio;
        Some(Annotation::text(bounds, TextAnnotation::recognized(text, font_size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pagemark_core::Bounds;
    use pagemark_core::traits::PixelBox;
    use pagemark_core::visibility::{TextProvenance, text_visibility};

    struct FakeOcr(Vec<OcrLine>);

    #[async_trait]
    impl OcrEngine for FakeOcr {
        async fn recognize(&self, _image: &RasterImage, language: &str) -> Result<Vec<OcrLine>> {
            assert_eq!(language, "eng");
            tokio::task::yield_now().await;
            Ok(self.0.clone())
        }
    }

    struct BrokenOcr;

    #[async_trait]
    impl OcrEngine for BrokenOcr {
        async fn recognize(&self, _image: &RasterImage, _language: &str) -> Result<Vec<OcrLine>> {
            Err(PagemarkError::Recognition("model not loaded".into()))
        }
    }

    fn line(x0: f64, y0: f64, x1: f64, y1: f64, text: &str) -> OcrLine {
        OcrLine {
            bbox: PixelBox { x0, y0, x1, y1 },
            text: text.into(),
        }
    }

    fn store_with_page() -> (AnnotationStore, PageId) {
        let mut store = AnnotationStore::new();
        let source = store.add_source(None, vec![0u8]);
        let page = store.add_pages(source, vec![RasterImage::new(200, 100, vec![255u8; 80_000]).unwrap()])[0];
        (store, page)
    }

    #[tokio::test]
    async fn lines_become_see_through_text() {
        let (mut store, page) = store_with_page();
        let importer = OcrImporter::new(
            FakeOcr(vec![line(20.0, 10.0, 120.0, 30.0, "  Invoice  "), line(0.0, 0.0, 5.0, 5.0, " x ")]),
            &EditorConfig::default(),
        );
        let ids = importer.run(&mut store, page).await.unwrap();
        assert_eq!(ids.len(), 1);

        let ann = store.page(page).unwrap().annotation(ids[0]).unwrap();
        let expected = Bounds::new(10.0, 10.0, 50.0, 20.0);
        for (got, want) in [
            (ann.bounds.x, expected.x),
            (ann.bounds.y, expected.y),
            (ann.bounds.width, expected.width),
            (ann.bounds.height, expected.height),
        ] {
            assert!((got - want).abs() < 1e-9);
        }
        let text = ann.as_text().unwrap();
        assert_eq!(text.content, "Invoice");
        assert_eq!(text.original_content.as_deref(), Some("Invoice"));
        assert!(text.interactive);
        assert!((text.font_size - 17.0).abs() < 1e-9);
        assert_eq!(TextProvenance::of(text), TextProvenance::OcrUnmodified);
        assert!(!text_visibility(text, false).glyphs_visible);
    }

    #[tokio::test]
    async fn existing_annotations_are_kept() {
        let (mut store, page) = store_with_page();
        let existing = store
            .add_annotation(page, Annotation::erase(Bounds::new(1.0, 1.0, 2.0, 2.0)))
            .unwrap();
        let importer = OcrImporter::new(FakeOcr(vec![line(0.0, 0.0, 50.0, 10.0, "Total")]), &EditorConfig::default());
        importer.run(&mut store, page).await.unwrap();

        let annotations = store.page(page).unwrap().annotations();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations[0].id, existing);
    }

    #[tokio::test]
    async fn failure_adds_nothing() {
        let (mut store, page) = store_with_page();
        store.add_annotation(page, Annotation::erase(Bounds::new(1.0, 1.0, 2.0, 2.0)));
        let importer = OcrImporter::new(BrokenOcr, &EditorConfig::default());
        let err = importer.run(&mut store, page).await.unwrap_err();
        assert!(matches!(err, PagemarkError::Recognition(_)));
        assert_eq!(store.page(page).unwrap().annotations().len(), 1);
        assert!(!importer.is_busy());
    }

    #[tokio::test]
    async fn overlapping_runs_are_rejected() {
        let (store, page) = store_with_page();
        let page = store.page(page).unwrap().clone();
        let importer = OcrImporter::new(FakeOcr(vec![line(0.0, 0.0, 50.0, 10.0, "Total")]), &EditorConfig::default());
        let (first, second) = tokio::join!(importer.recognize(&page), importer.recognize(&page));
        assert_eq!(first.unwrap().annotations.len(), 1);
        assert!(matches!(second, Err(PagemarkError::Busy("ocr"))));
    }

    #[tokio::test]
    async fn results_for_a_removed_page_are_dropped() {
        let (mut store, page) = store_with_page();
        let snapshot = store.page(page).unwrap().clone();
        let importer = OcrImporter::new(FakeOcr(vec![line(0.0, 0.0, 50.0, 10.0, "Total")]), &EditorConfig::default());
        let recognized = importer.recognize(&snapshot).await.unwrap();
        store.remove_page(page);
        assert!(recognized.commit(&mut store).is_empty());
    }
}
