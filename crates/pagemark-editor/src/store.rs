// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Annotation store — the single owner of source documents, pages, their
// annotations, and the current selection.
//
// Every mutation goes through the methods here so model invariants stay in
// one place. Operations are synchronous and total: an unknown page or
// annotation id is a silent no-op, because it usually means the UI raced a
// removal (delete after the page went away) rather than a real failure.

use pagemark_core::annotation::{Annotation, AnnotationPatch};
use pagemark_core::geometry::{PercentPoint, distance_to_line};
use pagemark_core::page::Page;
use pagemark_core::types::{AnnotationId, PageId, RasterImage, SourceDocument};
use tracing::{debug, info};

/// The selected annotation and the page it lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub page: PageId,
    pub annotation: AnnotationId,
}

/// Owns every page and annotation. Ownership is strictly hierarchical:
/// store → page → annotation.
#[derive(Debug, Default)]
pub struct AnnotationStore {
    sources: Vec<SourceDocument>,
    pages: Vec<Page>,
    selection: Option<Selection>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Source documents -----------------------------------------------------

    /// Register an uploaded document and return its zero-based index.
    pub fn add_source(&mut self, name: Option<String>, bytes: impl Into<std::sync::Arc<[u8]>>) -> usize {
        let index = self.sources.len();
        self.sources.push(SourceDocument::new(index, name, bytes));
        index
    }

    pub fn sources(&self) -> &[SourceDocument] {
        &self.sources
    }

    pub fn source(&self, index: usize) -> Option<&SourceDocument> {
        self.sources.get(index)
    }

    // -- Pages ----------------------------------------------------------------

    /// Append one page per preview, in source page order.
    pub fn add_pages(&mut self, source_index: usize, previews: Vec<RasterImage>) -> Vec<PageId> {
        if source_index >= self.sources.len() {
            debug!(source_index, "add_pages for unknown source ignored");
            return Vec::new();
        }
        let ids: Vec<PageId> = previews
            .into_iter()
            .enumerate()
            .map(|(page_index, preview)| {
                let page = Page::new(source_index, page_index as u32, preview);
                let id = page.id;
                self.pages.push(page);
                id
            })
            .collect();
        info!(source_index, added = ids.len(), total = self.pages.len(), "Pages added");
        ids
    }

    /// Pages in document order, deleted ones included.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == id)
    }

    /// Add `delta` degrees (a multiple of 90) to the page rotation, wrapping.
    pub fn set_rotation(&mut self, page_id: PageId, delta: i32) {
        if let Some(page) = self.page_mut(page_id) {
            match page.rotation.rotated_by(delta) {
                Some(rotation) => page.rotation = rotation,
                None => debug!(delta, "rotation delta is not a quarter turn, ignored"),
            }
        }
    }

    /// Rotate a quarter turn clockwise.
    pub fn rotate_page(&mut self, page_id: PageId) {
        self.set_rotation(page_id, 90);
    }

    /// Flip the soft-delete flag. Annotations survive either way.
    pub fn toggle_deleted(&mut self, page_id: PageId) {
        if let Some(page) = self.page_mut(page_id) {
            page.deleted = !page.deleted;
        }
    }

    /// Remove a page and destroy its annotations.
    pub fn remove_page(&mut self, page_id: PageId) -> Option<Page> {
        let index = self.pages.iter().position(|p| p.id == page_id)?;
        if self.selection.is_some_and(|s| s.page == page_id) {
            self.selection = None;
        }
        Some(self.pages.remove(index))
    }

    /// Move a page to `new_index`, clamped to the end of the list.
    pub fn move_page(&mut self, page_id: PageId, new_index: usize) {
        if let Some(index) = self.pages.iter().position(|p| p.id == page_id) {
            let page = self.pages.remove(index);
            let target = new_index.min(self.pages.len());
            self.pages.insert(target, page);
        }
    }

    // -- Annotations ----------------------------------------------------------

    /// Append an annotation; a colliding id is replaced with a fresh one.
    pub fn add_annotation(&mut self, page_id: PageId, annotation: Annotation) -> Option<AnnotationId> {
        let page = self.page_mut(page_id)?;
        Some(page.push_annotation(annotation))
    }

    /// Append several annotations at once, keeping existing ones untouched.
    pub fn append_annotations(&mut self, page_id: PageId, annotations: Vec<Annotation>) -> Vec<AnnotationId> {
        match self.page_mut(page_id) {
            Some(page) => annotations
                .into_iter()
                .map(|annotation| page.push_annotation(annotation))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Merge `patch` into an annotation. Returns whether it was found.
    pub fn update_annotation(&mut self, page_id: PageId, id: AnnotationId, patch: &AnnotationPatch) -> bool {
        match self.page_mut(page_id).and_then(|page| page.annotation_mut(id)) {
            Some(annotation) => {
                annotation.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Remove an annotation, clearing the selection if it pointed at it.
    pub fn delete_annotation(&mut self, page_id: PageId, id: AnnotationId) -> Option<Annotation> {
        let removed = self.page_mut(page_id)?.remove_annotation(id)?;
        if self.selection
            == Some(Selection {
                page: page_id,
                annotation: id,
            })
        {
            self.selection = None;
        }
        Some(removed)
    }

    /// Topmost annotation under `point`. Lines are hit within `line_tolerance`
    /// percent of the segment; everything else by its box.
    pub fn hit_test(&self, page_id: PageId, point: PercentPoint, line_tolerance: f64) -> Option<AnnotationId> {
        self.page(page_id)?
            .annotations()
            .iter()
            .rev()
            .find(|annotation| {
                if annotation.is_line() {
                    distance_to_line(&annotation.bounds, point) <= line_tolerance
                } else {
                    annotation.bounds.contains(point)
                }
            })
            .map(|annotation| annotation.id)
    }

    // -- Selection ------------------------------------------------------------

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Select an annotation if it exists; otherwise leave the selection alone.
    pub fn select(&mut self, page_id: PageId, id: AnnotationId) {
        if self.page(page_id).and_then(|p| p.annotation(id)).is_some() {
            self.selection = Some(Selection {
                page: page_id,
                annotation: id,
            });
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    pub fn is_selected(&self, page_id: PageId, id: AnnotationId) -> bool {
        self.selection
            == Some(Selection {
                page: page_id,
                annotation: id,
            })
    }

    pub fn selected_annotation(&self) -> Option<&Annotation> {
        let selection = self.selection?;
        self.page(selection.page)?.annotation(selection.annotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemark_core::Bounds;
    use pagemark_core::annotation::TextAnnotation;
    use pagemark_core::types::{Color, Rotation};

    fn raster() -> RasterImage {
        RasterImage::new(2, 2, vec![255u8; 16]).unwrap()
    }

    fn store_with_pages(count: usize) -> (AnnotationStore, Vec<PageId>) {
        let mut store = AnnotationStore::new();
        let source = store.add_source(Some("a.pdf".into()), vec![1u8, 2, 3]);
        let ids = store.add_pages(source, (0..count).map(|_| raster()).collect());
        (store, ids)
    }

    #[test]
    fn pages_start_clean() {
        let (store, ids) = store_with_pages(3);
        assert_eq!(ids.len(), 3);
        for (i, page) in store.pages().iter().enumerate() {
            assert_eq!(page.source_page_index, i as u32);
            assert_eq!(page.rotation, Rotation::Deg0);
            assert!(!page.deleted);
            assert!(page.annotations().is_empty());
        }
    }

    #[test]
    fn unknown_source_adds_nothing() {
        let mut store = AnnotationStore::new();
        assert!(store.add_pages(4, vec![raster()]).is_empty());
        assert!(store.pages().is_empty());
    }

    #[test]
    fn rotating_four_times_is_identity() {
        let (mut store, ids) = store_with_pages(1);
        for _ in 0..4 {
            store.rotate_page(ids[0]);
        }
        assert_eq!(store.page(ids[0]).unwrap().rotation, Rotation::Deg0);
        store.set_rotation(ids[0], -90);
        assert_eq!(store.page(ids[0]).unwrap().rotation, Rotation::Deg270);
    }

    #[test]
    fn soft_delete_keeps_annotations() {
        let (mut store, ids) = store_with_pages(1);
        store.add_annotation(ids[0], Annotation::erase(Bounds::new(0.0, 0.0, 5.0, 5.0)));
        store.toggle_deleted(ids[0]);
        assert!(store.page(ids[0]).unwrap().deleted);
        store.toggle_deleted(ids[0]);
        let page = store.page(ids[0]).unwrap();
        assert!(!page.deleted);
        assert_eq!(page.annotations().len(), 1);
    }

    #[test]
    fn invalid_ids_are_no_ops() {
        let (mut store, ids) = store_with_pages(1);
        let ghost_page = PageId::new();
        let ghost_ann = AnnotationId::new();
        store.toggle_deleted(ghost_page);
        store.set_rotation(ghost_page, 90);
        assert!(store.add_annotation(ghost_page, Annotation::erase(Bounds::default())).is_none());
        assert!(!store.update_annotation(ids[0], ghost_ann, &AnnotationPatch::position(1.0, 1.0)));
        assert!(store.delete_annotation(ids[0], ghost_ann).is_none());
        assert!(store.remove_page(ghost_page).is_none());
    }

    #[test]
    fn deleting_selected_annotation_clears_selection() {
        let (mut store, ids) = store_with_pages(1);
        let a = store.add_annotation(ids[0], Annotation::erase(Bounds::new(0.0, 0.0, 5.0, 5.0))).unwrap();
        let b = store.add_annotation(ids[0], Annotation::erase(Bounds::new(9.0, 9.0, 5.0, 5.0))).unwrap();

        store.select(ids[0], a);
        store.delete_annotation(ids[0], b);
        assert_eq!(store.selection().map(|s| s.annotation), Some(a));

        store.delete_annotation(ids[0], a);
        assert!(store.selection().is_none());
    }

    #[test]
    fn removing_page_destroys_annotations_and_selection() {
        let (mut store, ids) = store_with_pages(2);
        let a = store.add_annotation(ids[1], Annotation::erase(Bounds::new(0.0, 0.0, 5.0, 5.0))).unwrap();
        store.select(ids[1], a);
        let removed = store.remove_page(ids[1]).unwrap();
        assert_eq!(removed.annotations().len(), 1);
        assert!(store.selection().is_none());
        assert_eq!(store.pages().len(), 1);
    }

    #[test]
    fn move_page_reorders() {
        let (mut store, ids) = store_with_pages(3);
        store.move_page(ids[2], 0);
        let order: Vec<_> = store.pages().iter().map(|p| p.id).collect();
        assert_eq!(order, vec![ids[2], ids[0], ids[1]]);
        store.move_page(ids[2], 99);
        assert_eq!(store.pages().last().unwrap().id, ids[2]);
    }

    #[test]
    fn update_cannot_change_id_or_variant() {
        let (mut store, ids) = store_with_pages(1);
        let id = store
            .add_annotation(ids[0], Annotation::text(Bounds::default(), TextAnnotation::authored("x", 24.0)))
            .unwrap();
        store.update_annotation(
            ids[0],
            id,
            &AnnotationPatch {
                line_width: Some(9.0),
                content: Some("y".into()),
                ..AnnotationPatch::default()
            },
        );
        let ann = store.page(ids[0]).unwrap().annotation(id).unwrap();
        assert_eq!(ann.id, id);
        assert_eq!(ann.as_text().unwrap().content, "y");
    }

    #[test]
    fn delete_then_re_add_restores_visible_state() {
        let (mut store, ids) = store_with_pages(1);
        let mut text = TextAnnotation::recognized("Total", 18.0);
        text.content = "Totals".into();
        text.background = Some(Color::WHITE);
        let original = Annotation::text(Bounds::new(10.0, 20.0, 30.0, 4.0), text).with_opacity(0.8);
        let id = store.add_annotation(ids[0], original.clone()).unwrap();

        let removed = store.delete_annotation(ids[0], id).unwrap();
        let readded = store
            .add_annotation(
                ids[0],
                Annotation {
                    id: AnnotationId::new(),
                    ..removed
                },
            )
            .unwrap();
        let back = store.page(ids[0]).unwrap().annotation(readded).unwrap();
        assert_eq!(back.bounds, original.bounds);
        assert_eq!(back.opacity, original.opacity);
        assert_eq!(back.kind, original.kind);
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let (mut store, ids) = store_with_pages(1);
        let below = store.add_annotation(ids[0], Annotation::erase(Bounds::new(0.0, 0.0, 50.0, 50.0))).unwrap();
        let above = store
            .add_annotation(ids[0], Annotation::highlight(Bounds::new(10.0, 10.0, 10.0, 10.0), Color::HIGHLIGHT))
            .unwrap();
        assert_eq!(store.hit_test(ids[0], PercentPoint::new(15.0, 15.0), 1.0), Some(above));
        assert_eq!(store.hit_test(ids[0], PercentPoint::new(40.0, 40.0), 1.0), Some(below));
        assert_eq!(store.hit_test(ids[0], PercentPoint::new(80.0, 80.0), 1.0), None);
    }

    #[test]
    fn hit_test_lines_by_distance() {
        let (mut store, ids) = store_with_pages(1);
        let line = store
            .add_annotation(ids[0], Annotation::line(Bounds::new(10.0, 10.0, 40.0, 40.0), Color::BLACK, 3.0))
            .unwrap();
        assert_eq!(store.hit_test(ids[0], PercentPoint::new(30.5, 30.0), 1.0), Some(line));
        assert_eq!(store.hit_test(ids[0], PercentPoint::new(10.0, 45.0), 1.0), None);
    }
}
