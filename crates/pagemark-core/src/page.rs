// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// A page drawn from one source document, with its ordered annotations.

use std::sync::Arc;

use crate::annotation::Annotation;
use crate::types::{AnnotationId, PageId, RasterImage, Rotation};

/// One page of some source document.
///
/// Annotations are kept in creation order, which is also paint order: later
/// entries paint over earlier ones.
#[derive(Debug, Clone)]
pub struct Page {
    pub id: PageId,
    /// Index into the store's source document list.
    pub source_index: usize,
    /// Zero-based page number within that document.
    pub source_page_index: u32,
    /// Raster produced once at import.
    pub preview: Arc<RasterImage>,
    /// Applied at display and export time only; never rewrites `preview`.
    pub rotation: Rotation,
    /// Soft delete: excluded from export, annotations kept.
    pub deleted: bool,
    pub(crate) annotations: Vec<Annotation>,
}

impl Page {
    /// A fresh page: no rotation, not deleted, no annotations.
    pub fn new(source_index: usize, source_page_index: u32, preview: RasterImage) -> Self {
        Self {
            id: PageId::new(),
            source_index,
            source_page_index,
            preview: Arc::new(preview),
            rotation: Rotation::Deg0,
            deleted: false,
            annotations: Vec::new(),
        }
    }

    /// Annotations in paint order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn annotation_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id == id)
    }

    /// Append, replacing the id if it collides with one already on the page.
    pub fn push_annotation(&mut self, mut annotation: Annotation) -> AnnotationId {
        while self.annotation(annotation.id).is_some() {
            annotation.id = AnnotationId::new();
        }
        let id = annotation.id;
        self.annotations.push(annotation);
        id
    }

    pub fn remove_annotation(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.id == id)?;
        Some(self.annotations.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;

    fn blank_page() -> Page {
        Page::new(0, 0, RasterImage::new(1, 1, vec![255u8; 4]).unwrap())
    }

    #[test]
    fn colliding_ids_are_replaced() {
        let mut page = blank_page();
        let first = Annotation::erase(Bounds::new(0.0, 0.0, 1.0, 1.0));
        let mut second = Annotation::erase(Bounds::new(5.0, 5.0, 1.0, 1.0));
        second.id = first.id;

        let a = page.push_annotation(first);
        let b = page.push_annotation(second);
        assert_ne!(a, b);
        assert_eq!(page.annotations().len(), 2);
    }

    #[test]
    fn remove_keeps_order_of_the_rest() {
        let mut page = blank_page();
        let ids: Vec<_> = (0..3)
            .map(|i| page.push_annotation(Annotation::erase(Bounds::new(i as f64, 0.0, 1.0, 1.0))))
            .collect();
        assert!(page.remove_annotation(ids[1]).is_some());
        assert!(page.remove_annotation(ids[1]).is_none());
        let left: Vec<_> = page.annotations().iter().map(|a| a.id).collect();
        assert_eq!(left, vec![ids[0], ids[2]]);
    }
}
