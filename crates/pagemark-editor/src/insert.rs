// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Programmatic image placement: QR codes, stamps and watermarks.

use pagemark_core::annotation::Annotation;
use pagemark_core::geometry::Bounds;
use pagemark_core::types::{AnnotationId, ImageData, PageId};
use tracing::info;

use crate::store::AnnotationStore;

/// QR codes land in a fixed square near the page centre.
pub const QR_BOUNDS: Bounds = Bounds {
    x: 40.0,
    y: 40.0,
    width: 15.0,
    height: 15.0,
};

/// Watermarks cover the middle quarter of every page.
pub const WATERMARK_BOUNDS: Bounds = Bounds {
    x: 25.0,
    y: 25.0,
    width: 50.0,
    height: 50.0,
};

pub const WATERMARK_OPACITY: f64 = 0.5;

/// Place a QR code image on a page and select it.
pub fn insert_qr_code(store: &mut AnnotationStore, page: PageId, image: ImageData) -> Option<AnnotationId> {
    insert_stamp(store, page, image, QR_BOUNDS)
}

/// Place an image at `bounds` and select it.
pub fn insert_stamp(store: &mut AnnotationStore, page: PageId, image: ImageData, bounds: Bounds) -> Option<AnnotationId> {
    let id = store.add_annotation(page, Annotation::image(bounds, image))?;
    store.select(page, id);
    Some(id)
}

/// Add a half-transparent image to every page, deleted ones included.
/// Returns how many pages received it.
pub fn apply_watermark(store: &mut AnnotationStore, image: ImageData) -> usize {
    let pages: Vec<PageId> = store.pages().iter().map(|p| p.id).collect();
    let applied = pages
        .into_iter()
        .filter_map(|page| {
            let watermark = Annotation::image(WATERMARK_BOUNDS, image.clone()).with_opacity(WATERMARK_OPACITY);
            store.add_annotation(page, watermark)
        })
        .count();
    info!(pages = applied, "Watermark applied");
    applied
}
