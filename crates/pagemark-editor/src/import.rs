// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document import — rasterizes every page of an uploaded document, then adds
// them to the store in one step.
//
// Rendering happens without touching the store. Only a fully rendered
// document is committed, so a failure on any page leaves the store exactly
// as it was.

use std::sync::Arc;

use pagemark_core::error::{PagemarkError, Result};
use pagemark_core::traits::Rasterizer;
use pagemark_core::types::{PageId, RasterImage};
use tracing::{info, instrument};

use crate::busy::BusyFlag;
use crate::store::AnnotationStore;

/// A document whose pages have all been rendered, ready to commit.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub name: Option<String>,
    pub bytes: Arc<[u8]>,
    pub previews: Vec<RasterImage>,
}

impl RenderedDocument {
    /// Register the source and append its pages. Returns the new page ids.
    pub fn commit(self, store: &mut AnnotationStore) -> Vec<PageId> {
        let source = store.add_source(self.name, self.bytes);
        store.add_pages(source, self.previews)
    }
}

/// Turns uploaded documents into pages through a [`Rasterizer`].
pub struct DocumentImporter<R> {
    rasterizer: R,
    scale: f32,
    busy: BusyFlag,
}

impl<R: Rasterizer> DocumentImporter<R> {
    pub fn new(rasterizer: R, scale: f32) -> Self {
        Self {
            rasterizer,
            scale,
            busy: BusyFlag::new("import"),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Render every page. Any failure is an `Import` error.
    #[instrument(skip_all, fields(name = ?name, size = bytes.len()))]
    pub async fn render(&self, name: Option<String>, bytes: Vec<u8>) -> Result<RenderedDocument> {
        let _guard = self.busy.try_acquire()?;

        let page_count = self
            .rasterizer
            .page_count(&bytes)
            .await
            .map_err(|e| PagemarkError::Import(format!("cannot read document: {e}")))?;
        if page_count == 0 {
            return Err(PagemarkError::Import("document has no pages".into()));
        }

        let mut previews = Vec::with_capacity(page_count as usize);
        for page_index in 0..page_count {
            let preview = self
                .rasterizer
                .render(&bytes, page_index, self.scale)
                .await
                .map_err(|e| PagemarkError::Import(format!("page {}: {e}", page_index + 1)))?;
            previews.push(preview);
        }

        info!(pages = page_count, "Document rendered");
        Ok(RenderedDocument {
            name,
            bytes: bytes.into(),
            previews,
        })
    }

    /// Render and commit in one call.
    pub async fn import(&self, store: &mut AnnotationStore, name: Option<String>, bytes: Vec<u8>) -> Result<Vec<PageId>> {
        let rendered = self.render(name, bytes).await?;
        Ok(rendered.commit(store))
    }
}
