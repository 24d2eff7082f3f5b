// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagemark.

use thiserror::Error;

use crate::types::AnnotationId;

/// Top-level error type for all Pagemark operations.
#[derive(Debug, Error)]
pub enum PagemarkError {
    // -- Operation-level failures (one per user-visible action) --
    #[error("document import failed: {0}")]
    Import(String),

    #[error("text recognition failed: {0}")]
    Recognition(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("annotation {annotation} could not be converted: {reason}")]
    AnnotationConversion {
        annotation: AnnotationId,
        reason: String,
    },

    #[error("{0} is already running")]
    Busy(&'static str),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("font embedding failed: {0}")]
    FontError(String),

    #[error("no source document with index {0}")]
    UnknownSource(usize),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PagemarkError>;
