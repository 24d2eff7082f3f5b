// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagemark — Core types, coordinate transforms, and error definitions shared
// across all crates.

pub mod annotation;
pub mod config;
pub mod error;
pub mod geometry;
pub mod human_errors;
pub mod page;
pub mod traits;
pub mod types;
pub mod visibility;

pub use annotation::{Annotation, AnnotationKind, AnnotationPatch, TextAnnotation};
pub use config::EditorConfig;
pub use error::{PagemarkError, Result};
pub use geometry::Bounds;
pub use page::Page;
pub use types::*;
