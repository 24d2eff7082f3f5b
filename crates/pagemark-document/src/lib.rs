// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagemark-document — Export of annotated pages to PDF.
//
// Provides the export compositor that replays the annotation store onto
// copies of the source pages, its `lopdf` backend, standard-font metrics and
// text transliteration, and (behind the `ocr` feature) an `ocrs`-based
// recognition engine.

pub mod export;
pub mod fonts;
pub mod pdf;
pub mod text;

#[cfg(feature = "ocr")]
pub mod scan;

pub use export::{ExportReport, Exporter, SkippedItem};
pub use pdf::compositor::LopdfCompositor;
pub use pdf::reader::PdfReader;

#[cfg(feature = "ocr")]
pub use scan::ocr::OcrsRecognizer;
