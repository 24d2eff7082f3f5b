// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading source documents and composing the exported file.

pub mod compositor;
pub mod reader;
mod truetype;

pub use compositor::LopdfCompositor;
pub use reader::PdfReader;
