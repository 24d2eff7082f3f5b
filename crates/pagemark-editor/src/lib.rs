// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagemark editor — annotation store, tool state machine, and the import
// adapters that feed them.

pub mod busy;
pub mod import;
pub mod insert;
pub mod ocr_import;
pub mod store;
pub mod tools;

pub use busy::{BusyFlag, BusyGuard};
pub use import::{DocumentImporter, RenderedDocument};
pub use ocr_import::{OcrImporter, RecognizedPage};
pub use store::{AnnotationStore, Selection};
pub use tools::{Focus, Gesture, Key, PointerEvent, PointerOutcome, Tool, ToolController, Viewport};
