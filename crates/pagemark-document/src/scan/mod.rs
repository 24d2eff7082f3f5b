// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Optical character recognition for page previews.

pub mod ocr;

pub use ocr::{OcrConfig, OcrsRecognizer};
