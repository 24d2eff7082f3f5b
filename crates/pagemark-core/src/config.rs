// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editor configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Color;

/// Persistent editor settings and the tuning constants the tools rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Placeholder content of a freshly placed text box.
    pub text_placeholder: String,
    /// Default font size of new text boxes, in display pixels.
    pub text_font_size: f64,
    /// Width of a new text box, percent of the page.
    pub text_box_width: f64,
    /// Height of a new text box, percent of the page.
    pub text_box_height: f64,
    /// Fill of the highlight tool.
    pub highlight_color: Color,
    /// Starting opacity of highlights.
    pub highlight_opacity: f64,
    /// Stroke colour of the line tool.
    pub stroke_color: Color,
    /// Stroke thickness of the line tool, display pixels.
    pub line_width: f64,
    /// Drawn shapes at or below this size (percent) are discarded on release.
    pub min_draw_extent: f64,
    /// How close (percent) a pointer must be to a line to grab it.
    pub line_hit_tolerance: f64,
    /// Language passed to the OCR engine.
    pub ocr_language: String,
    /// Recognised lines shorter than this (after trimming) are noise.
    pub ocr_min_line_chars: usize,
    /// Font size as a fraction of recognised line height.
    pub ocr_font_ratio: f64,
    /// Display pixels per exported point for text sizes.
    pub px_per_pt: f64,
    /// Rasterizer scale used at import (1.0 = 72 dpi).
    pub raster_scale: f32,
    /// TrueType font with full glyph coverage used for exported text.
    pub custom_font_path: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            text_placeholder: "Text".into(),
            text_font_size: 24.0,
            text_box_width: 20.0,
            text_box_height: 5.0,
            highlight_color: Color::HIGHLIGHT,
            highlight_opacity: 0.4,
            stroke_color: Color::BLACK,
            line_width: 3.0,
            min_draw_extent: 0.1,
            line_hit_tolerance: 1.0,
            ocr_language: "eng".into(),
            ocr_min_line_chars: 2,
            ocr_font_ratio: 0.85,
            px_per_pt: 3.0,
            raster_scale: 2.0,
            custom_font_path: None,
        }
    }
}

impl EditorConfig {
    /// Load settings from a JSON file. A missing file yields the defaults;
    /// missing keys take their default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(data) => Ok(serde_json::from_str(&data)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// Write settings as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        let config = EditorConfig {
            ocr_language: "tur".into(),
            highlight_color: Color::rgb(0x22, 0xc5, 0x5e),
            ..EditorConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{ "px_per_pt": 2.5 }"#).unwrap();
        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.px_per_pt, 2.5);
        assert_eq!(config.ocr_min_line_chars, 2);
    }
}
