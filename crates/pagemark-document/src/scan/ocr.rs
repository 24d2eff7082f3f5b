// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Line-level text recognition for page previews, backed by `ocrs`.
//
// # Feature Gate
//
// Only available with the `ocr` feature:
//
// ```toml
// pagemark-document = { path = "crates/pagemark-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine needs two `.rten` model files, `text-detection.rten` and
// `text-recognition.rten`. Running `ocrs-cli` once downloads them to
// `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`), which is where
// [`OcrConfig::default`] looks.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{DynamicImage, RgbaImage};
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, TextItem};
use pagemark_core::error::{PagemarkError, Result};
use pagemark_core::traits::{OcrEngine, OcrLine, PixelBox};
use pagemark_core::types::RasterImage;
use rten::Model;
use tracing::{debug, info, instrument, warn};

/// The only language the bundled models recognise.
pub const SUPPORTED_LANGUAGE: &str = "eng";

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Where to find the model files.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub detection_model_path: PathBuf,
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Both models inside `dir`, under their well-known names.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (what, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(PagemarkError::Recognition(format!(
                    "{what} model unavailable at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// [`OcrEngine`] running the `ocrs` neural pipeline on the CPU.
///
/// Model loading is the expensive step; build one engine and reuse it for
/// every page. `ocrs` and `rten` are very slow in debug builds.
pub struct OcrsRecognizer {
    engine: OcrsEngine,
}

impl OcrsRecognizer {
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: &OcrConfig) -> Result<Self> {
        config.validate()?;

        info!("Loading OCR models");
        let detection_model = Model::load_file(&config.detection_model_path).map_err(|err| {
            PagemarkError::Recognition(format!("failed to load detection model: {err}"))
        })?;
        let recognition_model = Model::load_file(&config.recognition_model_path).map_err(|err| {
            PagemarkError::Recognition(format!("failed to load recognition model: {err}"))
        })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| PagemarkError::Recognition(format!("failed to initialise OCR engine: {err}")))?;

        info!("OCR engine ready");
        Ok(Self { engine })
    }

    /// Engine using models from the default cache directory.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&OcrConfig::default())
    }

    fn recognize_lines(&self, image: &RasterImage) -> Result<Vec<OcrLine>> {
        let rgba = RgbaImage::from_raw(image.width(), image.height(), image.rgba().to_vec())
            .ok_or_else(|| PagemarkError::Recognition("preview buffer does not match its size".into()))?;
        let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height))
            .map_err(|err| PagemarkError::Recognition(format!("bad image source ({width}x{height}): {err}")))?;
        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| PagemarkError::Recognition(format!("preprocessing failed: {err}")))?;

        let words = self
            .engine
            .detect_words(&input)
            .map_err(|err| PagemarkError::Recognition(format!("word detection failed: {err}")))?;
        let line_rects = self.engine.find_text_lines(&input, &words);
        debug!(words = words.len(), lines = line_rects.len(), "Text lines found");

        let recognized = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| PagemarkError::Recognition(format!("line recognition failed: {err}")))?;

        let lines = recognized
            .iter()
            .flatten()
            .map(|line| {
                let rect = line.bounding_rect();
                OcrLine {
                    bbox: PixelBox {
                        x0: f64::from(rect.left()),
                        y0: f64::from(rect.top()),
                        x1: f64::from(rect.right()),
                        y1: f64::from(rect.bottom()),
                    },
                    text: line.to_string(),
                }
            })
            .filter(|line| !line.text.trim().is_empty())
            .collect();
        Ok(lines)
    }
}

#[async_trait]
impl OcrEngine for OcrsRecognizer {
    #[instrument(skip_all, fields(width = image.width(), height = image.height(), language))]
    async fn recognize(&self, image: &RasterImage, language: &str) -> Result<Vec<OcrLine>> {
        if language != SUPPORTED_LANGUAGE {
            warn!(language, "Only English models are available, recognising as English");
        }
        let lines = self.recognize_lines(image)?;
        info!(lines = lines.len(), "Recognition complete");
        Ok(lines)
    }
}

/// Whether both model files exist in the default cache location.
pub fn models_available() -> bool {
    OcrConfig::default().validate().is_ok()
}
