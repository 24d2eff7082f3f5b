// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Narrow interfaces for the external collaborators: the page rasterizer, the
// OCR engine, and the document compositor.
//
// The import and export adapters receive these as explicit dependencies so
// tests can substitute deterministic fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::geometry::{DocPoint, DocRect, PageSize};
use crate::types::{Color, RasterImage, SourceDocument, StandardFont};

/// Renders pages of an uploaded document to pixels.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Number of pages in the document.
    async fn page_count(&self, document: &[u8]) -> Result<u32>;

    /// Render one zero-based page at `scale` (1.0 = 72 dpi). Deterministic
    /// for fixed inputs.
    async fn render(&self, document: &[u8], page_index: u32, scale: f32) -> Result<RasterImage>;
}

/// Pixel-space bounding box reported by the OCR engine. Assumes `x1 >= x0`
/// and `y1 >= y0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

/// One recognised line of text.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrLine {
    pub bbox: PixelBox,
    pub text: String,
}

/// Line-level text recognition.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &RasterImage, language: &str) -> Result<Vec<OcrLine>>;
}

/// Page copied into the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageHandle(pub usize);

/// Image embedded in the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub usize);

/// Font embedded in the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontHandle(pub usize);

/// What to embed as a font.
#[derive(Debug, Clone, Copy)]
pub enum FontSource<'a> {
    /// One of the built-in fonts; narrow glyph coverage.
    Standard(StandardFont),
    /// TrueType/OpenType program bytes with full coverage.
    Embedded(&'a [u8]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineParams {
    pub start: DocPoint,
    pub end: DocPoint,
    pub thickness: f64,
    pub color: Color,
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectParams {
    pub rect: DocRect,
    pub color: Color,
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageParams {
    pub image: ImageHandle,
    pub rect: DocRect,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextParams {
    pub text: String,
    /// Baseline start.
    pub origin: DocPoint,
    /// Points.
    pub size: f64,
    pub font: FontHandle,
    pub color: Color,
}

/// Builds the output document: copies source pages and draws primitives.
///
/// Coordinates are document space of the unrotated page.
pub trait DocumentCompositor {
    /// Parse a source document so its pages can be copied.
    fn load_source(&mut self, source: &SourceDocument) -> Result<()>;

    /// Copy a zero-based page of a source document into the output.
    fn copy_page(&mut self, source_index: usize, page_index: u32) -> Result<PageHandle>;

    /// Rotation already stored on the copied page, in degrees.
    fn rotation(&self, page: PageHandle) -> Result<i32>;

    fn set_rotation(&mut self, page: PageHandle, degrees: i32) -> Result<()>;

    /// Unrotated page size in points.
    fn page_size(&self, page: PageHandle) -> Result<PageSize>;

    fn embed_image(&mut self, encoded: &[u8]) -> Result<ImageHandle>;

    fn embed_font(&mut self, source: FontSource<'_>) -> Result<FontHandle>;

    /// Advance width of `text` at `size` points.
    fn text_width(&self, font: FontHandle, text: &str, size: f64) -> Result<f64>;

    fn draw_line(&mut self, page: PageHandle, params: &LineParams) -> Result<()>;

    fn draw_rectangle(&mut self, page: PageHandle, params: &RectParams) -> Result<()>;

    fn draw_image(&mut self, page: PageHandle, params: &ImageParams) -> Result<()>;

    fn draw_text(&mut self, page: PageHandle, params: &TextParams) -> Result<()>;

    /// Append the finished page to the output, in call order.
    fn add_page(&mut self, page: PageHandle) -> Result<()>;

    /// Serialise the output document.
    fn save(&mut self) -> Result<Vec<u8>>;
}
