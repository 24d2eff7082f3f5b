// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: identifiers, colours, fonts, rotation, and the raster and
// document payloads owned by the annotation store.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PagemarkError, Result};

/// Unique identifier for a page, stable for the page's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageId(pub Uuid);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an annotation, unique within its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationId(pub Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An sRGB colour, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    /// Default highlighter yellow.
    pub const HIGHLIGHT: Color = Color::rgb(0xfd, 0xe0, 0x47);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` string. Anything else (including `transparent`)
    /// yields `None`.
    pub fn parse_hex(input: &str) -> Option<Self> {
        let hex = input.trim().strip_prefix('#')?;
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Parse a colour where unparseable input falls back to black.
    pub fn parse_or_black(input: &str) -> Self {
        Self::parse_hex(input).unwrap_or(Self::BLACK)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Channels scaled to 0.0–1.0 for PDF colour operators.
    pub fn to_unit_rgb(self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    pub fn is_white(self) -> bool {
        self == Self::WHITE
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse_hex(&value).ok_or_else(|| format!("invalid colour {value:?}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Font families offered by the text tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Helvetica,
    #[serde(rename = "Times New Roman")]
    TimesNewRoman,
    Courier,
}

/// The fourteen-font subset the export fallback can rely on without embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    TimesRoman,
    TimesBold,
    Courier,
    CourierBold,
}

impl StandardFont {
    /// Standard font matching a family and weight.
    pub fn for_family(family: FontFamily, bold: bool) -> Self {
        match (family, bold) {
            (FontFamily::Helvetica, false) => Self::Helvetica,
            (FontFamily::Helvetica, true) => Self::HelveticaBold,
            (FontFamily::TimesNewRoman, false) => Self::TimesRoman,
            (FontFamily::TimesNewRoman, true) => Self::TimesBold,
            (FontFamily::Courier, false) => Self::Courier,
            (FontFamily::Courier, true) => Self::CourierBold,
        }
    }

    /// PostScript `/BaseFont` name.
    pub fn base_name(self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }
}

/// Clockwise page rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> i32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Rotation for an arbitrary multiple of 90 degrees, wrapping negatives.
    pub fn from_degrees(degrees: i32) -> Option<Self> {
        if degrees % 90 != 0 {
            return None;
        }
        match degrees.rem_euclid(360) {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            _ => Some(Self::Deg270),
        }
    }

    /// Add `delta` degrees. Deltas that are not quarter turns are rejected.
    pub fn rotated_by(self, delta: i32) -> Option<Self> {
        Self::from_degrees(delta).and_then(|d| Self::from_degrees(self.degrees() + d.degrees()))
    }

    /// Whether the displayed width and height are swapped.
    pub fn is_sideways(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

impl TryFrom<i32> for Rotation {
    type Error = String;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        Self::from_degrees(value).ok_or_else(|| format!("rotation {value} is not a multiple of 90"))
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

/// A rasterized page: RGBA8 pixels plus their dimensions.
///
/// Pixel data is shared, never copied, once produced by the rasterizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    rgba: Arc<[u8]>,
}

impl RasterImage {
    pub fn new(width: u32, height: u32, rgba: impl Into<Arc<[u8]>>) -> Result<Self> {
        let rgba = rgba.into();
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(PagemarkError::ImageError(format!(
                "raster of {width}x{height} needs {expected} bytes, got {}",
                rgba.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Natural width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Natural height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// Encoded raster bytes (PNG or JPEG) carried by an Image annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageData(Arc<[u8]>);

impl ImageData {
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    /// Decode a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let payload = url
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(_, payload)| payload)
            .ok_or_else(|| PagemarkError::ImageError("not a base64 data URL".into()))?;
        let bytes = B64
            .decode(payload.trim())
            .map_err(|err| PagemarkError::ImageError(format!("invalid base64 image: {err}")))?;
        Ok(Self::from_bytes(bytes))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), B64.encode(&self.0))
    }

    /// MIME type sniffed from the magic bytes; unknown data is reported as PNG.
    pub fn mime_type(&self) -> &'static str {
        if self.0.starts_with(&[0xff, 0xd8, 0xff]) {
            "image/jpeg"
        } else {
            "image/png"
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<String> for ImageData {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::from_data_url(&value).map_err(|err| err.to_string())
    }
}

impl From<ImageData> for String {
    fn from(data: ImageData) -> Self {
        data.to_data_url()
    }
}

/// One uploaded document, immutable once added.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Zero-based index assigned at upload time.
    pub index: usize,
    /// Display name, if the upload carried one.
    pub name: Option<String>,
    bytes: Arc<[u8]>,
}

impl SourceDocument {
    pub fn new(index: usize, name: Option<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            index,
            name,
            bytes: bytes.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_parses_hex_and_rejects_transparent() {
        assert_eq!(Color::parse_hex("#fde047"), Some(Color::HIGHLIGHT));
        assert_eq!(Color::parse_hex("#FFFFFF"), Some(Color::WHITE));
        assert_eq!(Color::parse_hex("transparent"), None);
        assert_eq!(Color::parse_hex("#fff"), None);
        assert_eq!(Color::parse_or_black("red"), Color::BLACK);
    }

    #[test]
    fn rotation_wraps_both_directions() {
        assert_eq!(Rotation::Deg270.rotated_by(90), Some(Rotation::Deg0));
        assert_eq!(Rotation::Deg0.rotated_by(-90), Some(Rotation::Deg270));
        assert_eq!(Rotation::Deg90.rotated_by(450), Some(Rotation::Deg180));
        assert_eq!(Rotation::Deg90.rotated_by(45), None);
    }

    #[test]
    fn four_quarter_turns_return_to_start() {
        let mut rotation = Rotation::Deg180;
        for _ in 0..4 {
            rotation = rotation.rotated_by(90).unwrap();
        }
        assert_eq!(rotation, Rotation::Deg180);
    }

    #[test]
    fn raster_rejects_short_buffers() {
        assert!(RasterImage::new(2, 2, vec![0u8; 16]).is_ok());
        assert!(RasterImage::new(2, 2, vec![0u8; 15]).is_err());
    }

    #[test]
    fn data_url_round_trip_keeps_bytes() {
        let png_magic = [0x89u8, b'P', b'N', b'G', 1, 2, 3];
        let data = ImageData::from_bytes(png_magic.to_vec());
        let url = data.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(ImageData::from_data_url(&url).unwrap(), data);
        assert!(ImageData::from_data_url("https://example.com/a.png").is_err());
    }

    #[test]
    fn standard_font_resolution() {
        assert_eq!(
            StandardFont::for_family(FontFamily::TimesNewRoman, true).base_name(),
            "Times-Bold"
        );
        assert_eq!(
            StandardFont::for_family(FontFamily::Courier, false).base_name(),
            "Courier"
        );
    }
}
