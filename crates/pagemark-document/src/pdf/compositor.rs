// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document compositor backed by `lopdf`.
//
// Source pages are deep-cloned into a fresh output document. Drawing calls
// are collected per page as content-stream operations and appended when the
// page is added: the original content is wrapped in `q`/`Q` so our overlay
// always starts from the default graphics state. Opacity goes through
// ExtGState `/ca` and `/CA`; images carry their alpha as an `/SMask`.
//
// Standard 14 fonts are referenced by name with WinAnsi encoding. TrueType
// programs are embedded as Type0 fonts (see `truetype`) so text reaches the
// page without transliteration.

use std::collections::{BTreeMap, HashMap};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use pagemark_core::error::{PagemarkError, Result};
use pagemark_core::geometry::PageSize;
use pagemark_core::traits::{
    DocumentCompositor, FontHandle, FontSource, ImageHandle, ImageParams, LineParams, PageHandle, RectParams,
    TextParams,
};
use pagemark_core::types::{Color, SourceDocument, StandardFont};
use tracing::{debug, info, instrument};

use crate::fonts;
use crate::pdf::reader::{FALLBACK_PAGE_SIZE, PdfReader, clone_page_into, media_box};
use crate::pdf::truetype::TrueTypeFont;
use crate::text::encode_win_ansi;

struct LoadedSource {
    reader: PdfReader,
    /// Source object id -> output object id, shared by all pages of the source.
    memo: HashMap<ObjectId, ObjectId>,
}

struct PageState {
    id: ObjectId,
    /// Lower-left corner of the MediaBox.
    origin: (f64, f64),
    size: PageSize,
    operations: Vec<Operation>,
    fonts: BTreeMap<String, ObjectId>,
    xobjects: BTreeMap<String, ObjectId>,
    graphics_states: BTreeMap<String, ObjectId>,
    added: bool,
}

enum EmbeddedFont {
    Standard { font: StandardFont, id: ObjectId },
    TrueType(Box<TrueTypeFont>),
}

impl EmbeddedFont {
    fn id(&self) -> ObjectId {
        match self {
            Self::Standard { id, .. } => *id,
            Self::TrueType(font) => font.id,
        }
    }
}

/// [`DocumentCompositor`] writing a PDF with `lopdf`.
pub struct LopdfCompositor {
    output: Document,
    pages_id: ObjectId,
    catalog_id: Option<ObjectId>,
    sources: HashMap<usize, LoadedSource>,
    pages: Vec<PageState>,
    kids: Vec<ObjectId>,
    images: Vec<ObjectId>,
    fonts: Vec<EmbeddedFont>,
    /// Opacity in thousandths -> ExtGState object.
    alpha_states: HashMap<u16, ObjectId>,
}

impl Default for LopdfCompositor {
    fn default() -> Self {
        Self::new()
    }
}

impl LopdfCompositor {
    pub fn new() -> Self {
        let mut output = Document::with_version("1.7");
        let pages_id = output.new_object_id();
        Self {
            output,
            pages_id,
            catalog_id: None,
            sources: HashMap::new(),
            pages: Vec::new(),
            kids: Vec::new(),
            images: Vec::new(),
            fonts: Vec::new(),
            alpha_states: HashMap::new(),
        }
    }

    fn page(&self, handle: PageHandle) -> Result<&PageState> {
        self.pages
            .get(handle.0)
            .ok_or_else(|| PagemarkError::PdfError(format!("unknown page handle {}", handle.0)))
    }

    fn page_mut(&mut self, handle: PageHandle) -> Result<&mut PageState> {
        let page = self
            .pages
            .get_mut(handle.0)
            .ok_or_else(|| PagemarkError::PdfError(format!("unknown page handle {}", handle.0)))?;
        if page.added {
            return Err(PagemarkError::PdfError(format!("page {} already added", handle.0)));
        }
        Ok(page)
    }

    /// ExtGState for `opacity`, or `None` when fully opaque.
    fn alpha_state(&mut self, opacity: f64) -> Option<(String, ObjectId)> {
        let key = (opacity.clamp(0.0, 1.0) * 1000.0).round() as u16;
        if key >= 1000 {
            return None;
        }
        let output = &mut self.output;
        let id = *self.alpha_states.entry(key).or_insert_with(|| {
            let alpha = Object::Real(f32::from(key) / 1000.0);
            output.add_object(dictionary! {
                "Type" => "ExtGState",
                "ca" => alpha.clone(),
                "CA" => alpha,
            })
        });
        Some((format!("PmGs{key}"), id))
    }

    /// Push `operations` wrapped in their own graphics state, with the given
    /// opacity applied.
    fn push_isolated(&mut self, handle: PageHandle, opacity: f64, operations: Vec<Operation>) -> Result<()> {
        // Fail on a bad handle before allocating an ExtGState.
        self.page_mut(handle)?;
        let state = self.alpha_state(opacity);
        let page = self.page_mut(handle)?;
        page.operations.push(Operation::new("q", vec![]));
        if let Some((name, id)) = state {
            page.operations.push(Operation::new("gs", vec![Object::Name(name.clone().into_bytes())]));
            page.graphics_states.insert(name, id);
        }
        page.operations.extend(operations);
        page.operations.push(Operation::new("Q", vec![]));
        Ok(())
    }

    /// Resources dictionary of a page with our fonts, images and graphics
    /// states merged in.
    fn merged_resources(&self, page: &PageState) -> Result<Dictionary> {
        let page_dict = self
            .output
            .get_object(page.id)
            .and_then(Object::as_dict)
            .map_err(|err| PagemarkError::PdfError(format!("page object missing: {err}")))?;
        let mut resources = match page_dict.get(b"Resources") {
            Ok(object) => self.owned_dict(object),
            Err(_) => Dictionary::new(),
        };
        for (category, entries) in [
            (&b"Font"[..], &page.fonts),
            (&b"XObject"[..], &page.xobjects),
            (&b"ExtGState"[..], &page.graphics_states),
        ] {
            if entries.is_empty() {
                continue;
            }
            let mut dict = match resources.get(category) {
                Ok(object) => self.owned_dict(object),
                Err(_) => Dictionary::new(),
            };
            for (name, id) in entries {
                dict.set(name.as_bytes().to_vec(), *id);
            }
            resources.set(category.to_vec(), dict);
        }
        Ok(resources)
    }

    /// Copy of a dictionary object, following one level of reference.
    fn owned_dict(&self, object: &Object) -> Dictionary {
        let resolved = match object {
            Object::Reference(id) => self.output.get_object(*id).ok(),
            other => Some(other),
        };
        resolved
            .and_then(|o| o.as_dict().ok())
            .cloned()
            .unwrap_or_default()
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn rgb_operands(color: Color) -> Vec<Object> {
    color.to_unit_rgb().into_iter().map(Object::Real).collect()
}

fn ensure_finite(values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(PagemarkError::PdfError("non-finite drawing coordinate".into()))
    }
}

impl DocumentCompositor for LopdfCompositor {
    #[instrument(skip_all, fields(source = source.index))]
    fn load_source(&mut self, source: &SourceDocument) -> Result<()> {
        if self.sources.contains_key(&source.index) {
            return Ok(());
        }
        let reader = PdfReader::from_bytes(source.bytes())?;
        self.sources.insert(
            source.index,
            LoadedSource {
                reader,
                memo: HashMap::new(),
            },
        );
        Ok(())
    }

    fn copy_page(&mut self, source_index: usize, page_index: u32) -> Result<PageHandle> {
        let source = self
            .sources
            .get_mut(&source_index)
            .ok_or(PagemarkError::UnknownSource(source_index))?;
        let page_id = source.reader.page_id(page_index)?;
        let (origin, size) = media_box(source.reader.document(), page_id).unwrap_or(((0.0, 0.0), FALLBACK_PAGE_SIZE));
        let id = clone_page_into(source.reader.document(), &mut self.output, page_id, &mut source.memo)?;

        self.pages.push(PageState {
            id,
            origin,
            size,
            operations: Vec::new(),
            fonts: BTreeMap::new(),
            xobjects: BTreeMap::new(),
            graphics_states: BTreeMap::new(),
            added: false,
        });
        debug!(source_index, page_index, "Page copied");
        Ok(PageHandle(self.pages.len() - 1))
    }

    fn rotation(&self, handle: PageHandle) -> Result<i32> {
        let page = self.page(handle)?;
        Ok(self
            .output
            .get_object(page.id)
            .and_then(Object::as_dict)
            .and_then(|dict| dict.get(b"Rotate"))
            .and_then(Object::as_i64)
            .map(|v| (v as i32).rem_euclid(360))
            .unwrap_or(0))
    }

    fn set_rotation(&mut self, handle: PageHandle, degrees: i32) -> Result<()> {
        if degrees % 90 != 0 {
            return Err(PagemarkError::PdfError(format!(
                "rotation must be a multiple of 90, got {degrees}"
            )));
        }
        let id = self.page_mut(handle)?.id;
        let dict = self
            .output
            .get_object_mut(id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| PagemarkError::PdfError(format!("page object missing: {err}")))?;
        dict.set("Rotate", Object::Integer(i64::from(degrees.rem_euclid(360))));
        Ok(())
    }

    fn page_size(&self, handle: PageHandle) -> Result<PageSize> {
        Ok(self.page(handle)?.size)
    }

    fn embed_image(&mut self, encoded: &[u8]) -> Result<ImageHandle> {
        let rgba = image::load_from_memory(encoded)
            .map_err(|err| PagemarkError::ImageError(format!("cannot decode image: {err}")))?
            .to_rgba8();
        let (width, height) = rgba.dimensions();
        let pixels = width as usize * height as usize;
        let mut rgb = Vec::with_capacity(pixels * 3);
        let mut alpha = Vec::with_capacity(pixels);
        for pixel in rgba.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }

        let mut image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };
        if alpha.iter().any(|&a| a < u8::MAX) {
            let smask_id = self.output.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(width),
                    "Height" => i64::from(height),
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                },
                alpha,
            ));
            image_dict.set("SMask", smask_id);
        }
        let image_id = self.output.add_object(Stream::new(image_dict, rgb));
        self.images.push(image_id);
        debug!(width, height, "Image embedded");
        Ok(ImageHandle(self.images.len() - 1))
    }

    fn embed_font(&mut self, source: FontSource<'_>) -> Result<FontHandle> {
        let embedded = match source {
            FontSource::Standard(font) => {
                let existing = self
                    .fonts
                    .iter()
                    .position(|f| matches!(f, EmbeddedFont::Standard { font: known, .. } if *known == font));
                if let Some(index) = existing {
                    return Ok(FontHandle(index));
                }
                let id = self.output.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => font.base_name(),
                    "Encoding" => "WinAnsiEncoding",
                });
                EmbeddedFont::Standard { font, id }
            }
            FontSource::Embedded(program) => {
                let font = TrueTypeFont::embed(&mut self.output, program)?;
                debug!(bytes = program.len(), "Font program embedded");
                EmbeddedFont::TrueType(Box::new(font))
            }
        };
        self.fonts.push(embedded);
        Ok(FontHandle(self.fonts.len() - 1))
    }

    fn text_width(&self, font: FontHandle, text: &str, size: f64) -> Result<f64> {
        let embedded = self
            .fonts
            .get(font.0)
            .ok_or_else(|| PagemarkError::FontError(format!("unknown font handle {}", font.0)))?;
        match embedded {
            EmbeddedFont::Standard { font, .. } => Ok(fonts::text_width(*font, text, size)),
            EmbeddedFont::TrueType(font) => font.text_width(text, size),
        }
    }

    fn draw_line(&mut self, handle: PageHandle, params: &LineParams) -> Result<()> {
        ensure_finite(&[params.start.x, params.start.y, params.end.x, params.end.y, params.thickness])?;
        let mut operations = vec![
            Operation::new("w", vec![real(params.thickness)]),
            // Round caps.
            Operation::new("J", vec![1.into()]),
        ];
        operations.push(Operation::new("RG", rgb_operands(params.color)));
        operations.push(Operation::new("m", vec![real(params.start.x), real(params.start.y)]));
        operations.push(Operation::new("l", vec![real(params.end.x), real(params.end.y)]));
        operations.push(Operation::new("S", vec![]));
        self.push_isolated(handle, params.opacity, operations)
    }

    fn draw_rectangle(&mut self, handle: PageHandle, params: &RectParams) -> Result<()> {
        let rect = params.rect;
        ensure_finite(&[rect.x, rect.y, rect.width, rect.height])?;
        let operations = vec![
            Operation::new("rg", rgb_operands(params.color)),
            Operation::new("re", vec![real(rect.x), real(rect.y), real(rect.width), real(rect.height)]),
            Operation::new("f", vec![]),
        ];
        self.push_isolated(handle, params.opacity, operations)
    }

    fn draw_image(&mut self, handle: PageHandle, params: &ImageParams) -> Result<()> {
        let rect = params.rect;
        ensure_finite(&[rect.x, rect.y, rect.width, rect.height])?;
        let image_id = *self
            .images
            .get(params.image.0)
            .ok_or_else(|| PagemarkError::ImageError(format!("unknown image handle {}", params.image.0)))?;
        let name = format!("PmIm{}", params.image.0);
        self.page_mut(handle)?.xobjects.insert(name.clone(), image_id);
        let operations = vec![
            Operation::new(
                "cm",
                vec![
                    real(rect.width),
                    0.into(),
                    0.into(),
                    real(rect.height),
                    real(rect.x),
                    real(rect.y),
                ],
            ),
            Operation::new("Do", vec![Object::Name(name.into_bytes())]),
        ];
        self.push_isolated(handle, params.opacity, operations)
    }

    fn draw_text(&mut self, handle: PageHandle, params: &TextParams) -> Result<()> {
        ensure_finite(&[params.origin.x, params.origin.y, params.size])?;
        // Fail on a bad handle before recording glyphs.
        self.page_mut(handle)?;
        let embedded = self
            .fonts
            .get_mut(params.font.0)
            .ok_or_else(|| PagemarkError::FontError(format!("unknown font handle {}", params.font.0)))?;
        let font_id = embedded.id();
        let shown = match embedded {
            EmbeddedFont::Standard { .. } => Object::String(encode_win_ansi(&params.text), StringFormat::Literal),
            EmbeddedFont::TrueType(font) => Object::String(font.encode(&params.text)?, StringFormat::Hexadecimal),
        };
        let name = format!("PmF{}", params.font.0);
        self.page_mut(handle)?.fonts.insert(name.clone(), font_id);
        let operations = vec![
            Operation::new("rg", rgb_operands(params.color)),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(name.into_bytes()), real(params.size)]),
            Operation::new("Td", vec![real(params.origin.x), real(params.origin.y)]),
            Operation::new("Tj", vec![shown]),
            Operation::new("ET", vec![]),
        ];
        self.push_isolated(handle, 1.0, operations)
    }

    fn add_page(&mut self, handle: PageHandle) -> Result<()> {
        let page = self.page_mut(handle)?;
        let mut operations = std::mem::take(&mut page.operations);
        let (llx, lly) = page.origin;
        if llx != 0.0 || lly != 0.0 {
            operations.insert(
                0,
                Operation::new("cm", vec![1.into(), 0.into(), 0.into(), 1.into(), real(llx), real(lly)]),
            );
        }
        let page_id = page.id;

        let overlay = Content { operations }
            .encode()
            .map_err(|err| PagemarkError::PdfError(format!("cannot encode page content: {err}")))?;
        let resources = self.merged_resources(self.page(handle)?)?;

        let existing: Vec<Object> = match self
            .output
            .get_object(page_id)
            .and_then(Object::as_dict)
            .and_then(|dict| dict.get(b"Contents"))
        {
            Ok(Object::Array(items)) => items.clone(),
            Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
            _ => Vec::new(),
        };

        let head_id = self.output.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        let mut tail = b"Q\n".to_vec();
        tail.extend_from_slice(&overlay);
        let tail_id = self.output.add_object(Stream::new(dictionary! {}, tail));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(head_id));
        contents.extend(existing);
        contents.push(Object::Reference(tail_id));

        let pages_id = self.pages_id;
        let dict = self
            .output
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| PagemarkError::PdfError(format!("page object missing: {err}")))?;
        dict.set("Contents", contents);
        dict.set("Resources", resources);
        dict.set("Parent", pages_id);

        self.pages[handle.0].added = true;
        self.kids.push(page_id);
        Ok(())
    }

    #[instrument(skip_all, fields(pages = self.kids.len()))]
    fn save(&mut self) -> Result<Vec<u8>> {
        let kids: Vec<Object> = self.kids.iter().map(|id| Object::Reference(*id)).collect();
        self.output.set_object(
            self.pages_id,
            dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
            },
        );
        let pages_id = self.pages_id;
        let catalog_id = *self.catalog_id.get_or_insert_with(|| {
            self.output.add_object(dictionary! {
                "Type" => "Catalog",
                "Pages" => pages_id,
            })
        });
        self.output.trailer.set("Root", catalog_id);
        for font in &self.fonts {
            if let EmbeddedFont::TrueType(font) = font {
                font.finish(&mut self.output)?;
            }
        }
        self.output.prune_objects();
        self.output.compress();

        let mut bytes = Vec::new();
        self.output
            .save_to(&mut bytes)
            .map_err(|err| PagemarkError::PdfError(format!("failed to serialise PDF: {err}")))?;
        info!(bytes = bytes.len(), "PDF written");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::tests::sample_pdf;
    use pagemark_core::geometry::{DocPoint, DocRect};
    use std::io::Cursor;

    fn source(pages: usize, rotate: i64) -> SourceDocument {
        SourceDocument::new(0, None, sample_pdf(pages, rotate))
    }

    fn png(alpha: u8) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, alpha]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn copies_pages_and_composes_rotation() {
        let mut compositor = LopdfCompositor::new();
        compositor.load_source(&source(2, 90)).unwrap();
        let page = compositor.copy_page(0, 1).unwrap();
        assert_eq!(compositor.page_size(page).unwrap(), PageSize::new(210.0, 297.0));
        assert_eq!(compositor.rotation(page).unwrap(), 90);
        compositor.set_rotation(page, 90 + 270).unwrap();
        assert_eq!(compositor.rotation(page).unwrap(), 0);
        compositor.add_page(page).unwrap();

        let bytes = compositor.save().unwrap();
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        assert_eq!(reader.page_count(), 1);
        assert_eq!(reader.rotation(0).unwrap(), 0);
        assert_eq!(reader.page_size(0).unwrap(), PageSize::new(210.0, 297.0));
    }

    #[test]
    fn overlay_is_appended_after_original_content() {
        let mut compositor = LopdfCompositor::new();
        compositor.load_source(&source(1, 0)).unwrap();
        let page = compositor.copy_page(0, 0).unwrap();
        let font = compositor.embed_font(FontSource::Standard(StandardFont::Helvetica)).unwrap();
        compositor
            .draw_rectangle(
                page,
                &RectParams {
                    rect: DocRect::new(10.0, 10.0, 50.0, 20.0),
                    color: Color::HIGHLIGHT,
                    opacity: 0.4,
                },
            )
            .unwrap();
        compositor
            .draw_text(
                page,
                &TextParams {
                    text: "Hello".into(),
                    origin: DocPoint::new(21.0, 259.3),
                    size: 8.0,
                    font,
                    color: Color::BLACK,
                },
            )
            .unwrap();
        compositor.add_page(page).unwrap();
        let bytes = compositor.save().unwrap();

        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let doc = reader.document();
        let page_id = reader.page_id(0).unwrap();
        let content = doc.get_page_content(page_id).unwrap();
        let original = content.windows(b"(Page 1) Tj".len()).position(|w| w == b"(Page 1) Tj").unwrap();
        let added = content.windows(b"(Hello) Tj".len()).position(|w| w == b"(Hello) Tj").unwrap();
        assert!(original < added);
        assert!(contains(&content, b"/PmGs400 gs"));

        let page_dict = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let resources = page_dict.get(b"Resources").unwrap().as_dict().unwrap();
        assert!(resources.get(b"ExtGState").is_ok());
        assert!(resources.get(b"Font").unwrap().as_dict().unwrap().has(b"PmF0"));
        // The source font survives the merge.
        assert!(resources.get(b"Font").unwrap().as_dict().unwrap().has(b"F1"));
    }

    #[test]
    fn translucent_images_get_a_soft_mask() {
        let mut compositor = LopdfCompositor::new();
        let opaque = compositor.embed_image(&png(255)).unwrap();
        let translucent = compositor.embed_image(&png(128)).unwrap();
        let opaque_dict = &compositor.output.get_object(compositor.images[opaque.0]).unwrap().as_stream().unwrap().dict;
        assert!(!opaque_dict.has(b"SMask"));
        let translucent_dict = &compositor
            .output
            .get_object(compositor.images[translucent.0])
            .unwrap()
            .as_stream()
            .unwrap()
            .dict;
        assert!(translucent_dict.has(b"SMask"));
    }

    #[test]
    fn draws_images_into_rect() {
        let mut compositor = LopdfCompositor::new();
        compositor.load_source(&source(1, 0)).unwrap();
        let page = compositor.copy_page(0, 0).unwrap();
        let image = compositor.embed_image(&png(255)).unwrap();
        compositor
            .draw_image(
                page,
                &ImageParams {
                    image,
                    rect: DocRect::new(52.5, 74.25, 105.0, 148.5),
                    opacity: 0.5,
                },
            )
            .unwrap();
        compositor.add_page(page).unwrap();
        let bytes = compositor.save().unwrap();
        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let content = reader.document().get_page_content(reader.page_id(0).unwrap()).unwrap();
        assert!(contains(&content, b"/PmIm0 Do"));
    }

    #[test]
    fn garbage_image_is_an_image_error() {
        let mut compositor = LopdfCompositor::new();
        assert!(matches!(compositor.embed_image(b"nope"), Err(PagemarkError::ImageError(_))));
    }

    #[test]
    fn standard_fonts_are_shared_and_bad_programs_refused() {
        let mut compositor = LopdfCompositor::new();
        assert!(matches!(
            compositor.embed_font(FontSource::Embedded(b"\0\x01\0\0")),
            Err(PagemarkError::FontError(_))
        ));
        let a = compositor.embed_font(FontSource::Standard(StandardFont::Courier)).unwrap();
        let b = compositor.embed_font(FontSource::Standard(StandardFont::Courier)).unwrap();
        assert_eq!(a, b);
        assert_eq!(compositor.text_width(a, "abc", 10.0).unwrap(), 18.0);
    }

    /// A full-coverage TrueType font from the host, if one is installed.
    fn system_truetype_font() -> Option<Vec<u8>> {
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
            "/Library/Fonts/Arial Unicode.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ]
        .iter()
        .find_map(|path| std::fs::read(path).ok())
    }

    #[test]
    fn truetype_font_draws_text_unmodified() {
        let Some(program) = system_truetype_font() else {
            eprintln!("no TrueType font installed; skipping");
            return;
        };
        let mut compositor = LopdfCompositor::new();
        compositor.load_source(&source(1, 0)).unwrap();
        let page = compositor.copy_page(0, 0).unwrap();
        let font = compositor.embed_font(FontSource::Embedded(&program)).unwrap();
        assert!(compositor.text_width(font, "ğüşİöç", 10.0).unwrap() > 0.0);
        compositor
            .draw_text(
                page,
                &TextParams {
                    text: "ğüşİöç".into(),
                    origin: DocPoint::new(20.0, 200.0),
                    size: 12.0,
                    font,
                    color: Color::BLACK,
                },
            )
            .unwrap();
        compositor.add_page(page).unwrap();
        let bytes = compositor.save().unwrap();

        let reader = PdfReader::from_bytes(&bytes).unwrap();
        let doc = reader.document();
        let page_id = reader.page_id(0).unwrap();
        let fonts = doc.get_page_fonts(page_id).unwrap();
        let type0 = fonts.get(b"PmF0".as_slice()).unwrap();
        assert_eq!(type0.get(b"Subtype").unwrap().as_name().unwrap(), b"Type0");
        assert_eq!(type0.get(b"Encoding").unwrap().as_name().unwrap(), b"Identity-H");

        let descendants = type0.get(b"DescendantFonts").unwrap().as_array().unwrap();
        let cid_font = doc.get_dictionary(descendants[0].as_reference().unwrap()).unwrap();
        assert_eq!(cid_font.get(b"Subtype").unwrap().as_name().unwrap(), b"CIDFontType2");
        // Six distinct glyphs, each as `gid [width]`.
        assert_eq!(cid_font.get(b"W").unwrap().as_array().unwrap().len(), 12);
        let descriptor = doc
            .get_dictionary(cid_font.get(b"FontDescriptor").unwrap().as_reference().unwrap())
            .unwrap();
        assert!(descriptor.has(b"FontFile2"));

        let text: String = doc.extract_text_chunks(&[1]).into_iter().filter_map(|chunk| chunk.ok()).collect();
        assert!(text.contains("ğüşİöç"), "extracted {text:?}");
    }

    #[test]
    fn unknown_source_and_page_are_errors() {
        let mut compositor = LopdfCompositor::new();
        assert!(matches!(compositor.copy_page(3, 0), Err(PagemarkError::UnknownSource(3))));
        compositor.load_source(&source(1, 0)).unwrap();
        assert!(matches!(compositor.copy_page(0, 5), Err(PagemarkError::PdfError(_))));
    }

    #[test]
    fn page_cannot_be_added_twice() {
        let mut compositor = LopdfCompositor::new();
        compositor.load_source(&source(1, 0)).unwrap();
        let page = compositor.copy_page(0, 0).unwrap();
        compositor.add_page(page).unwrap();
        assert!(compositor.add_page(page).is_err());
    }

    #[test]
    fn non_finite_coordinates_are_rejected() {
        let mut compositor = LopdfCompositor::new();
        compositor.load_source(&source(1, 0)).unwrap();
        let page = compositor.copy_page(0, 0).unwrap();
        let result = compositor.draw_rectangle(
            page,
            &RectParams {
                rect: DocRect::new(f64::NAN, 0.0, 1.0, 1.0),
                color: Color::WHITE,
                opacity: 1.0,
            },
        );
        assert!(result.is_err());
    }
}
