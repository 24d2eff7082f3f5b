// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// TrueType font programs embedded as composite (Type0) fonts.
//
// Text is written with the Identity-H encoding, so every character becomes
// its two-byte glyph id. The glyph widths (`/W`) and the ToUnicode CMap only
// cover glyphs that were actually drawn and are written when the document is
// finished. The font program itself is embedded whole.

use std::collections::BTreeMap;

use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use pagemark_core::error::{PagemarkError, Result};
use ttf_parser::{Face, GlyphId, name_id};

/// Entries per `beginbfchar` block; PDF consumers cap it at 100.
const BFCHAR_BLOCK: usize = 100;

const FLAG_FIXED_PITCH: i64 = 1;
const FLAG_NONSYMBOLIC: i64 = 1 << 5;
const FLAG_ITALIC: i64 = 1 << 6;

const CMAP_HEADER: &str = "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
";

const CMAP_FOOTER: &str = "endcmap
CMapName currentdict /CMap defineresource pop
end
end
";

/// A TrueType program written into the output document.
pub(crate) struct TrueTypeFont {
    program: Vec<u8>,
    units_per_em: f64,
    /// The Type0 font referenced from page resources.
    pub(crate) id: ObjectId,
    cid_font_id: ObjectId,
    to_unicode_id: ObjectId,
    /// Glyph id -> (character it was drawn for, width in glyph space).
    used: BTreeMap<u16, (char, i64)>,
}

fn parse(program: &[u8]) -> Result<Face<'_>> {
    Face::parse(program, 0).map_err(|err| PagemarkError::FontError(format!("cannot parse font program: {err}")))
}

fn glyph(face: &Face<'_>, c: char) -> GlyphId {
    face.glyph_index(c).unwrap_or(GlyphId(0))
}

fn advance(face: &Face<'_>, glyph: GlyphId) -> f64 {
    f64::from(face.glyph_hor_advance(glyph).unwrap_or(0))
}

/// PostScript name from the `name` table, reduced to characters that are
/// safe in a PDF name.
fn postscript_name(face: &Face<'_>) -> String {
    let name: String = face
        .names()
        .into_iter()
        .filter(|n| n.name_id == name_id::POST_SCRIPT_NAME)
        .find_map(|n| n.to_string())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if name.is_empty() { "PagemarkEmbedded".into() } else { name }
}

impl TrueTypeFont {
    /// Parse `program` and write the font objects into `doc`.
    pub(crate) fn embed(doc: &mut Document, program: &[u8]) -> Result<Self> {
        let face = parse(program)?;
        if face.tables().glyf.is_none() {
            return Err(PagemarkError::FontError(
                "font has no TrueType outlines; only glyf-based fonts can be embedded".into(),
            ));
        }
        let units_per_em = f64::from(face.units_per_em());
        let scale = |value: f64| (value * 1000.0 / units_per_em).round() as i64;

        let name = postscript_name(&face);
        let bbox = face.global_bounding_box();
        let mut flags = FLAG_NONSYMBOLIC;
        if face.is_monospaced() {
            flags |= FLAG_FIXED_PITCH;
        }
        if face.is_italic() {
            flags |= FLAG_ITALIC;
        }
        let ascent = scale(f64::from(face.ascender()));
        let cap_height = face.capital_height().map_or(ascent, |h| scale(f64::from(h)));
        // No stem width table in TrueType; 13% of the bbox width is the usual estimate.
        let stem_v = scale(f64::from(bbox.width()) * 0.13);

        let file_id = doc.add_object(Stream::new(
            dictionary! { "Length1" => program.len() as i64 },
            program.to_vec(),
        ));
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(name.clone().into_bytes()),
            "Flags" => flags,
            "FontBBox" => vec![
                scale(f64::from(bbox.x_min)).into(),
                scale(f64::from(bbox.y_min)).into(),
                scale(f64::from(bbox.x_max)).into(),
                scale(f64::from(bbox.y_max)).into(),
            ],
            "ItalicAngle" => Object::Real(face.italic_angle()),
            "Ascent" => ascent,
            "Descent" => scale(f64::from(face.descender())),
            "CapHeight" => cap_height,
            "StemV" => stem_v,
            "FontFile2" => file_id,
        });
        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => Object::Name(name.clone().into_bytes()),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "CIDToGIDMap" => "Identity",
            "DW" => scale(advance(&face, GlyphId(0))),
        });
        let to_unicode_id = doc.new_object_id();
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => Object::Name(name.into_bytes()),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        });

        Ok(Self {
            program: program.to_vec(),
            units_per_em,
            id,
            cid_font_id,
            to_unicode_id,
            used: BTreeMap::new(),
        })
    }

    /// Advance width of `text` at `size` points.
    pub(crate) fn text_width(&self, text: &str, size: f64) -> Result<f64> {
        let face = parse(&self.program)?;
        let units: f64 = text.chars().map(|c| advance(&face, glyph(&face, c))).sum();
        Ok(units * size / self.units_per_em)
    }

    /// Identity-H codes for `text`. Each glyph is remembered for the width
    /// array and the ToUnicode map.
    pub(crate) fn encode(&mut self, text: &str) -> Result<Vec<u8>> {
        let face = parse(&self.program)?;
        let mut codes = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            let gid = glyph(&face, c);
            let width = (advance(&face, gid) * 1000.0 / self.units_per_em).round() as i64;
            self.used.entry(gid.0).or_insert((c, width));
            codes.extend_from_slice(&gid.0.to_be_bytes());
        }
        Ok(codes)
    }

    /// Write the widths and ToUnicode map for every glyph drawn so far.
    pub(crate) fn finish(&self, doc: &mut Document) -> Result<()> {
        let mut widths = Vec::with_capacity(self.used.len() * 2);
        for (gid, (_, width)) in &self.used {
            widths.push(Object::Integer(i64::from(*gid)));
            widths.push(Object::Array(vec![Object::Integer(*width)]));
        }
        doc.get_object_mut(self.cid_font_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| PagemarkError::PdfError(format!("CID font object missing: {err}")))?
            .set("W", widths);
        doc.set_object(self.to_unicode_id, Stream::new(dictionary! {}, self.to_unicode()));
        Ok(())
    }

    fn to_unicode(&self) -> Vec<u8> {
        let mut cmap = String::from(CMAP_HEADER);
        let entries: Vec<(&u16, &(char, i64))> = self.used.iter().filter(|(gid, _)| **gid != 0).collect();
        for block in entries.chunks(BFCHAR_BLOCK) {
            cmap.push_str(&format!("{} beginbfchar\n", block.len()));
            for (gid, (c, _)) in block {
                let mut units = [0u16; 2];
                let target: String = c.encode_utf16(&mut units).iter().map(|u| format!("{u:04X}")).collect();
                cmap.push_str(&format!("<{gid:04X}> <{target}>\n"));
            }
            cmap.push_str("endbfchar\n");
        }
        cmap.push_str(CMAP_FOOTER);
        cmap.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_data_that_is_not_a_font() {
        let mut doc = Document::with_version("1.7");
        assert!(matches!(
            TrueTypeFont::embed(&mut doc, b"\0\x01\0\0fake"),
            Err(PagemarkError::FontError(_))
        ));
    }

    #[test]
    fn to_unicode_maps_drawn_glyphs_only() {
        let font = TrueTypeFont {
            program: Vec::new(),
            units_per_em: 1000.0,
            id: (1, 0),
            cid_font_id: (2, 0),
            to_unicode_id: (3, 0),
            used: BTreeMap::from([(0, ('\u{fffd}', 0)), (36, ('A', 600)), (290, ('ğ', 550)), (3000, ('😀', 1000))]),
        };
        let cmap = String::from_utf8(font.to_unicode()).unwrap();
        assert!(cmap.contains("3 beginbfchar\n"));
        assert!(cmap.contains("<0024> <0041>\n"));
        assert!(cmap.contains("<0122> <011F>\n"));
        assert!(cmap.contains("<0BB8> <D83DDE00>\n"));
        assert!(!cmap.contains("<0000> <FFFD>"));
        assert!(cmap.ends_with(CMAP_FOOTER));
    }
}
