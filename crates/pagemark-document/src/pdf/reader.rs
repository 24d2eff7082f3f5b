// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open and inspect source documents with `lopdf`, and clone
// their pages into an output document.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};
use pagemark_core::error::{PagemarkError, Result};
use pagemark_core::geometry::PageSize;
use tracing::{debug, instrument, warn};

/// Page size used when a page and all its ancestors lack a `/MediaBox`.
pub const FALLBACK_PAGE_SIZE: PageSize = PageSize {
    width: 595.0,
    height: 842.0,
};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Read-only view of a source PDF.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    /// Parse a PDF already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| PagemarkError::PdfError(format!("failed to load PDF from memory: {err}")))?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");
        Ok(Self { document })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Object id of a zero-based page.
    pub fn page_id(&self, page_index: u32) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        // lopdf keys pages by 1-indexed page number.
        pages.get(&(page_index + 1)).copied().ok_or_else(|| {
            PagemarkError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_index + 1,
                pages.len()
            ))
        })
    }

    /// Unrotated size of a zero-based page in points.
    pub fn page_size(&self, page_index: u32) -> Result<PageSize> {
        let page_id = self.page_id(page_index)?;
        Ok(media_box(&self.document, page_id)
            .map(|(_, size)| size)
            .unwrap_or(FALLBACK_PAGE_SIZE))
    }

    /// `/Rotate` of a zero-based page, normalised to 0..360.
    pub fn rotation(&self, page_index: u32) -> Result<i32> {
        let page_id = self.page_id(page_index)?;
        Ok(inherited(&self.document, page_id, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .map(|v| (v as i32).rem_euclid(360))
            .unwrap_or(0))
    }
}

// -- Page tree helpers --------------------------------------------------------

/// Look up `key` on a page, walking `/Parent` links for inherited attributes.
pub(crate) fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = Some(page_id);
    let mut depth = 0;
    while let Some(id) = current {
        // Guards against cyclic /Parent chains in malformed files.
        if depth > 64 {
            return None;
        }
        depth += 1;
        let dict = doc.get_object(id).and_then(Object::as_dict).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(resolve(doc, value));
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Follow a single indirect reference.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

/// Lower-left origin and size of a page's `/MediaBox`.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> Option<((f64, f64), PageSize)> {
    let array = inherited(doc, page_id, b"MediaBox")?.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let llx = number(resolve(doc, &array[0]))?;
    let lly = number(resolve(doc, &array[1]))?;
    let urx = number(resolve(doc, &array[2]))?;
    let ury = number(resolve(doc, &array[3]))?;
    Some(((llx.min(urx), lly.min(ury)), PageSize::new((urx - llx).abs(), (ury - lly).abs())))
}

pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some((*f).into()),
        _ => None,
    }
}

/// Clone a page and everything it references from `source` into `target`.
///
/// Inherited attributes are copied onto the clone so it stands alone; the
/// caller sets `/Parent`. `memo` maps source ids to target ids and is shared
/// across pages of the same source so shared resources are copied once.
pub(crate) fn clone_page_into(
    source: &Document,
    target: &mut Document,
    page_id: ObjectId,
    memo: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    let page = source
        .get_object(page_id)
        .and_then(Object::as_dict)
        .map_err(|err| PagemarkError::PdfError(format!("cannot read page object {page_id:?}: {err}")))?;

    let new_id = target.new_object_id();
    memo.insert(page_id, new_id);

    let mut cloned = Dictionary::new();
    for (key, value) in page.iter() {
        if key == b"Parent" {
            continue;
        }
        cloned.set(key.clone(), deep_clone_object(source, target, value, memo));
    }
    for key in INHERITABLE {
        if !cloned.has(key)
            && let Some(value) = inherited(source, page_id, key)
        {
            cloned.set(key.to_vec(), deep_clone_object(source, target, value, memo));
        }
    }

    target.set_object(new_id, Object::Dictionary(cloned));
    Ok(new_id)
}

/// Deep-clone a single object, resolving references through `memo`.
/// `/Parent` keys are dropped to avoid dragging in the source page tree.
fn deep_clone_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    memo: &mut HashMap<ObjectId, ObjectId>,
) -> Object {
    match object {
        Object::Dictionary(dict) => Object::Dictionary(clone_dictionary(source, target, dict, memo)),
        Object::Array(items) => Object::Array(
            items
                .iter()
                .map(|item| deep_clone_object(source, target, item, memo))
                .collect(),
        ),
        Object::Reference(ref_id) => {
            if let Some(existing) = memo.get(ref_id) {
                return Object::Reference(*existing);
            }
            match source.get_object(*ref_id) {
                Ok(referenced) => {
                    let new_id = target.new_object_id();
                    memo.insert(*ref_id, new_id);
                    let cloned = deep_clone_object(source, target, referenced, memo);
                    target.set_object(new_id, cloned);
                    Object::Reference(new_id)
                }
                Err(err) => {
                    warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                    Object::Null
                }
            }
        }
        Object::Stream(stream) => {
            let dict = clone_dictionary(source, target, &stream.dict, memo);
            let mut cloned = lopdf::Stream::new(dict, stream.content.clone());
            // Content is copied verbatim, filters included.
            cloned.allows_compression = false;
            Object::Stream(cloned)
        }
        other => other.clone(),
    }
}

fn clone_dictionary(
    source: &Document,
    target: &mut Document,
    dict: &Dictionary,
    memo: &mut HashMap<ObjectId, ObjectId>,
) -> Dictionary {
    let mut cloned = Dictionary::new();
    for (key, value) in dict.iter() {
        if key == b"Parent" {
            continue;
        }
        cloned.set(key.clone(), deep_clone_object(source, target, value, memo));
    }
    cloned
}
