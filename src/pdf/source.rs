//! Loaded input documents and per-page geometry

use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::warn;
use crate::error::{Error, Result};
use crate::geometry::PageGeometry;

/// US Letter media box used when neither a page nor its ancestors declare one
pub const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Page attributes that may be declared on an ancestor `/Pages` node
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `/Parent` chains
const MAX_TREE_DEPTH: usize = 64;

/// An input document opened for copying
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub(crate) doc: Document,
    page_ids: Vec<ObjectId>,
}

/// One page of a [`SourceDocument`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourcePage {
    /// Zero-based page index
    pub index: usize,
    pub(crate) id: ObjectId,
    pub geometry: PageGeometry,
}

impl SourcePage {
    pub fn width(&self) -> f32 {
        self.geometry.width
    }

    pub fn height(&self) -> f32 {
        self.geometry.height
    }

    /// Lower-left corner of the media box
    pub fn media_box_origin(&self) -> (f32, f32) {
        (self.geometry.origin_x, self.geometry.origin_y)
    }

    pub fn rotation_angle(&self) -> f32 {
        self.geometry.rotation
    }
}

impl SourceDocument {
    /// Parse a PDF from memory
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes)?;
        Ok(Self::from_document(doc))
    }

    pub fn from_document(doc: Document) -> Self {
        let page_ids = doc.get_pages().into_values().collect();
        Self { doc, page_ids }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// All page indices in ascending order
    pub fn page_indices(&self) -> Vec<usize> {
        (0..self.page_ids.len()).collect()
    }

    pub(crate) fn page_id(&self, index: usize) -> Result<ObjectId> {
        self.page_ids.get(index).copied().ok_or_else(|| {
            Error::InvalidPage(format!(
                "page index {} out of range ({} pages)",
                index,
                self.page_ids.len()
            ))
        })
    }

    /// Look up a page and read its geometry
    pub fn page(&self, index: usize) -> Result<SourcePage> {
        let id = self.page_id(index)?;

        let media_box = match inherited_attribute(&self.doc, id, b"MediaBox")? {
            Some(obj) => parse_box(&self.doc, &obj)?,
            None => {
                warn!(page = index + 1, "page has no MediaBox, assuming US Letter");
                DEFAULT_MEDIA_BOX
            }
        };

        let rotation = match inherited_attribute(&self.doc, id, b"Rotate")? {
            Some(obj) => number(&self.doc, &obj).ok_or_else(|| {
                Error::InvalidPage(format!("page {} has a non-numeric /Rotate", index + 1))
            })?,
            None => 0.0,
        };

        Ok(SourcePage {
            index,
            id,
            geometry: PageGeometry {
                width: media_box[2] - media_box[0],
                height: media_box[3] - media_box[1],
                origin_x: media_box[0],
                origin_y: media_box[1],
                rotation,
            },
        })
    }
}

/// Read a page attribute, walking up `/Parent` links until it is found.
pub(crate) fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Result<Option<Object>> {
    let mut node = doc.get_dictionary(page_id)?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            let (_, resolved) = doc.dereference(value)?;
            return Ok(Some(resolved.clone()));
        }

        match parent(doc, node) {
            Some(parent) => node = parent,
            None => return Ok(None),
        }
    }

    Err(Error::InvalidPage(format!(
        "page tree deeper than {} levels above {:?}",
        MAX_TREE_DEPTH, page_id
    )))
}

fn parent<'a>(doc: &'a Document, node: &Dictionary) -> Option<&'a Dictionary> {
    let parent_id = node.get(b"Parent").ok()?.as_reference().ok()?;
    doc.get_dictionary(parent_id).ok()
}

/// Parse a rectangle `[x1 y1 x2 y2]` into lower-left / upper-right order
fn parse_box(doc: &Document, obj: &Object) -> Result<[f32; 4]> {
    let array = obj
        .as_array()
        .map_err(|_| Error::InvalidPage("MediaBox is not an array".to_string()))?;

    if array.len() != 4 {
        return Err(Error::InvalidPage(format!(
            "MediaBox must have 4 elements, found {}",
            array.len()
        )));
    }

    let mut values = [0.0f32; 4];
    for (i, item) in array.iter().enumerate() {
        values[i] = number(doc, item)
            .ok_or_else(|| Error::InvalidPage(format!("MediaBox element {} is not a number", i)))?;
    }

    Ok([
        values[0].min(values[2]),
        values[1].min(values[3]),
        values[0].max(values[2]),
        values[1].max(values[3]),
    ])
}

/// Numeric value of an object, following one reference
fn number(doc: &Document, obj: &Object) -> Option<f32> {
    let (_, obj) = doc.dereference(obj).ok()?;
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
