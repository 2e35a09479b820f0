//! Output document assembly: page copying, font embedding, drawing and saving

use std::collections::{HashMap, HashSet};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;
use crate::error::{Error, Result};
use crate::fonts::FontSource;
use super::content::{self, TextPlacement};
use super::font::{EmbeddedFont, FontHandle};
use super::source::{inherited_attribute, SourceDocument, INHERITABLE_KEYS};

/// A page copied into an [`OutputDocument`], not necessarily added to its page tree yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopiedPage {
    pub(crate) id: ObjectId,
}

/// Options for [`OutputDocument::draw_text`]
#[derive(Debug, Clone, Copy)]
pub struct DrawTextOptions {
    pub font: FontHandle,
    pub placement: TextPlacement,
    /// Fill opacity, 0.0 to 1.0
    pub opacity: f32,
}

/// A new PDF that pages are copied into and drawn on
#[derive(Debug)]
pub struct OutputDocument {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    fonts: Vec<EmbeddedFont>,
    wrapped: HashSet<ObjectId>,
    /// ExtGState objects keyed by the bits of their alpha
    ext_gstates: HashMap<u32, ObjectId>,
}

impl OutputDocument {
    /// Create an empty document
    pub fn create() -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            fonts: Vec::new(),
            wrapped: HashSet::new(),
            ext_gstates: HashMap::new(),
        }
    }

    /// Number of pages added so far
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Copy pages from `source` into this document.
    ///
    /// Each copy carries the page's content, resources and inherited
    /// attributes (`MediaBox`, `Rotate`, ...) but is not part of the page
    /// tree until passed to [`OutputDocument::add_page`]. Objects shared
    /// between the requested pages are copied once.
    pub fn copy_pages(&mut self, source: &SourceDocument, indices: &[usize]) -> Result<Vec<CopiedPage>> {
        let src = &source.doc;
        let mut cache: HashMap<ObjectId, ObjectId> = HashMap::new();

        // Reserve ids for every page up front so references between the
        // copied pages (annotations, link targets) resolve to the copies.
        let mut plan = Vec::with_capacity(indices.len());
        for &index in indices {
            let src_id = source.page_id(index)?;
            let new_id = *cache
                .entry(src_id)
                .or_insert_with(|| self.doc.new_object_id());
            plan.push((src_id, new_id));
        }

        let mut copied = Vec::with_capacity(plan.len());
        for (src_id, new_id) in plan {
            if !self.doc.objects.contains_key(&new_id) {
                let page = flattened_page(src, src_id)?;
                let page = copy_object_deep(&mut self.doc, src, &Object::Dictionary(page), &mut cache)?;
                self.doc.objects.insert(new_id, page);
            }
            copied.push(CopiedPage { id: new_id });
        }

        debug!(pages = copied.len(), objects = cache.len(), "copied pages");
        Ok(copied)
    }

    /// Append a copied page to the end of the page tree
    pub fn add_page(&mut self, page: CopiedPage) -> Result<CopiedPage> {
        let page_dict = self
            .doc
            .get_object_mut(page.id)?
            .as_dict_mut()
            .map_err(|_| Error::InvalidPage(format!("{:?} is not a page dictionary", page.id)))?;
        page_dict.set("Parent", Object::Reference(self.pages_id));

        self.kids.push(page.id);
        Ok(page)
    }

    /// Embed a TrueType font for use with [`OutputDocument::draw_text`]
    pub fn embed_font(&mut self, font: &FontSource) -> Result<FontHandle> {
        let (embedded, font_id) = EmbeddedFont::embed(&mut self.doc, font)?;
        self.fonts.push(embedded);

        debug!(font = %font.name, bytes = font.data.len(), "embedded font");
        Ok(FontHandle {
            slot: self.fonts.len() - 1,
            font_id,
        })
    }

    /// Draw a single line of text on a page, on top of its existing content
    pub fn draw_text(&mut self, page: CopiedPage, text: &str, options: &DrawTextOptions) -> Result<()> {
        let font = self
            .fonts
            .get_mut(options.font.slot)
            .ok_or_else(|| Error::Font("font handle belongs to another document".to_string()))?;
        let glyphs = font.encode(text);

        if self.wrapped.insert(page.id) {
            content::wrap_page_content(&mut self.doc, page.id)?;
        }

        let font_name = content::add_page_resource(&mut self.doc, page.id, "Font", "WmF", options.font.font_id)?;

        let gs_name = if options.opacity < 1.0 {
            let gs_id = self.ext_gstate(options.opacity);
            Some(content::add_page_resource(&mut self.doc, page.id, "ExtGState", "WmGS", gs_id)?)
        } else {
            None
        };

        let ops = content::text_operators(&glyphs, &font_name, gs_name.as_deref(), &options.placement);
        content::append_content(&mut self.doc, page.id, ops)
    }

    /// Graphics state with the given fill and stroke opacity, shared by
    /// every page drawn with the same value.
    fn ext_gstate(&mut self, opacity: f32) -> ObjectId {
        let alpha = opacity.clamp(0.0, 1.0);
        let doc = &mut self.doc;
        *self.ext_gstates.entry(alpha.to_bits()).or_insert_with(|| {
            doc.add_object(dictionary! {
                "Type" => "ExtGState",
                "ca" => alpha,
                "CA" => alpha,
            })
        })
    }

    /// Serialize the document
    pub fn save(mut self) -> Result<Vec<u8>> {
        for font in &self.fonts {
            font.finish(&mut self.doc)?;
        }

        let kids: Vec<Object> = self.kids.iter().map(|&id| Object::Reference(id)).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => Object::Array(kids),
            "Count" => self.kids.len() as i64,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        // Copied pages that were never added are dropped here
        let pruned = self.doc.prune_objects();
        if !pruned.is_empty() {
            debug!(objects = pruned.len(), "pruned unreferenced objects");
        }

        self.doc.compress();

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

/// The page dictionary with inherited attributes pulled down onto it and
/// its link to the old page tree removed.
fn flattened_page(src: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = src.get_dictionary(page_id)?.clone();

    for key in INHERITABLE_KEYS {
        if page.has(key) {
            continue;
        }
        if let Some(value) = inherited_attribute(src, page_id, key)? {
            page.set(key.to_vec(), value);
        }
    }

    page.remove(b"Parent");
    Ok(page)
}

/// Deep copy an object from source to output document, following references.
///
/// Uses a cache to avoid copying the same object multiple times. Ids are
/// reserved before recursing, so reference cycles terminate.
fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match obj {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Ok(Object::Reference(new_id));
            }

            let new_id = output.new_object_id();
            cache.insert(*id, new_id);

            let copied = match source.get_object(*id) {
                Ok(referenced) => copy_referenced(output, source, referenced, cache)?,
                // Dangling references are legal and read as null
                Err(_) => Object::Null,
            };
            output.objects.insert(new_id, copied);

            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => Ok(Object::Dictionary(copy_dictionary(output, source, dict, cache)?)),
        Object::Array(arr) => {
            let new_arr: Result<Vec<_>> = arr
                .iter()
                .map(|item| copy_object_deep(output, source, item, cache))
                .collect();
            Ok(Object::Array(new_arr?))
        }
        Object::Stream(stream) => {
            let dict = copy_dictionary(output, source, &stream.dict, cache)?;
            let mut copy = Stream::new(dict, stream.content.clone());
            copy.allows_compression = stream.allows_compression;
            Ok(Object::Stream(copy))
        }
        _ => Ok(obj.clone()),
    }
}

/// Copy an object reached through a reference. A page reached this way
/// (e.g. a link target) loses its `Parent` so the old page tree stays behind.
fn copy_referenced(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    if let Object::Dictionary(dict) = obj {
        if is_type(dict, b"Page") || is_type(dict, b"Pages") {
            let mut dict = dict.clone();
            dict.remove(b"Parent");
            dict.remove(b"Kids");
            return copy_object_deep(output, source, &Object::Dictionary(dict), cache);
        }
    }
    copy_object_deep(output, source, obj, cache)
}

fn copy_dictionary(
    output: &mut Document,
    source: &Document,
    dict: &Dictionary,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Dictionary> {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
    }
    Ok(new_dict)
}

fn is_type(dict: &Dictionary, expected: &[u8]) -> bool {
    matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name.as_slice() == expected)
}
