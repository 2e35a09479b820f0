//! Content-stream and resource helpers for drawing on existing pages

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use crate::error::{Error, Result};

/// Text placement and styling for one `Tj` run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPlacement {
    pub x: f32,
    pub y: f32,
    /// Counter-clockwise, in degrees
    pub rotation: f32,
    pub size: f32,
}

/// Represents a PDF transformation matrix [a b c d e f]
/// where: x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TransformMatrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl TransformMatrix {
    /// Rotation about the origin followed by a translation to (x, y)
    pub fn rotate_translate(degrees: f32, x: f32, y: f32) -> Self {
        let radians = (degrees as f64).to_radians();
        let cos = snap(radians.cos());
        let sin = snap(radians.sin());
        Self { a: cos, b: sin, c: -sin, d: cos, e: x, f: y }
    }

    fn operands(&self) -> String {
        [self.a, self.b, self.c, self.d, self.e, self.f]
            .iter()
            .map(|v| format_number(*v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Remove floating point noise so right angles produce exact 0 / ±1
fn snap(v: f64) -> f32 {
    let rounded = v.round();
    if (v - rounded).abs() < 1e-9 {
        rounded as f32
    } else {
        v as f32
    }
}

/// Format a number for a content stream, without exponent notation
pub(crate) fn format_number(v: f32) -> String {
    if v == v.trunc() && v.abs() < 1e9 {
        // Avoid "-0"
        format!("{}", v as i64)
    } else {
        let s = format!("{:.4}", v);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Generate the operators that draw `glyphs` (an encoded string operand)
/// with the given font and graphics-state resources.
pub(crate) fn text_operators(
    glyphs: &str,
    font_name: &str,
    gs_name: Option<&str>,
    placement: &TextPlacement,
) -> String {
    let matrix = TransformMatrix::rotate_translate(placement.rotation, placement.x, placement.y);

    let mut content = String::new();
    content.push_str("q\n");
    if let Some(gs) = gs_name {
        content.push_str(&format!("/{} gs\n", gs));
    }
    content.push_str("BT\n");
    content.push_str("0 0 0 rg\n");
    content.push_str(&format!("/{} {} Tf\n", font_name, format_number(placement.size)));
    content.push_str(&format!("{} Tm\n", matrix.operands()));
    content.push_str(&format!("{} Tj\n", glyphs));
    content.push_str("ET\n");
    content.push_str("Q\n");
    content
}

/// Resolve the page's Resources into a dictionary owned by the page.
///
/// Resources are often shared between pages through a reference; the page
/// gets its own copy so adding entries does not leak onto other pages.
fn page_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let page_dict = doc.get_dictionary(page_id)?;

    let resources = match page_dict.get(b"Resources") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(res_id)) => match doc.get_object(*res_id)? {
            Object::Dictionary(dict) => dict.clone(),
            _ => Dictionary::new(),
        },
        _ => Dictionary::new(),
    };

    Ok(resources)
}

/// Register `object` under a fresh name in the page's `category` resource
/// dictionary (e.g. `Font`, `ExtGState`) and return the name used.
pub(crate) fn add_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    prefix: &str,
    object: ObjectId,
) -> Result<String> {
    let mut resources = page_resources(doc, page_id)?;

    let mut entries = match resources.get(category.as_bytes()) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Dictionary(dict) => dict.clone(),
            _ => Dictionary::new(),
        },
        _ => Dictionary::new(),
    };

    let name = unique_name(&entries, prefix);
    entries.set(name.as_bytes().to_vec(), Object::Reference(object));
    resources.set(category.as_bytes().to_vec(), Object::Dictionary(entries));

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page_dict.set("Resources", Object::Dictionary(resources));

    Ok(name)
}

fn unique_name(entries: &Dictionary, prefix: &str) -> String {
    (1..)
        .map(|n| format!("{}{}", prefix, n))
        .find(|candidate| !entries.has(candidate.as_bytes()))
        .unwrap_or_else(|| prefix.to_string())
}

/// Content stream references of a page, in drawing order.
///
/// `/Contents` may be a stream reference, an array of them, or a reference
/// to such an array; the last form is flattened so the result only ever
/// holds stream references.
fn content_refs(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let page_dict = doc
        .get_dictionary(page_id)
        .map_err(|_| Error::InvalidPage(format!("{:?} is not a page dictionary", page_id)))?;

    let refs = match page_dict.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(arr)) => arr.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(arr)) => arr.clone(),
        _ => vec![],
    };

    Ok(refs)
}

/// Wrap the page's existing content in `q` ... `Q`, so transformations left
/// active by the original content do not apply to streams appended later.
pub(crate) fn wrap_page_content(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let existing = content_refs(doc, page_id)?;
    if existing.is_empty() {
        return Ok(());
    }

    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let close_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(close_id));

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page_dict.set("Contents", Object::Array(contents));

    Ok(())
}

/// Append a content stream to a page's Contents
///
/// Appended content is drawn after the original, i.e. on top of it.
pub(crate) fn append_content(doc: &mut Document, page_id: ObjectId, content: String) -> Result<()> {
    let mut contents = content_refs(doc, page_id)?;
    let stream_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
    contents.push(Object::Reference(stream_id));

    let page_dict = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page_dict.set("Contents", Object::Array(contents));

    Ok(())
}
