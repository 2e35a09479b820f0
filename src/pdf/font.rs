//! TrueType embedding as a composite (Type0) font
//!
//! Text is encoded with `Identity-H`: every glyph is written as its two-byte
//! glyph id, so any glyph in the font can be drawn without a custom encoding.
//! Widths and the `/ToUnicode` map only cover glyphs that were actually
//! drawn, and are written when the document is saved.

use std::collections::{BTreeMap, HashMap};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use rustybuzz::ttf_parser::{Face, GlyphId};
use crate::error::{Error, Result};
use crate::fonts::FontSource;

/// `/BaseFont` used when the font source has no usable name
const FALLBACK_FONT_NAME: &str = "EmbeddedFont";

/// PDF limit on entries in one `beginbfchar` block
const MAX_BFCHAR_ENTRIES: usize = 100;

/// Reference to a font embedded in an output document.
///
/// The handle is only meaningful for the document that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontHandle {
    pub(crate) slot: usize,
    pub(crate) font_id: ObjectId,
}

/// Embedded font plus the glyphs drawn with it so far.
///
/// The character map and advances are read from the font once at embed
/// time, so encoding text never touches the font program again.
#[derive(Debug)]
pub(crate) struct EmbeddedFont {
    glyphs: HashMap<char, u16>,
    /// Advance of each glyph id, already scaled to 1000 units per em
    widths: Vec<i64>,
    cid_font_id: ObjectId,
    to_unicode_id: ObjectId,
    used: BTreeMap<u16, UsedGlyph>,
}

#[derive(Debug, Clone, Copy)]
struct UsedGlyph {
    /// `None` for `.notdef`, which has no meaningful Unicode value
    ch: Option<char>,
    width: i64,
}

impl EmbeddedFont {
    /// Add the font program, descriptor and font dictionaries to `doc`.
    ///
    /// Returns the embedding state and the id of the Type0 font dictionary.
    pub(crate) fn embed(doc: &mut Document, source: &FontSource) -> Result<(Self, ObjectId)> {
        let face = parse_face(&source.data)?;
        if face.tables().cff.is_some() {
            return Err(Error::Font(format!(
                "{} has CFF outlines; only TrueType outlines can be embedded",
                source.name
            )));
        }
        let units_per_em = face.units_per_em() as f32;
        let scale = |v: i16| (v as f32 * 1000.0 / units_per_em).round() as i64;

        let base_font = base_font_name(&source.name);

        let font_file_id = doc.add_object(Stream::new(
            dictionary! { "Length1" => source.data.len() as i64 },
            source.data.clone(),
        ));

        let bbox = face.global_bounding_box();
        let ascent = scale(face.ascender());
        let descent = scale(face.descender());
        let cap_height = face.capital_height().map(scale).unwrap_or(ascent);

        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => base_font.as_str(),
            "Flags" => 4, // Symbolic
            "FontBBox" => Object::Array(vec![
                Object::Integer(scale(bbox.x_min)),
                Object::Integer(scale(bbox.y_min)),
                Object::Integer(scale(bbox.x_max)),
                Object::Integer(scale(bbox.y_max)),
            ]),
            "ItalicAngle" => 0,
            "Ascent" => ascent,
            "Descent" => descent,
            "CapHeight" => cap_height,
            "StemV" => 80,
            "FontFile2" => font_file_id,
        });

        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => base_font.as_str(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::String(b"Adobe".to_vec(), StringFormat::Literal),
                "Ordering" => Object::String(b"Identity".to_vec(), StringFormat::Literal),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "CIDToGIDMap" => "Identity",
            "DW" => 1000,
        });

        // Filled in by `finish`, once the drawn glyphs are known
        let to_unicode_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => base_font.as_str(),
            "Encoding" => "Identity-H",
            "DescendantFonts" => Object::Array(vec![Object::Reference(cid_font_id)]),
            "ToUnicode" => to_unicode_id,
        });

        let widths = (0..face.number_of_glyphs())
            .map(|gid| {
                let advance = face.glyph_hor_advance(GlyphId(gid)).unwrap_or(0);
                (advance as f32 * 1000.0 / units_per_em).round() as i64
            })
            .collect();

        let font = Self {
            glyphs: char_map(&face),
            widths,
            cid_font_id,
            to_unicode_id,
            used: BTreeMap::new(),
        };

        Ok((font, font_id))
    }

    /// Encode text as a hex string of glyph ids, recording each glyph.
    ///
    /// Characters the font has no glyph for are drawn as `.notdef`.
    pub(crate) fn encode(&mut self, text: &str) -> String {
        let mut hex = String::with_capacity(text.len() * 4 + 2);
        hex.push('<');

        for ch in text.chars() {
            let (gid, mapped) = match self.glyphs.get(&ch) {
                Some(&gid) => (gid, Some(ch)),
                None => (0, None),
            };
            let width = self.widths.get(gid as usize).copied().unwrap_or(0);

            self.used.entry(gid).or_insert(UsedGlyph { ch: mapped, width });
            hex.push_str(&format!("{:04X}", gid));
        }

        hex.push('>');
        hex
    }

    /// Write `/W` and the `/ToUnicode` stream for the glyphs used.
    pub(crate) fn finish(&self, doc: &mut Document) -> Result<()> {
        let widths = width_array(&self.used);
        let cid_font = doc.get_object_mut(self.cid_font_id)?.as_dict_mut()?;
        cid_font.set("W", Object::Array(widths));

        let cmap = to_unicode_cmap(&self.used);
        doc.objects.insert(
            self.to_unicode_id,
            Object::Stream(Stream::new(Dictionary::new(), cmap.into_bytes())),
        );

        Ok(())
    }
}

fn parse_face(data: &[u8]) -> Result<Face<'_>> {
    Face::parse(data, 0).map_err(|e| Error::Font(format!("cannot parse TrueType data: {}", e)))
}

/// Unicode character to glyph id, taken from every Unicode `cmap` subtable.
/// Earlier subtables win, matching `Face::glyph_index`.
fn char_map(face: &Face<'_>) -> HashMap<char, u16> {
    let mut glyphs = HashMap::new();
    let Some(cmap) = face.tables().cmap else {
        return glyphs;
    };

    for subtable in cmap.subtables {
        if !subtable.is_unicode() {
            continue;
        }
        subtable.codepoints(|code_point| {
            let ch = char::from_u32(code_point);
            let gid = subtable.glyph_index(code_point);
            if let (Some(ch), Some(gid)) = (ch, gid) {
                if gid.0 != 0 {
                    glyphs.entry(ch).or_insert(gid.0);
                }
            }
        });
    }

    glyphs
}

/// PDF names cannot hold spaces or delimiters; keep the safe characters
fn base_font_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if cleaned.is_empty() {
        FALLBACK_FONT_NAME.to_string()
    } else {
        cleaned
    }
}

/// `/W` entries, grouping consecutive glyph ids: `[first [w1 w2 ...] ...]`
fn width_array(used: &BTreeMap<u16, UsedGlyph>) -> Vec<Object> {
    let mut array = Vec::new();
    let mut run_start: Option<u16> = None;
    let mut run: Vec<Object> = Vec::new();
    let mut last: Option<u16> = None;

    for (&gid, glyph) in used {
        let continues = matches!(last, Some(prev) if prev as u32 + 1 == gid as u32);
        if !continues {
            if let Some(start) = run_start.take() {
                array.push(Object::Integer(start as i64));
                array.push(Object::Array(std::mem::take(&mut run)));
            }
            run_start = Some(gid);
        }
        run.push(Object::Integer(glyph.width));
        last = Some(gid);
    }

    if let Some(start) = run_start {
        array.push(Object::Integer(start as i64));
        array.push(Object::Array(run));
    }

    array
}

/// Build a ToUnicode CMap mapping each used glyph id back to its character
fn to_unicode_cmap(used: &BTreeMap<u16, UsedGlyph>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo
<< /Registry (Adobe)
/Ordering (UCS)
/Supplement 0
>> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
",
    );

    let entries: Vec<(u16, char)> = used
        .iter()
        .filter_map(|(&gid, glyph)| glyph.ch.map(|ch| (gid, ch)))
        .collect();
    for chunk in entries.chunks(MAX_BFCHAR_ENTRIES) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, ch) in chunk {
            cmap.push_str(&format!("<{:04X}> <{}>\n", gid, utf16_hex(*ch)));
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str(
        "endcmap
CMapName currentdict /CMap defineresource pop
end
end
",
    );
    cmap
}

fn utf16_hex(ch: char) -> String {
    let mut buf = [0u16; 2];
    ch.encode_utf16(&mut buf)
        .iter()
        .map(|unit| format!("{:04X}", unit))
        .collect()
}
