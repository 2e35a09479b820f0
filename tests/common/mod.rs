//! Shared fixtures: generated PDFs and a tiny TrueType font

#![allow(dead_code)]

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// Glyph id of a printable ASCII character in [`minimal_ttf`]
pub fn glyph_for(ch: char) -> u16 {
    ch as u16 - 32 + 1
}

/// Character for a glyph id of [`minimal_ttf`]
pub fn char_for(glyph: u16) -> char {
    if glyph == 0 {
        return '\u{FFFD}';
    }
    char::from_u32((glyph - 1 + 32) as u32).unwrap_or('\u{FFFD}')
}

/// A TrueType font with just enough tables to parse: `.notdef` plus one
/// glyph per printable ASCII character (U+0020..=U+007E), no outlines.
pub fn minimal_ttf() -> Vec<u8> {
    const NUM_GLYPHS: u16 = 96;

    let mut head = Vec::new();
    head.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // version
    head.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // font revision
    head.extend_from_slice(&0u32.to_be_bytes()); // checksum adjustment
    head.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes()); // magic
    head.extend_from_slice(&0u16.to_be_bytes()); // flags
    head.extend_from_slice(&1000u16.to_be_bytes()); // units per em
    head.extend_from_slice(&0u64.to_be_bytes()); // created
    head.extend_from_slice(&0u64.to_be_bytes()); // modified
    for v in [0i16, -200, 1000, 800] {
        head.extend_from_slice(&v.to_be_bytes()); // bbox
    }
    head.extend_from_slice(&0u16.to_be_bytes()); // mac style
    head.extend_from_slice(&8u16.to_be_bytes()); // lowest rec ppem
    head.extend_from_slice(&2i16.to_be_bytes()); // direction hint
    head.extend_from_slice(&0i16.to_be_bytes()); // index to loc format
    head.extend_from_slice(&0i16.to_be_bytes()); // glyph data format
    assert_eq!(head.len(), 54);

    let mut hhea = Vec::new();
    hhea.extend_from_slice(&0x0001_0000u32.to_be_bytes()); // version
    for v in [800i16, -200, 0] {
        hhea.extend_from_slice(&v.to_be_bytes()); // ascender, descender, line gap
    }
    hhea.extend_from_slice(&600u16.to_be_bytes()); // advance width max
    for v in [0i16, 0, 600, 1, 0, 0, 0, 0, 0, 0, 0] {
        // min lsb, min rsb, x max extent, caret rise/run/offset, 4 reserved, metric format
        hhea.extend_from_slice(&v.to_be_bytes());
    }
    hhea.extend_from_slice(&NUM_GLYPHS.to_be_bytes()); // number of h metrics
    assert_eq!(hhea.len(), 36);

    let mut maxp = Vec::new();
    maxp.extend_from_slice(&0x0000_5000u32.to_be_bytes());
    maxp.extend_from_slice(&NUM_GLYPHS.to_be_bytes());

    let mut hmtx = Vec::new();
    for gid in 0..NUM_GLYPHS {
        let advance: u16 = match gid {
            0 => 500,
            1 => 250, // space
            _ => 600,
        };
        hmtx.extend_from_slice(&advance.to_be_bytes());
        hmtx.extend_from_slice(&0i16.to_be_bytes());
    }

    let mut cmap = Vec::new();
    cmap.extend_from_slice(&0u16.to_be_bytes()); // version
    cmap.extend_from_slice(&1u16.to_be_bytes()); // one encoding record
    cmap.extend_from_slice(&3u16.to_be_bytes()); // Windows
    cmap.extend_from_slice(&10u16.to_be_bytes()); // Unicode full repertoire
    cmap.extend_from_slice(&12u32.to_be_bytes()); // subtable offset
    cmap.extend_from_slice(&12u16.to_be_bytes()); // format 12
    cmap.extend_from_slice(&0u16.to_be_bytes()); // reserved
    cmap.extend_from_slice(&28u32.to_be_bytes()); // subtable length
    cmap.extend_from_slice(&0u32.to_be_bytes()); // language
    cmap.extend_from_slice(&1u32.to_be_bytes()); // one group
    cmap.extend_from_slice(&32u32.to_be_bytes()); // start char
    cmap.extend_from_slice(&126u32.to_be_bytes()); // end char
    cmap.extend_from_slice(&1u32.to_be_bytes()); // start glyph

    // Table records must be sorted by tag
    let tables: [(&[u8; 4], Vec<u8>); 5] = [
        (b"cmap", cmap),
        (b"head", head),
        (b"hhea", hhea),
        (b"hmtx", hmtx),
        (b"maxp", maxp),
    ];

    let mut font = Vec::new();
    font.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    font.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    font.extend_from_slice(&64u16.to_be_bytes()); // search range
    font.extend_from_slice(&2u16.to_be_bytes()); // entry selector
    font.extend_from_slice(&16u16.to_be_bytes()); // range shift

    let mut offset = 12 + 16 * tables.len();
    let mut body = Vec::new();
    for (tag, data) in &tables {
        font.extend_from_slice(*tag);
        font.extend_from_slice(&0u32.to_be_bytes()); // checksum
        font.extend_from_slice(&(offset as u32).to_be_bytes());
        font.extend_from_slice(&(data.len() as u32).to_be_bytes());

        body.extend_from_slice(data);
        while body.len() % 4 != 0 {
            body.push(0);
        }
        offset = 12 + 16 * tables.len() + body.len();
    }
    font.extend_from_slice(&body);
    font
}

/// One page of a generated fixture
#[derive(Debug, Clone, Copy)]
pub struct PageSpec {
    pub media_box: [i64; 4],
    pub rotate: Option<i64>,
}

impl PageSpec {
    pub fn letter(rotate: i64) -> Self {
        Self {
            media_box: [0, 0, 612, 792],
            rotate: Some(rotate),
        }
    }
}

fn rect(values: [i64; 4]) -> Object {
    Object::Array(values.iter().map(|&v| Object::Integer(v)).collect())
}

/// Build a PDF whose pages share one Resources dictionary and each carry
/// a content stream saying "Page N".
pub fn build_pdf(pages: &[PageSpec]) -> Vec<u8> {
    build_pdf_with_parent_rotate(pages, None)
}

/// Like [`build_pdf`], with an optional `/Rotate` on the `/Pages` node
/// for pages to inherit.
pub fn build_pdf_with_parent_rotate(pages: &[PageSpec], parent_rotate: Option<i64>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for (i, spec) in pages.iter().enumerate() {
        let content = format!("BT /F1 12 Tf 72 720 Td (Page {}) Tj ET", i + 1);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => rect(spec.media_box),
            "Resources" => resources_id,
            "Contents" => content_id,
        };
        if let Some(rotate) = spec.rotate {
            page.set("Rotate", Object::Integer(rotate));
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let mut pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => Object::Array(kids),
        "Count" => pages.len() as i64,
    };
    if let Some(rotate) = parent_rotate {
        pages_dict.set("Rotate", Object::Integer(rotate));
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialize fixture PDF");
    bytes
}

/// One Letter page whose `/Contents` is an indirect reference to an array
/// holding one stream per entry of `chunks`.
pub fn build_pdf_with_indirect_contents(chunks: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let streams: Vec<Object> = chunks
        .iter()
        .map(|chunk| Object::Reference(doc.add_object(Stream::new(Dictionary::new(), chunk.as_bytes().to_vec()))))
        .collect();
    let contents_id = doc.add_object(Object::Array(streams));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => rect([0, 0, 612, 792]),
        "Resources" => Dictionary::new(),
        "Contents" => contents_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => Object::Array(vec![Object::Reference(page_id)]),
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialize fixture PDF");
    bytes
}

/// What was drawn on one output page by the watermark stream
#[derive(Debug)]
pub struct DrawnText {
    /// Operands of the `Tm` operator
    pub matrix: Vec<f32>,
    /// Decoded text of the `Tj` operator
    pub text: String,
    /// `ca` of the graphics state used
    pub opacity: Option<f32>,
}

/// Load an output PDF with all streams decompressed
pub fn load_output(bytes: &[u8]) -> Document {
    let mut doc = Document::load_mem(bytes).expect("Output is not a valid PDF");
    doc.decompress();
    doc
}

/// Page ids of a document in page order
pub fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Content streams of a page, in drawing order
pub fn page_streams(doc: &Document, page_id: ObjectId) -> Vec<String> {
    let page = doc.get_dictionary(page_id).expect("page dictionary");
    let refs = match page.get(b"Contents").expect("page contents") {
        Object::Array(arr) => arr.clone(),
        other => vec![other.clone()],
    };

    refs.iter()
        .map(|r| {
            let id = r.as_reference().expect("content reference");
            let stream = doc.get_object(id).and_then(Object::as_stream).expect("content stream");
            String::from_utf8_lossy(&stream.content).into_owned()
        })
        .collect()
}

/// Parse the watermark stream (the last content stream) of a page
pub fn drawn_text(doc: &Document, page_id: ObjectId) -> DrawnText {
    let streams = page_streams(doc, page_id);
    let last = streams.last().expect("page has content");

    let mut matrix = Vec::new();
    let mut text = String::new();
    let mut gs_name = None;

    for line in last.lines() {
        if let Some(ops) = line.strip_suffix(" Tm") {
            matrix = ops.split_whitespace().map(|v| v.parse().expect("number")).collect();
        } else if let Some(hex) = line.strip_suffix(" Tj") {
            let hex = hex.trim_start_matches('<').trim_end_matches('>');
            text = hex
                .as_bytes()
                .chunks(4)
                .map(|chunk| {
                    let gid = u16::from_str_radix(std::str::from_utf8(chunk).unwrap(), 16).unwrap();
                    char_for(gid)
                })
                .collect();
        } else if let Some(name) = line.strip_suffix(" gs") {
            gs_name = Some(name.trim_start_matches('/').to_string());
        }
    }

    let opacity = gs_name.and_then(|name| {
        let resources = page_resources(doc, page_id);
        let states = resources.get(b"ExtGState").ok()?.as_dict().ok()?;
        let id = states.get(name.as_bytes()).ok()?.as_reference().ok()?;
        let gs = doc.get_dictionary(id).ok()?;
        gs.get(b"ca").ok()?.as_float().ok()
    });

    DrawnText { matrix, text, opacity }
}

/// The page's resources dictionary, following a reference if needed
pub fn page_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let page = doc.get_dictionary(page_id).expect("page dictionary");
    match page.get(b"Resources") {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(id)) => doc.get_dictionary(*id).expect("resources").clone(),
        _ => Dictionary::new(),
    }
}

/// Integer or real value of a page attribute
pub fn page_number_attr(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<f32> {
    let page = doc.get_dictionary(page_id).ok()?;
    page.get(key).ok()?.as_float().ok()
}

/// MediaBox of a page as numbers
pub fn media_box(doc: &Document, page_id: ObjectId) -> Vec<f32> {
    let page = doc.get_dictionary(page_id).expect("page dictionary");
    page.get(b"MediaBox")
        .and_then(Object::as_array)
        .expect("MediaBox")
        .iter()
        .map(|v| v.as_float().expect("number"))
        .collect()
}
