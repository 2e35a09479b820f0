//! Watermark stamping: per-page overlay and whole-document assembly

use std::path::{Path, PathBuf};
use tracing::{debug, info};
use crate::error::{Error, Result};
use crate::fonts::FontSource;
use crate::geometry::{self, TextPosition};
use crate::pdf::{CopiedPage, DrawTextOptions, FontHandle, OutputDocument, SourceDocument, SourcePage, TextPlacement};
use crate::text::{self, DEFAULT_REPEAT};

/// Font size of the watermark text, also used as the edge margin
pub const DEFAULT_FONT_SIZE: f32 = 9.0;

/// Fill opacity of the watermark text
pub const DEFAULT_OPACITY: f32 = 0.4;

/// Suffix added to the input file stem for the output file
pub const OUTPUT_SUFFIX: &str = "_watermarked";

/// Options for stamping a watermark onto a document
#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    /// Watermark text; blank means "use the input file name"
    pub label: String,
    /// Page number printed on the first page when `numbered` is set
    pub start_number: i64,
    /// Append `(p.NNN)` to the label
    pub numbered: bool,
    /// Text size in points
    pub font_size: f32,
    /// Fill opacity, 0.0 to 1.0
    pub opacity: f32,
    /// How many times the label is repeated on each page
    pub repeat: usize,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            label: String::new(),
            start_number: 1,
            numbered: false,
            font_size: DEFAULT_FONT_SIZE,
            opacity: DEFAULT_OPACITY,
            repeat: DEFAULT_REPEAT,
        }
    }
}

/// Result of stamping a document in memory
#[derive(Debug, Clone)]
pub struct StampedDocument {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Result of stamping a file on disk
#[derive(Debug, Clone)]
pub struct WatermarkReport {
    pub output_path: PathBuf,
    pub page_count: usize,
}

/// Parse a starting page number given on the command line
pub fn parse_start_number(value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidStartNumber(value.to_string()))
}

/// Add one copied page to the output and draw its watermark.
///
/// Placement is resolved from the source page's geometry; the copy carries
/// the same size and rotation.
pub fn apply_overlay(
    output: &mut OutputDocument,
    page: CopiedPage,
    source_page: &SourcePage,
    index: usize,
    label: &str,
    options: &WatermarkOptions,
    font: FontHandle,
) -> Result<()> {
    let added = output.add_page(page)?;

    let position = geometry::resolve(&source_page.geometry, options.font_size);
    let page_number = options.start_number + index as i64;
    let watermark = text::build_watermark(label, options.numbered, page_number, options.repeat);

    debug!(
        page = index + 1,
        quadrant = source_page.geometry.quadrant().degrees(),
        x = position.x,
        y = position.y,
        rotation = position.rotation,
        "drawing watermark"
    );

    output.draw_text(added, &watermark, &draw_options(&position, options, font))
}

fn draw_options(position: &TextPosition, options: &WatermarkOptions, font: FontHandle) -> DrawTextOptions {
    DrawTextOptions {
        font,
        placement: TextPlacement {
            x: position.x,
            y: position.y,
            rotation: position.rotation,
            size: options.font_size,
        },
        opacity: options.opacity,
    }
}

/// Stamp every page of a PDF held in memory.
///
/// `input_name` is the input's path or file name; its base name is the
/// label when `options.label` is blank. Fails with [`Error::FontNotFound`]
/// before touching the document when no font is given.
pub fn stamp_document(
    input: &[u8],
    input_name: &str,
    options: &WatermarkOptions,
    font: Option<&FontSource>,
) -> Result<StampedDocument> {
    let font = font.ok_or(Error::FontNotFound { searched: Vec::new() })?;

    let source = SourceDocument::load(input)?;
    let mut output = OutputDocument::create();

    let indices = source.page_indices();
    let copies = output.copy_pages(&source, &indices)?;

    let label = text::resolve_label(&options.label, input_name);
    let font = output.embed_font(font)?;

    for (index, copy) in indices.iter().zip(copies) {
        let source_page = source.page(*index)?;
        apply_overlay(&mut output, copy, &source_page, *index, &label, options, font)?;
    }

    let page_count = output.page_count();
    let bytes = output.save()?;

    info!(pages = page_count, bytes = bytes.len(), label = %label, "stamped document");
    Ok(StampedDocument { bytes, page_count })
}

/// Output path for an input: `<stem>_watermarked.<ext>` next to the input,
/// with `pdf` as the extension when the input has none.
pub fn watermarked_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pdf".to_string());

    input.with_file_name(format!("{}{}.{}", stem, OUTPUT_SUFFIX, extension))
}

/// Stamp a PDF file and write the result next to it.
///
/// The font precondition is checked before the input is read, so a missing
/// font leaves no output behind.
pub fn watermark_file(input_path: &Path, options: &WatermarkOptions, font: Option<&FontSource>) -> Result<WatermarkReport> {
    if font.is_none() {
        return Err(Error::FontNotFound { searched: Vec::new() });
    }
    if !input_path.is_file() {
        return Err(Error::FileNotFound(input_path.to_path_buf()));
    }

    let input = std::fs::read(input_path)?;
    let input_name = input_path.to_string_lossy();
    let stamped = stamp_document(&input, &input_name, options, font)?;

    let output_path = watermarked_path(input_path);
    std::fs::write(&output_path, &stamped.bytes)?;

    info!(output = %output_path.display(), pages = stamped.page_count, "wrote watermarked PDF");
    Ok(WatermarkReport {
        output_path,
        page_count: stamped.page_count,
    })
}
