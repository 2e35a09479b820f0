//! Watermark string construction

use std::path::Path;

/// How many times the label is repeated to run across the page
pub const DEFAULT_REPEAT: usize = 100;

/// Separator between repetitions of the label
const SEPARATOR: &str = "  ";

/// Format one repetition of the watermark.
///
/// Numbered labels get a `(p.NNN)` suffix with the page number zero-padded
/// to three digits; wider numbers are printed in full.
pub fn watermark_label(label: &str, numbered: bool, page_number: i64) -> String {
    if numbered {
        format!("{}(p.{:03}){}", label, page_number, SEPARATOR)
    } else {
        format!("{}{}", label, SEPARATOR)
    }
}

/// Repeat a label `count` times. The result is not fitted to the page;
/// text running past the page edge is expected.
pub fn tile(label: &str, count: usize) -> String {
    label.repeat(count)
}

/// Build the full string drawn on one page
pub fn build_watermark(label: &str, numbered: bool, page_number: i64, repeat: usize) -> String {
    tile(&watermark_label(label, numbered, page_number), repeat)
}

/// Pick the label for a run: the given text, or the input's file name when
/// the text is blank.
pub fn resolve_label(text: &str, input_name: &str) -> String {
    if !text.trim().is_empty() {
        return text.to_string();
    }

    Path::new(input_name)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input_name.to_string())
}
