//! PDF Watermark Library
//!
//! Stamps a repeating text watermark along the edge of every page of a PDF.
//! This library provides functionality to:
//! - Place the watermark so it reads upright whatever the page's `/Rotate`
//! - Build numbered or plain watermark strings
//! - Copy pages into a new document and draw on top of them
//! - Embed a TrueType font for the watermark text
//! - Discover the font file next to the tool
//!
//! # Example
//!
//! ```no_run
//! use pdf_watermark::fonts::FontSource;
//! use pdf_watermark::watermark::{watermark_file, WatermarkOptions};
//! use std::path::Path;
//!
//! let font = FontSource::load(Path::new("DejaVuSans.ttf")).expect("Failed to read font");
//! let options = WatermarkOptions {
//!     label: "CONFIDENTIAL".to_string(),
//!     numbered: true,
//!     ..Default::default()
//! };
//!
//! let report = watermark_file(Path::new("report.pdf"), &options, Some(&font))
//!     .expect("Failed to stamp PDF");
//! println!("{} pages -> {}", report.page_count, report.output_path.display());
//! ```

pub mod error;
pub mod fonts;
pub mod geometry;
pub mod pdf;
pub mod text;
pub mod watermark;

// Re-export commonly used items
pub use error::{Error, Result};
pub use geometry::{resolve, PageGeometry, Quadrant, TextPosition};
pub use watermark::{stamp_document, watermark_file, StampedDocument, WatermarkOptions, WatermarkReport};
