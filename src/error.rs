//! Error types for the PDF watermark library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF watermark library
#[derive(Error, Debug)]
pub enum Error {
    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No usable font file was supplied or discovered
    #[error("cannot find font file (.ttf) in: {}", display_dirs(.searched))]
    FontNotFound { searched: Vec<PathBuf> },

    /// Font data could not be parsed or embedded
    #[error("Font error: {0}")]
    Font(String),

    /// Starting page number is not an integer
    #[error("Invalid start page number: {0:?}")]
    InvalidStartNumber(String),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Page dictionary is missing or malformed
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    /// General error
    #[error("{0}")]
    General(String),
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    if dirs.is_empty() {
        return "(no directories)".to_string();
    }
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
