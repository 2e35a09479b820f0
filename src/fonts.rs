//! Font file discovery
//!
//! The watermark font is whatever TrueType file sits next to the tool: the
//! first `*.ttf` found in the search directories is used.

use std::path::{Path, PathBuf};
use glob::{glob, Pattern};
use tracing::debug;
use crate::error::{Error, Result};

/// Extension a font file must have to be picked up by discovery
pub const FONT_EXTENSION: &str = "ttf";

/// Raw font data plus a name used for the embedded font's `/BaseFont`
#[derive(Debug, Clone)]
pub struct FontSource {
    /// File stem of the font file
    pub name: String,
    /// TrueType bytes
    pub data: Vec<u8>,
}

impl FontSource {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Read a font file from disk
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }

        let data = std::fs::read(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self { name, data })
    }
}

/// Default search directories: the working directory, then the directory of
/// the running executable.
pub fn default_search_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![PathBuf::from(".")];

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs
}

/// Find the first `*.ttf` file in `dir`, by file name order.
pub fn find_font_in(dir: &Path) -> Result<Option<PathBuf>> {
    let pattern = format!(
        "{}/*.{}",
        Pattern::escape(&dir.to_string_lossy()),
        FONT_EXTENSION
    );

    let pattern_iter = glob(&pattern)
        .map_err(|e| Error::General(format!("Invalid font search pattern {}: {}", pattern, e)))?;

    let mut matches: Vec<PathBuf> = pattern_iter
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    matches.sort();

    Ok(matches.into_iter().next())
}

/// Search each directory in turn and return the first font found.
pub fn discover_font(dirs: &[PathBuf]) -> Result<PathBuf> {
    for dir in dirs {
        debug!(dir = %dir.display(), "searching for font");
        if let Some(path) = find_font_in(dir)? {
            return Ok(path);
        }
    }

    Err(Error::FontNotFound {
        searched: dirs.to_vec(),
    })
}
