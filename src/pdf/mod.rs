//! PDF document engine built on lopdf

pub mod content;
pub mod font;
pub mod output;
pub mod source;

// Re-export commonly used items
pub use content::TextPlacement;
pub use font::FontHandle;
pub use output::{CopiedPage, DrawTextOptions, OutputDocument};
pub use source::{SourceDocument, SourcePage};
