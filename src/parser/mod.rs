pub mod block;
pub mod fetch;
pub mod split;
pub mod tidy;

use regex::Regex;

pub use block::Block;
pub use fetch::{EndStrategy, Extraction, PrefixEnd, Title};
pub use tidy::{DURATION_PLACEHOLDER, MASK_PLACEHOLDER};

/// How a capture is carved into blocks.
#[derive(Debug, Clone, Copy)]
pub enum Scan<'a> {
    /// Start line up to (not including) the end line; see [`Block::fetch`].
    Fetch {
        start: &'a Regex,
        end: Option<&'a Regex>,
    },
    /// A new block at every start line; see [`Block::cut`].
    Cut { start: &'a Regex },
    /// Blocks closed by end lines, kept if they hold a start line; see
    /// [`Block::segment`].
    Segment { start: &'a Regex, end: &'a Regex },
}

impl Block {
    pub fn scan(&self, scan: Scan<'_>) -> Extraction {
        match scan {
            Scan::Fetch { start, end } => self.fetch(start, end),
            Scan::Cut { start } => self.cut(start),
            Scan::Segment { start, end } => self.segment(start, end),
        }
    }
}

/// Two-pass pipeline: raw text → lines → blocks.
pub fn extract(text: &str, scan: Scan<'_>) -> Extraction {
    Block::from_text(text).scan(scan)
}
