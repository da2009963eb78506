use regex::Regex;
use tracing::debug;

use super::block::{groups, Block};
use super::fetch::{Extraction, Title};

impl Block {
    /// Partition at every line matching `start`; each such line opens a new
    /// block.
    ///
    /// Leading lines before the first start line are dropped. Each block's
    /// title is the full set of capture groups from its start line.
    pub fn cut(&self, start: &Regex) -> Extraction {
        let mut segments: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for line in self.lines() {
            if start.is_match(line) {
                segments.push(std::mem::take(&mut current));
            }
            current.push(line.clone());
        }
        segments.push(current);

        let ex = keep_started(segments, start);
        debug!(lines = self.len(), blocks = ex.len(), "cut blocks");
        ex
    }

    /// Partition after every line matching `end` (the end line stays in its
    /// block), then keep only the segments holding a `start` line.
    ///
    /// A trailing segment with no end line is still considered.
    pub fn segment(&self, start: &Regex, end: &Regex) -> Extraction {
        let mut segments: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for line in self.lines() {
            current.push(line.clone());
            if end.is_match(line) {
                segments.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }

        let ex = keep_started(segments, start);
        debug!(lines = self.len(), blocks = ex.len(), "segmented blocks");
        ex
    }
}

/// Keep segments with at least one `start` line; that line supplies the title.
fn keep_started(segments: Vec<Vec<String>>, start: &Regex) -> Extraction {
    let mut blocks = Vec::new();
    let mut titles: Vec<Option<Title>> = Vec::new();

    for seg in segments {
        let title = seg
            .iter()
            .find_map(|line| start.captures(line))
            .map(|caps| groups(&caps, 1));
        if let Some(title) = title {
            titles.push(Some(title));
            blocks.push(Block::new(seg));
        }
    }

    Extraction {
        blocks,
        titles: Some(titles),
    }
}

// ── Tests ──
