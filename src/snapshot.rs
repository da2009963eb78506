//! Line diffs between two renderings of the same capture.
//!
//! Feed it the output of [`Block::diff_format`](crate::Block::diff_format)
//! for the "before" and "after" captures.

use similar::{ChangeTag, TextDiff};

pub struct SnapshotDiff<'a> {
    before: &'a str,
    after: &'a str,
    inserted: usize,
    deleted: usize,
    ratio: f32,
}

pub fn diff<'a>(before: &'a str, after: &'a str) -> SnapshotDiff<'a> {
    let lines = TextDiff::from_lines(before, after);
    let count = |tag: ChangeTag| {
        lines
            .iter_all_changes()
            .filter(|change| change.tag() == tag)
            .count()
    };
    SnapshotDiff {
        before,
        after,
        inserted: count(ChangeTag::Insert),
        deleted: count(ChangeTag::Delete),
        ratio: lines.ratio(),
    }
}

impl SnapshotDiff<'_> {
    pub fn has_changes(&self) -> bool {
        self.inserted + self.deleted > 0
    }

    /// Lines present only in "after".
    pub fn inserted(&self) -> usize {
        self.inserted
    }

    /// Lines present only in "before".
    pub fn deleted(&self) -> usize {
        self.deleted
    }

    /// Similarity between 0.0 and 1.0.
    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Unified diff text with `context` unchanged lines around each hunk.
    /// Empty when nothing changed.
    pub fn unified(&self, context: usize) -> String {
        if !self.has_changes() {
            return String::new();
        }
        let lines = TextDiff::from_lines(self.before, self.after);
        let text = lines
            .unified_diff()
            .context_radius(context)
            .header("before", "after")
            .to_string();
        text
    }
}
