use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use super::block::Block;

/// Stands in for elapsed-time tokens such as `3d04h22m` or `10:30:45`.
pub const DURATION_PLACEHOLDER: &str = "<DURATION>";
/// Stands in for spans hidden by a caller-supplied mask pattern.
pub const MASK_PLACEHOLDER: &str = "<MASKED>";

// 12h30m45s, 3w2d, 3d04h22m, 10:30:45
static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d{1,2}:\d{2}:\d{2}|(?:\d+[ywdhms])+)\b").unwrap()
});

impl Block {
    /// Trailing whitespace trimmed from every line, with runs of blank lines
    /// squeezed to one.
    pub fn normalize(&self) -> Block {
        let mut out = Vec::with_capacity(self.len());
        let mut last_empty = false;

        for line in self.lines() {
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                if last_empty {
                    continue;
                }
                last_empty = true;
            } else {
                last_empty = false;
            }
            out.push(trimmed.to_string());
        }

        Block::new(out)
    }

    /// Every span matching `pattern` replaced by the literal `replacement`.
    pub fn replace_all(&self, pattern: &Regex, replacement: &str) -> Block {
        self.lines()
            .iter()
            .map(|line| pattern.replace_all(line, NoExpand(replacement)).into_owned())
            .collect()
    }

    /// Uptime-style tokens swapped for [`DURATION_PLACEHOLDER`], so two
    /// captures taken at different times still line up.
    pub fn redact_durations(&self) -> Block {
        self.replace_all(&DURATION_RE, DURATION_PLACEHOLDER)
    }

    /// Render for diffing against another snapshot.
    ///
    /// Lines matching `drop` are removed, spans matching `mask` become
    /// [`MASK_PLACEHOLDER`], and the result is normalized.
    pub fn diff_format(&self, drop: Option<&Regex>, mask: Option<&Regex>) -> String {
        let kept = match drop {
            Some(re) => self.filter_out(re).1,
            None => self.clone(),
        };
        let masked = match mask {
            Some(re) => kept.replace_all(re, MASK_PLACEHOLDER),
            None => kept,
        };
        masked.normalize().render()
    }
}

// ── Tests ──
