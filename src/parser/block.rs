use std::fmt;

use regex::{Captures, Regex};
use serde::Serialize;

/// An ordered run of text lines, usually captured command output.
///
/// A `Block` always owns its lines. Every operation that extracts or rewrites
/// lines hands back a new `Block`, so the source is never aliased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Block {
    lines: Vec<String>,
}

impl Block {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Split raw text on `\n`, dropping a trailing `\r` from each line.
    pub fn from_text(text: &str) -> Self {
        text.lines().collect()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.lines.iter()
    }

    // ── Match operations ──

    /// Capture groups of every matching line, in line order.
    ///
    /// Groups that did not participate in a match come back as `""`, so the
    /// inner vectors always have one entry per capture group. Returns `None`
    /// when no line matches.
    pub fn match_lines(&self, pattern: &Regex) -> Option<Vec<Vec<String>>> {
        let rows: Vec<Vec<String>> = self
            .lines
            .iter()
            .filter_map(|line| pattern.captures(line))
            .map(|caps| groups(&caps, 1))
            .collect();
        if rows.is_empty() {
            None
        } else {
            Some(rows)
        }
    }

    /// First capture group of the first matching line.
    pub fn match_one(&self, pattern: &Regex) -> Option<String> {
        let caps = self.lines.iter().find_map(|line| pattern.captures(line))?;
        Some(group(&caps, 1))
    }

    /// First capture group of each matching line.
    pub fn match_column(&self, pattern: &Regex) -> Option<Vec<String>> {
        let column: Vec<String> = self
            .lines
            .iter()
            .filter_map(|line| pattern.captures(line))
            .map(|caps| group(&caps, 1))
            .collect();
        if column.is_empty() {
            None
        } else {
            Some(column)
        }
    }

    /// Drop every line matching `pattern`.
    ///
    /// The flag is `true` when at least one line was removed.
    pub fn filter_out(&self, pattern: &Regex) -> (bool, Block) {
        let (removed, kept): (Vec<&String>, Vec<&String>) =
            self.lines.iter().partition(|line| pattern.is_match(line));
        (!removed.is_empty(), kept.into_iter().cloned().collect())
    }

    /// Lines joined back together, each followed by a newline.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

/// Capture groups from `from` onwards, non-participating groups as `""`.
pub(crate) fn groups(caps: &Captures<'_>, from: usize) -> Vec<String> {
    (from..caps.len()).map(|i| group(caps, i)).collect()
}

pub(crate) fn group(caps: &Captures<'_>, i: usize) -> String {
    caps.get(i).map(|m| m.as_str().to_string()).unwrap_or_default()
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl From<Vec<String>> for Block {
    fn from(lines: Vec<String>) -> Self {
        Self::new(lines)
    }
}

impl From<&[&str]> for Block {
    fn from(lines: &[&str]) -> Self {
        lines.iter().copied().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for Block {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl IntoIterator for Block {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.into_iter()
    }
}

impl<'a> IntoIterator for &'a Block {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

// ── Tests ──
