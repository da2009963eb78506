use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{debug, trace};

use super::block::{group, groups, Block};

/// Sub-matches captured from a block's start line.
pub type Title = Vec<String>;

/// Blocks pulled out of a capture, plus the titles seen on their start lines.
///
/// `titles` is index-aligned with `blocks`. It is `None` when not a single
/// block carried a title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub blocks: Vec<Block>,
    pub titles: Option<Vec<Option<Title>>>,
}

impl Extraction {
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn title(&self, idx: usize) -> Option<&Title> {
        self.titles.as_ref()?.get(idx)?.as_ref()
    }

    /// Each block paired with its title, if any.
    pub fn iter(&self) -> impl Iterator<Item = (&Block, Option<&Title>)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b, self.title(i)))
    }

    /// Collapse a list of all-`None` titles down to a single `None`.
    pub(crate) fn collect(blocks: Vec<Block>, titles: Vec<Option<Title>>) -> Self {
        let titles = if titles.iter().all(Option::is_none) {
            None
        } else {
            Some(titles)
        };
        Self { blocks, titles }
    }
}

/// Decides where a block ends once its start line has matched.
///
/// Consulted every time a block opens. Returning `None` leaves the block open
/// until the end of input.
pub trait EndStrategy {
    fn end_pattern(&self, start: &Captures<'_>) -> Option<Regex>;
}

/// A fixed end pattern, the same for every block.
impl EndStrategy for Regex {
    fn end_pattern(&self, _start: &Captures<'_>) -> Option<Regex> {
        Some(self.clone())
    }
}

impl<F> EndStrategy for F
where
    F: Fn(&Captures<'_>) -> Option<Regex>,
{
    fn end_pattern(&self, start: &Captures<'_>) -> Option<Regex> {
        self(start)
    }
}

/// End a block at the next line that starts with the literal text of the
/// start pattern's first group, followed directly by a non-space character.
///
/// The first group is meant to hold the prefix shared by sibling start lines:
/// leading indentation for nested listings (`^(\s*)Physical interface`), or a
/// header stem for repeated tables (`^(Interfac)e\s+Status` ends at the next
/// `Interface...` line). An empty or missing first group degrades to `^\S`,
/// which ends the block at the next line that does not start with whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixEnd;

impl EndStrategy for PrefixEnd {
    fn end_pattern(&self, start: &Captures<'_>) -> Option<Regex> {
        let prefix = group(start, 1);
        let pattern = format!(r"^{}\S", regex::escape(&prefix));
        trace!(%pattern, "derived end pattern");
        Regex::new(&pattern).ok()
    }
}

impl Block {
    /// Pull out every block that opens on a `start` line and runs up to, but
    /// not including, the line matching the end pattern.
    ///
    /// Blank lines are skipped. A line that closes one block is re-tested as
    /// the start of the next. A block still open at end of input is kept.
    ///
    /// When the start pattern has more than one group, groups 2.. become the
    /// block's title.
    pub fn fetch_blocks<E>(&self, start: &Regex, end: &E) -> Extraction
    where
        E: EndStrategy + ?Sized,
    {
        let mut blocks = Vec::new();
        let mut titles = Vec::new();
        // Some(end) while inside a block; the inner None means "no end line".
        let mut open: Option<(Block, Option<Regex>)> = None;

        for line in self.lines().iter().filter(|l| !l.trim().is_empty()) {
            if let Some((block, end_re)) = open.as_mut() {
                let ends_here = end_re.as_ref().is_some_and(|re| re.is_match(line));
                if !ends_here {
                    block.push(line.as_str());
                    continue;
                }
                if let Some((block, _)) = open.take() {
                    blocks.push(block);
                }
            }

            if let Some(caps) = start.captures(line) {
                titles.push(if caps.len() > 2 { Some(groups(&caps, 2)) } else { None });
                let end_re = end.end_pattern(&caps);
                open = Some((Block::new(vec![line.clone()]), end_re));
            }
        }

        if let Some((block, _)) = open {
            blocks.push(block);
        }

        debug!(lines = self.len(), blocks = blocks.len(), "fetched blocks");
        Extraction::collect(blocks, titles)
    }

    /// [`Block::fetch_blocks`] with the end pattern derived by [`PrefixEnd`]
    /// unless one is given.
    pub fn fetch(&self, start: &Regex, end: Option<&Regex>) -> Extraction {
        match end {
            Some(end) => self.fetch_blocks(start, end),
            None => self.fetch_blocks(start, &PrefixEnd),
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn re(p: &str) -> Regex {
        Regex::new(p).unwrap()
    }

    fn interfaces() -> Block {
        Block::from(
            &[
                "Interface   Status   Protocol",
                "Gi0/1       up       up",
                "Gi0/2       down     down",
                "Interface   Status   Protocol",
                "Gi1/1       up       up",
            ][..],
        )
    }

    #[test]
    fn derived_end_splits_repeated_headers() {
        let ex = interfaces().fetch(&re(r"^(Interfac)e\s+Status"), None);
        assert_eq!(ex.len(), 2);
        assert_eq!(
            ex.blocks[0].lines(),
            [
                "Interface   Status   Protocol",
                "Gi0/1       up       up",
                "Gi0/2       down     down",
            ]
        );
        assert_eq!(
            ex.blocks[1].lines(),
            ["Interface   Status   Protocol", "Gi1/1       up       up"]
        );
        assert_eq!(ex.titles, None);
    }

    #[test]
    fn whole_word_group_never_ends_the_block() {
        // `^Interface\S` never matches `Interface   Status`
        let ex = interfaces().fetch(&re(r"^(Interface)"), None);
        assert_eq!(ex.len(), 1);
        assert_eq!(ex.blocks[0], interfaces());
    }

    #[test]
    fn end_pattern_follows_each_start_line() {
        let b = Block::from(&["a=1", "ax", "b=2", "ay", "bz"][..]);
        let ex = b.fetch(&re(r"^(\w)="), None);
        assert_eq!(ex.len(), 2);
        assert_eq!(ex.blocks[0].lines(), ["a=1"]);
        // ends at `^b\S`, not at the first block's `^a\S`
        assert_eq!(ex.blocks[1].lines(), ["b=2", "ay"]);
    }

    #[test]
    fn prefix_end_escapes_metacharacters() {
        let start = re(r"^(\*\[\d\])\s");
        let caps = start.captures("*[1] route").unwrap();
        let end = PrefixEnd.end_pattern(&caps).unwrap();
        assert!(end.is_match("*[1]x"));
        assert!(!end.is_match("*[1] next"));
        assert!(!end.is_match("a[1]x"));
    }

    #[test]
    fn prefix_end_without_group_matches_non_space_start() {
        let start = re(r"^table");
        let caps = start.captures("table one").unwrap();
        let end = PrefixEnd.end_pattern(&caps).unwrap();
        assert!(end.is_match("x"));
        assert!(!end.is_match("  indented"));
    }

    #[test]
    fn explicit_end_line_is_excluded() {
        let b = Block::from(&["BEGIN", "row 1", "END", "noise", "BEGIN", "row 2", "END"][..]);
        let ex = b.fetch(&re("^BEGIN"), Some(&re("^END")));
        assert_eq!(ex.len(), 2);
        assert_eq!(ex.blocks[0].lines(), ["BEGIN", "row 1"]);
        assert_eq!(ex.blocks[1].lines(), ["BEGIN", "row 2"]);
    }

    #[test]
    fn end_line_can_start_next_block() {
        let b = Block::from(&["== a", "1", "== b", "2"][..]);
        let ex = b.fetch(&re("^== "), Some(&re("^== ")));
        assert_eq!(ex.blocks[0].lines(), ["== a", "1"]);
        assert_eq!(ex.blocks[1].lines(), ["== b", "2"]);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let b = Block::from(&["BEGIN", "", "   ", "row", "END"][..]);
        let ex = b.fetch(&re("^BEGIN"), Some(&re("^END")));
        assert_eq!(ex.blocks[0].lines(), ["BEGIN", "row"]);
    }

    #[test]
    fn open_block_flushed_at_end_of_input() {
        let b = Block::from(&["BEGIN", "row", "more", ""][..]);
        let ex = b.fetch(&re("^BEGIN"), Some(&re("^END")));
        assert_eq!(ex.len(), 1);
        assert_eq!(ex.blocks[0].lines(), ["BEGIN", "row", "more"]);
    }

    #[test]
    fn block_opened_on_last_line_is_kept() {
        let b = Block::from(&["BEGIN 1", "END", "BEGIN 2"][..]);
        let ex = b.fetch(&re(r"^BEGIN (\d)( )?"), Some(&re("^END")));
        assert_eq!(ex.len(), 2);
        assert_eq!(ex.blocks[1].lines(), ["BEGIN 2"]);
    }

    #[test]
    fn titles_align_with_blocks() {
        let b = Block::from(
            &[
                "ge-0/0/0 Up Up",
                "  inet 10.0.0.1/30",
                "ge-0/0/1 Down Up",
                "  inet 10.0.0.5/30",
            ][..],
        );
        let start = re(r"^(\S+?)-\S+\s+(Up|Down)\s+(Up|Down)$");
        let ex = b.fetch(&start, None);
        assert_eq!(ex.len(), 2);
        assert_eq!(ex.title(0).unwrap(), &["Up", "Up"]);
        assert_eq!(ex.title(1).unwrap(), &["Down", "Up"]);
        let pairs: Vec<_> = ex.iter().map(|(b, t)| (b.len(), t.is_some())).collect();
        assert_eq!(pairs, vec![(2, true), (2, true)]);
    }

    #[test]
    fn titles_keep_none_entries_when_some_present() {
        let b = Block::from(&["A x", "1", "A", "2"][..]);
        let ex = b.fetch(&re(r"^(A)(?: (x))?"), Some(&re("^A")));
        let titles = ex.titles.unwrap();
        assert_eq!(titles.len(), 2);
        assert_eq!(titles[0], Some(vec!["x".to_string()]));
        assert_eq!(titles[1], Some(vec![String::new()]));
    }

    #[test]
    fn no_start_match_is_empty() {
        let ex = interfaces().fetch(&re("^Vlan"), None);
        assert!(ex.is_empty());
        assert_eq!(ex.titles, None);
    }

    fn closing_tag(caps: &Captures<'_>) -> Option<Regex> {
        Regex::new(&format!("^</{}>", &caps[1])).ok()
    }

    #[test]
    fn function_strategy_sees_start_captures() {
        let b = Block::from(&["<1>", "a", "</1>", "<2>", "b", "</2>"][..]);
        let ex = b.fetch_blocks(&re(r"^<(\d)>$"), &closing_tag);
        assert_eq!(ex.blocks[0].lines(), ["<1>", "a"]);
        assert_eq!(ex.blocks[1].lines(), ["<2>", "b"]);
    }

    #[test]
    fn blocks_are_independent_copies() {
        let src = interfaces();
        let ex = src.fetch(&re(r"^(Interfac)e\s+Status"), None);
        let mut first = ex.blocks[0].clone();
        first.push("extra");
        assert_eq!(ex.blocks[0].len(), 3);
        assert_eq!(src.len(), 5);
    }
}
