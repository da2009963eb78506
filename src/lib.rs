//! Screen-scraping helpers for captured CLI output.
//!
//! A capture is split into lines ([`Block`]) and carved into sub-blocks by
//! start and end patterns. Blocks can then be queried with regexes, or tidied
//! up and diffed against a later capture of the same command.

pub mod capture;
pub mod config;
pub mod error;
pub mod parser;
pub mod pattern;
pub mod snapshot;
pub mod timefmt;

pub use error::{Error, Result};
pub use parser::{extract, Block, EndStrategy, Extraction, PrefixEnd, Scan, Title};
