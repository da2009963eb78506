use regex::Regex;

use crate::error::{Error, Result};

/// Compile a caller-supplied pattern, keeping the source text in the error.
pub fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

pub fn compile_opt(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern.map(compile).transpose()
}
