use std::path::Path;

use crate::error::{Error, Result};
use crate::parser::Block;

/// Read a capture file into lines.
pub fn read(path: &Path) -> Result<Block> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Block::from_text(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fixture() {
        let b = read(Path::new("tests/fixtures/interfaces_before.txt")).unwrap();
        assert_eq!(b.lines()[0], "router1#show interfaces status");
        assert_eq!(b.len(), 10);
    }

    #[test]
    fn missing_file_names_path() {
        let err = read(Path::new("tests/fixtures/nope.txt")).unwrap_err();
        assert!(err.to_string().contains("tests/fixtures/nope.txt"));
    }
}
