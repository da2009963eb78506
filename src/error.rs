use std::path::PathBuf;

use thiserror::Error;

/// Failures outside the parser itself: bad caller input, unreadable files and
/// broken configuration. A pattern that simply matches nothing is not an
/// error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
