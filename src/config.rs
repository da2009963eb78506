use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG: &str = "tbp";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub format: OutputFormat,
    /// Unchanged lines shown around each diff hunk.
    pub diff_context: usize,
    /// Swap uptime-style tokens for a placeholder before diffing.
    pub redact: bool,
    pub progress: bool,
}

impl Settings {
    /// Defaults, then the config file, then `TBP_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let builder = Config::builder()
            .set_default("format", "text")?
            .set_default("diff_context", 3)?
            .set_default("redact", true)?
            .set_default("progress", true)?;

        let builder = match path {
            Some(p) => builder.add_source(File::from(p).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG).required(false)),
        };

        let settings = builder
            .add_source(Environment::with_prefix("TBP").try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}
