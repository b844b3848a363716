//! Config file loading.

use std::path::Path;

use anyhow::{Context, Result};
use dynafactor::PipelineConfig;
use serde::{Deserialize, Serialize};

/// Log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub(crate) level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Contents of a `--config` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct CliConfig {
    /// Log settings.
    pub(crate) logging: LoggingConfig,
    /// Stage parameters.
    #[serde(flatten)]
    pub(crate) pipeline: PipelineConfig,
}

impl CliConfig {
    /// Parse a TOML document; absent keys keep their defaults.
    pub(crate) fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid config file")
    }

    /// Load the file at `path`, or the defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}
