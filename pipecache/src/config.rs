//! Engine configuration.
//!
//! Configuration is plain serde data with defaults for every field, so an
//! empty JSON object is a valid configuration.

use crate::coherence::StepTypeSearchLookup;
use crate::errors::PipecacheError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Plain,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// Whether to include the event target.
    #[serde(default = "default_with_target")]
    pub with_target: bool,
}

fn default_filter() -> String {
    "info".to_string()
}

fn default_with_target() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: LogFormat::default(),
            with_target: default_with_target(),
        }
    }
}

impl LoggingConfig {
    /// Sets the filter directives.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// AutoML search flag to step type table.
    #[serde(default)]
    pub search_lookup: StepTypeSearchLookup,
    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search lookup table.
    #[must_use]
    pub fn with_search_lookup(mut self, lookup: StepTypeSearchLookup) -> Self {
        self.search_lookup = lookup;
        self
    }

    /// Sets the logging configuration.
    #[must_use]
    pub fn with_logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, PipecacheError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PipecacheError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Checks invariants serde cannot express.
    pub fn validate(&self) -> Result<(), PipecacheError> {
        if self.logging.filter.trim().is_empty() {
            return Err(PipecacheError::Config(
                "logging.filter must not be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for entry in self.search_lookup.entries() {
            if !seen.insert(entry.param_name.as_str()) {
                return Err(PipecacheError::Config(format!(
                    "duplicate search lookup parameter '{}'",
                    entry.param_name
                )));
            }
        }
        Ok(())
    }
}
