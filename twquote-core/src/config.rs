//! Pipeline configuration.
//!
//! Everything a run needs is carried in one immutable `PipelineConfig`,
//! loaded from TOML or taken from the defaults (three large TWSE listings,
//! 2019–2024, written next to the working directory).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for the HTTP price provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Rescale OHLC by the split/dividend adjusted close.
    pub auto_adjust: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query2.finance.yahoo.com".into(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            auto_adjust: true,
        }
    }
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Bare instrument codes, fetched in this order.
    pub identifiers: Vec<String>,

    /// First day of the requested window.
    pub start: NaiveDate,

    /// Last day of the requested window, passed to the provider as-is.
    pub end: NaiveDate,

    /// Destination CSV.
    pub output: PathBuf,

    /// Appended to each identifier to form the provider key.
    pub market_suffix: String,

    pub provider: ProviderConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            identifiers: vec!["2330".into(), "2317".into(), "2454".into()],
            start: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            output: PathBuf::from("prices_fundamentals_taiwan.csv"),
            market_suffix: ".TW".into(),
            provider: ProviderConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a config from a TOML file. Keys not present take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Reject configs the pipeline cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identifiers.is_empty() {
            return Err(ConfigError::Invalid("identifiers must not be empty".into()));
        }
        if let Some(pos) = self.identifiers.iter().position(|id| id.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("identifier #{pos} is blank")));
        }
        if self.start > self.end {
            return Err(ConfigError::Invalid(format!(
                "start {} is after end {}",
                self.start, self.end
            )));
        }
        if self.output.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output path must not be empty".into()));
        }
        Ok(())
    }
}
