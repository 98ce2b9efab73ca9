#![forbid(unsafe_code)]

//! Data-only history settings.
//!
//! The closures in [`TemporalOptions`](crate::TemporalOptions) cannot come
//! from a file, but the limit and initial tracking flag can. With the
//! `config` feature (on by default) a [`HistoryConfig`] loads from TOML or
//! JSON:
//!
//! ```toml
//! # rewind.toml
//! limit = 100
//! tracking = true
//! ```
//!
//! ```rust,ignore
//! let config = HistoryConfig::from_toml_file("rewind.toml")?;
//! let options = TemporalOptions::new().with_config(&config);
//! ```
//!
//! Missing keys fall back to [`HistoryConfig::default`].

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Limit and initial tracking flag for a temporal store.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct HistoryConfig {
    /// Maximum entries per stack. `None` is unbounded; `Some(0)` disables
    /// history.
    pub limit: Option<usize>,
    /// Whether recording starts enabled.
    pub tracking: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: None,
            tracking: true,
        }
    }
}

impl HistoryConfig {
    /// Bounded history, tracking on.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Serialize to a single JSON line.
    #[cfg(feature = "config")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Errors that can occur when loading a history configuration.
#[cfg(feature = "config")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON parse or encode error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
