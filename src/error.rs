//! Error types.
//!
//! Two families live here:
//!
//! * [`ConfigError`] — problems found while loading configuration and
//!   constructing sources.  These abort startup before any polling begins.
//! * [`SourceError`] — faults raised inside a single poll.  These never leave
//!   the source: [`SourceError::into_data_point`] turns them into an
//!   `error`-status [`DataPoint`] that the engine stores like any other result.

use std::path::PathBuf;

use thiserror::Error;

use crate::source::DataPoint;

/// Startup-fatal configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("source '{name}': refresh_seconds must be greater than zero")]
    InvalidInterval { name: String },

    #[error("dashboard refresh_ui_seconds must be greater than zero (got {0})")]
    InvalidUiInterval(f64),

    #[error("duplicate source name '{0}'")]
    DuplicateName(String),

    #[error("Unknown source type: {0}")]
    UnknownKind(String),
}

/// A fault raised while producing one poll's result.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Missing or invalid per-source option.  Repeats every cycle until the
    /// configuration changes.
    #[error("{message}")]
    Config { message: String, detail: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse error: {0}")]
    Feed(#[from] rss::Error),

    #[error("unexpected payload: {0}")]
    Payload(String),

    #[error("{0}")]
    Remote(String),
}

impl SourceError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            detail: String::new(),
        }
    }

    pub fn config_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            detail: detail.into(),
        }
    }

    /// Normalise the fault into the result shown on the dashboard.
    pub fn into_data_point(self, title: &str) -> DataPoint {
        match self {
            Self::Config { message, detail } => DataPoint::error(title, message).with_detail(detail),
            other => DataPoint::error(title, other.to_string()),
        }
    }
}
