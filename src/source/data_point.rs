//! The normalised result of a single poll.
//!
//! Every source variant converts whatever it fetched (or failed to fetch)
//! into exactly one [`DataPoint`] per poll, so the engine and the presenter
//! never need to know which provider produced it.

use std::fmt;

use chrono::{DateTime, Utc};

/// Placeholder text shown for a source whose first poll has not finished.
pub const LOADING_TEXT: &str = "Loading...";

/// Classification of a result, used for colouring tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    /// Well-formed response with nothing actionable in it.
    Warn,
    /// Configuration problem or failed fetch.
    Error,
    /// No poll has completed yet.
    Loading,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ok => "ok",
            Status::Warn => "warn",
            Status::Error => "error",
            Status::Loading => "loading",
        };
        f.write_str(s)
    }
}

/// One source's latest output.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    /// Mirrors the owning source's display name.
    pub title: String,

    /// Primary rendered text; may span several lines.
    pub value: String,

    pub status: Status,

    /// Secondary text.  Empty means absent.
    pub detail: String,

    /// When this result was produced.
    pub updated_at: DateTime<Utc>,
}

impl DataPoint {
    pub fn new(title: impl Into<String>, value: impl Into<String>, status: Status) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            status,
            detail: String::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn ok(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(title, value, Status::Ok)
    }

    pub fn warn(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(title, value, Status::Warn)
    }

    pub fn error(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(title, value, Status::Error)
    }

    /// The synthetic entry a source holds until its first poll completes.
    pub fn loading(title: impl Into<String>) -> Self {
        Self::new(title, LOADING_TEXT, Status::Loading)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn has_detail(&self) -> bool {
        !self.detail.is_empty()
    }
}
