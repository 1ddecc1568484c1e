//! Maps config `type` strings to source constructors.
//!
//! Construction is the only place an unknown kind is detected; it fails
//! startup rather than showing up as a per-poll error.

use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use super::{
    DataSource, EspnScoresSource, EspnSummarySource, F1ErgastSource, GmailUnreadSource, McpSource,
    OpenMeteoSource, RemoteClient, RssSource, RssTickerSource,
};
use crate::config::SourceDescriptor;
use crate::error::ConfigError;

/// Every `type` string the registry accepts.
pub const KINDS: &[&str] = &[
    "open_meteo",
    "rss",
    "rss_ticker",
    "espn_scores",
    "espn_summary",
    "f1_ergast",
    "gmail_unread",
    "mcp",
];

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Collaborators shared by every source.
#[derive(Clone)]
pub struct SourceContext {
    /// Pooled HTTP client.  Its timeout bounds each request; the engine
    /// itself imposes none.
    pub http: reqwest::Client,

    /// Injected remote-call client for `mcp` sources, when one is configured.
    pub remote: Option<Arc<dyn RemoteClient>>,
}

impl SourceContext {
    pub fn new(http: reqwest::Client, remote: Option<Arc<dyn RemoteClient>>) -> Self {
        Self { http, remote }
    }

    /// The HTTP client sources use by default.
    pub fn default_http_client() -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
    }
}

/// Instantiate the source variant named by `desc.kind`.
pub fn create_source(desc: SourceDescriptor, ctx: &SourceContext) -> Result<Box<dyn DataSource>, ConfigError> {
    let http = ctx.http.clone();
    let kind = desc.kind.clone();
    let source: Box<dyn DataSource> = match kind.as_str() {
        "open_meteo" => Box::new(OpenMeteoSource::new(desc, http)),
        "rss" => Box::new(RssSource::new(desc, http)),
        "rss_ticker" => Box::new(RssTickerSource::new(desc, http)),
        "espn_scores" => Box::new(EspnScoresSource::new(desc, http)),
        "espn_summary" => Box::new(EspnSummarySource::new(desc, http)),
        "f1_ergast" => Box::new(F1ErgastSource::new(desc, http)),
        "gmail_unread" => Box::new(GmailUnreadSource::new(desc, http)),
        "mcp" => Box::new(McpSource::new(desc, ctx.remote.clone())),
        other => {
            error!(source = %desc.name, kind = other, supported = ?KINDS, "unknown source type");
            return Err(ConfigError::UnknownKind(other.to_string()));
        }
    };
    Ok(source)
}

/// Build every configured source, failing on the first unknown kind.
pub fn build_sources(
    descs: &[SourceDescriptor],
    ctx: &SourceContext,
) -> Result<Vec<Box<dyn DataSource>>, ConfigError> {
    descs.iter().cloned().map(|desc| create_source(desc, ctx)).collect()
}
