//! Dashboard configuration.
//!
//! The YAML file has a `dashboard` section and a list of `sources`:
//!
//! ```yaml
//! dashboard:
//!   title: Term Dashboard
//!   refresh_ui_seconds: 2.0
//! sources:
//!   - name: Top News
//!     type: rss
//!     refresh_seconds: 300
//!     options:
//!       url: https://news.ycombinator.com/rss
//! ```
//!
//! Option values written as `${NAME}` are replaced with the environment
//! variable `NAME` when it is set.  When no file is given, or the file does
//! not exist, [`default_config`] is used.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::ConfigError;
use crate::source::Options;

const DEFAULT_TITLE: &str = "Term Dashboard";
const DEFAULT_REFRESH_UI_SECONDS: f64 = 2.0;
const DEFAULT_REFRESH_SECONDS: i64 = 300;

/// Static configuration for one source.  Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    /// Display name; unique across the dashboard.
    pub name: String,
    /// Registry key selecting the source variant.
    pub kind: String,
    /// Always greater than zero.
    pub refresh_seconds: u64,
    pub options: Options,
}

impl SourceDescriptor {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_seconds)
    }

    #[cfg(test)]
    pub fn for_test(name: &str, kind: &str, options: Value) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            refresh_seconds: 60,
            options: Options::from_json(options),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub title: String,
    pub refresh_ui_seconds: f64,
    /// In display order.
    pub sources: Vec<SourceDescriptor>,
}

impl DashboardConfig {
    /// How often the presenter pulls a fresh snapshot.
    pub fn refresh_ui_interval(&self) -> Duration {
        Duration::from_secs_f64(self.refresh_ui_seconds)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    dashboard: Option<RawDashboard>,
    #[serde(default)]
    sources: Option<Vec<Option<RawSource>>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawDashboard {
    title: Option<String>,
    refresh_ui_seconds: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    refresh_seconds: Option<RawSeconds>,
    #[serde(default)]
    options: Option<Map<String, Value>>,
}

/// `refresh_seconds` as written: `60`, `60.0` or `"60"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSeconds {
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawSeconds {
    /// Whole seconds.  Fractions are truncated; unparsable text is `None`.
    fn whole_seconds(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Self::Float(_) => None,
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// The configuration used when no file is available.
pub fn default_config() -> DashboardConfig {
    let options = |value: Value| match value {
        Value::Object(map) => Options::new(map),
        _ => Options::default(),
    };
    DashboardConfig {
        title: DEFAULT_TITLE.to_string(),
        refresh_ui_seconds: 1.5,
        sources: vec![
            SourceDescriptor {
                name: "Local Weather".to_string(),
                kind: "open_meteo".to_string(),
                refresh_seconds: 300,
                options: options(serde_json::json!({
                    "latitude": 37.7749,
                    "longitude": -122.4194,
                    "timezone": "auto",
                })),
            },
            SourceDescriptor {
                name: "Top News".to_string(),
                kind: "rss".to_string(),
                refresh_seconds: 300,
                options: options(serde_json::json!({ "url": "https://news.ycombinator.com/rss" })),
            },
        ],
    }
}

/// Load the dashboard config from `path`, falling back to the defaults.
pub fn load_config(path: Option<&Path>) -> Result<DashboardConfig, ConfigError> {
    let Some(path) = path.filter(|p| p.exists()) else {
        info!("no config file found, using built-in defaults");
        return Ok(default_config());
    };

    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text, |name| std::env::var(name).ok())?;
    info!(path = %path.display(), sources = config.sources.len(), "loaded config");
    Ok(config)
}

/// Parse and validate YAML text.  `env` resolves `${NAME}` placeholders.
pub fn parse_config(text: &str, env: impl Fn(&str) -> Option<String>) -> Result<DashboardConfig, ConfigError> {
    let raw: RawConfig = if text.trim().is_empty() {
        RawConfig::default()
    } else {
        serde_yaml::from_str(text)?
    };

    let dashboard = raw.dashboard.unwrap_or_default();
    let refresh_ui_seconds = dashboard.refresh_ui_seconds.unwrap_or(DEFAULT_REFRESH_UI_SECONDS);
    if !(refresh_ui_seconds.is_finite() && refresh_ui_seconds > 0.0) {
        return Err(ConfigError::InvalidUiInterval(refresh_ui_seconds));
    }

    let mut seen = HashSet::new();
    let mut sources = Vec::new();
    for raw in raw.sources.unwrap_or_default().into_iter().flatten() {
        let kind = raw.kind.unwrap_or_else(|| "unknown".to_string());
        let name = raw.name.filter(|n| !n.is_empty()).unwrap_or_else(|| kind.clone());

        let refresh = match &raw.refresh_seconds {
            Some(seconds) => seconds.whole_seconds().unwrap_or(0),
            None => DEFAULT_REFRESH_SECONDS,
        };
        if refresh <= 0 {
            return Err(ConfigError::InvalidInterval { name });
        }
        if !seen.insert(name.clone()) {
            return Err(ConfigError::DuplicateName(name));
        }

        sources.push(SourceDescriptor {
            name,
            kind,
            refresh_seconds: refresh as u64,
            options: Options::new(resolve_options(raw.options.unwrap_or_default(), &env)),
        });
    }

    Ok(DashboardConfig {
        title: dashboard.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        refresh_ui_seconds,
        sources,
    })
}

/// Expand `${NAME}` in top-level string values.
fn resolve_options(options: Map<String, Value>, env: &impl Fn(&str) -> Option<String>) -> Map<String, Value> {
    options
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => (key, Value::String(expand_env(&s, env))),
            other => (key, other),
        })
        .collect()
}

fn expand_env(value: &str, env: &impl Fn(&str) -> Option<String>) -> String {
    value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .and_then(|name| env(name))
        .unwrap_or_else(|| value.to_string())
}
