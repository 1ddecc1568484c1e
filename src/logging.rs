//! Log setup.
//!
//! The TUI owns stdout, so all tracing output goes to a plain file instead.
//! `RUST_LOG` overrides the default `info` level.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILE: &str = "termdash.log";

/// Route tracing output to `path` (or [`DEFAULT_LOG_FILE`]).
///
/// The returned guard flushes buffered lines when dropped; keep it alive
/// until the process exits.
pub fn init(path: Option<&Path>) -> anyhow::Result<WorkerGuard> {
    let (dir, file) = split_path(path.unwrap_or_else(|| Path::new(DEFAULT_LOG_FILE)));
    let file_appender = tracing_appender::rolling::never(dir, file);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;

    Ok(guard)
}

/// Directory and file-name halves of a log path.  A bare file name lives in
/// the working directory.
fn split_path(path: &Path) -> (PathBuf, PathBuf) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file = path
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    (dir, file)
}
