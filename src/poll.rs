//! Background source polling.
//!
//! [`Aggregator::start`] spawns one task per source.  Each task loops
//! forever: poll the source, store the result in the shared
//! [`SnapshotStore`], then idle for the source's refresh interval.  The
//! interval is counted from the end of a poll, so a source's effective period
//! is its fetch time plus the interval.
//!
//! ```text
//!  ┌──────────┐ produce() ┌──────────────┐ read() ┌───────────┐
//!  │ source 1 │ ────────► │              │ ─────► │ presenter │
//!  │ source 2 │ ────────► │ SnapshotStore│        │ (own tick)│
//!  │   ...    │ ────────► │              │        └───────────┘
//!  └──────────┘           └──────────────┘
//! ```
//!
//! A source that fails, or even panics, only affects its own entry; the
//! other loops and the snapshot carry on.  [`Aggregator::shutdown`] cancels
//! every loop and waits for all of them to exit.  A poll still in flight at
//! that point is dropped without writing.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::join_all;
use futures_util::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::snapshot::{Snapshot, SnapshotStore};
use crate::source::{DataPoint, DataSource, Status};

/// Owns the polling tasks and the snapshot they feed.
pub struct Aggregator {
    store: Arc<SnapshotStore>,
    titles: Vec<String>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Aggregator {
    /// Seed a `loading` entry per source, then start polling.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(sources: Vec<Box<dyn DataSource>>) -> Self {
        let titles: Vec<String> = sources.iter().map(|s| s.name().to_string()).collect();
        let store = Arc::new(SnapshotStore::seeded(titles.iter().cloned()));
        let cancel = CancellationToken::new();

        let tasks = sources
            .into_iter()
            .map(|source| {
                tokio::spawn(run_source(source, Arc::clone(&store), cancel.child_token()))
            })
            .collect();

        info!(sources = titles.len(), "aggregator started");
        Self {
            store,
            titles,
            cancel,
            tasks,
        }
    }

    /// Consistent copy of every source's latest result.
    pub fn snapshot(&self) -> Snapshot {
        self.store.read()
    }

    /// Source names in configured order.
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Stop every polling loop and wait until all of them have exited.
    /// No snapshot writes happen after this returns.
    pub async fn shutdown(self) {
        info!("aggregator shutting down");
        self.cancel.cancel();
        for result in join_all(self.tasks).await {
            if let Err(e) = result {
                warn!(error = %e, "polling task ended abnormally");
            }
        }
        info!("aggregator stopped");
    }
}

async fn run_source(mut source: Box<dyn DataSource>, store: Arc<SnapshotStore>, cancel: CancellationToken) {
    let name = source.name().to_string();
    let interval = source.refresh_interval();
    debug!(source = %name, ?interval, "polling loop started");

    loop {
        let point = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            point = poll_once(source.as_mut(), &name) => point,
        };

        match point.status {
            Status::Error => warn!(source = %name, value = %point.value, "poll failed"),
            status => debug!(source = %name, %status, "poll complete"),
        }
        store.write(&name, point);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!(source = %name, "polling loop stopped");
}

/// One poll.  A panic inside the source becomes an error result.
async fn poll_once(source: &mut dyn DataSource, name: &str) -> DataPoint {
    match AssertUnwindSafe(source.produce()).catch_unwind().await {
        Ok(point) => point,
        Err(panic) => DataPoint::error(name, format!("source panicked: {}", panic_message(&*panic))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
