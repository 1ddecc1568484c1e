//! Data source abstraction layer.
//!
//! This module defines the [`DataSource`] trait, the [`DataPoint`] every poll
//! produces, and the concrete source kinds.  [`registry`] maps the `type`
//! strings used in the config file to constructors.
//!
//! ## For contributors — adding a new source
//!
//! 1. Create a new file in this directory (e.g. `stocks.rs`).
//! 2. Define a struct holding its [`SourceDescriptor`](crate::config::SourceDescriptor)
//!    plus whatever clients or private state it needs, and implement
//!    [`DataSource`] for it.
//! 3. Add `mod stocks;` below and re-export your struct.
//! 4. Add a `type` string for it in [`registry::create_source`].
//!
//! The polling engine, snapshot and UI are all source-agnostic.

mod data_point;
mod espn;
mod f1;
mod feed_item;
mod filter;
mod gmail;
mod options;
pub mod registry;
mod remote;
mod rss;
mod ticker;
mod weather;

pub use data_point::{DataPoint, Status};
pub use espn::{EspnScoresSource, EspnSummarySource};
pub use f1::F1ErgastSource;
pub use feed_item::FeedItem;
pub use filter::FeedFilter;
pub use gmail::GmailUnreadSource;
pub use options::Options;
pub use registry::{build_sources, SourceContext};
pub use remote::{McpSource, RemoteClient};
pub use rss::RssSource;
pub use ticker::RssTickerSource;
pub use weather::OpenMeteoSource;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SourceError;

/// Trait that every data source must implement.
///
/// The engine owns each source exclusively and drives it from a single task,
/// so [`fetch()`](DataSource::fetch) takes `&mut self`: a source may keep
/// private state between polls and never sees two polls at once.
#[async_trait]
pub trait DataSource: Send {
    /// Display name; also the source's key in the snapshot.
    fn name(&self) -> &str;

    /// Idle time between the end of one poll and the start of the next.
    fn refresh_interval(&self) -> Duration;

    /// Attempt one poll.
    ///
    /// Empty-but-valid responses should come back as `Ok` with a
    /// [`Status::Warn`] point; `Err` is for configuration problems and
    /// failed fetches.
    async fn fetch(&mut self) -> Result<DataPoint, SourceError>;

    /// Run one poll and always come back with exactly one [`DataPoint`].
    async fn produce(&mut self) -> DataPoint {
        match self.fetch().await {
            Ok(point) => point,
            Err(e) => e.into_data_point(self.name()),
        }
    }
}
