//! Rotating headline ticker.
//!
//! Each poll fetches every configured feed, merges the entries in URL order,
//! runs them through [`FeedFilter`], caps the list at `max_items`, and then
//! shows `lines` consecutive entries starting at a rotation cursor.  The
//! cursor advances by `lines` every poll and wraps around the list, so a
//! short refresh interval turns a static feed into a scrolling ticker.
//!
//! The cursor only survives while the filtered list is unchanged.  Any
//! difference (new story, blocked source, reorder) restarts at the top so
//! the cursor never points into a list it was not computed against.

use async_trait::async_trait;
use futures_util::future::join_all;
use std::time::Duration;
use tracing::debug;

use super::rss::{fetch_feed, resolve_urls};
use super::{DataPoint, DataSource, FeedFilter, FeedItem, Options};
use crate::config::SourceDescriptor;
use crate::error::SourceError;

const DEFAULT_MAX_ITEMS: usize = 20;

/// Private rotation state carried between polls.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickerState {
    items: Vec<FeedItem>,
    cursor: usize,
}

impl TickerState {
    #[cfg(test)]
    pub fn items(&self) -> &[FeedItem] {
        &self.items
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Take `lines` entries from `filtered` starting at the cursor, wrapping
    /// as needed, and move the cursor past them.
    ///
    /// `filtered` must be non-empty.  A list that differs from the previous
    /// poll's resets the cursor to zero before selection.
    pub fn advance(&mut self, filtered: Vec<FeedItem>, lines: usize) -> Vec<FeedItem> {
        if filtered != self.items {
            self.items = filtered;
            self.cursor = 0;
        }

        let len = self.items.len();
        if len == 0 {
            return Vec::new();
        }
        let lines = lines.max(1);
        let start = self.cursor % len;
        let selected = (0..lines)
            .map(|i| self.items[(start + i) % len].clone())
            .collect();
        self.cursor = (start + lines) % len;
        selected
    }
}

/// Display settings read from options.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerSettings {
    pub max_items: usize,
    pub lines: usize,
    pub show_source: bool,
}

impl TickerSettings {
    pub fn from_options(options: &Options) -> Self {
        Self {
            max_items: options.usize_or("max_items", DEFAULT_MAX_ITEMS),
            lines: options.usize_or("lines", 1).max(1),
            show_source: options.bool_or("show_source", false),
        }
    }
}

pub struct RssTickerSource {
    desc: SourceDescriptor,
    http: reqwest::Client,
    filter: FeedFilter,
    settings: TickerSettings,
    state: TickerState,
}

impl RssTickerSource {
    pub fn new(desc: SourceDescriptor, http: reqwest::Client) -> Self {
        let filter = FeedFilter::from_options(&desc.options);
        let settings = TickerSettings::from_options(&desc.options);
        Self {
            desc,
            http,
            filter,
            settings,
            state: TickerState::default(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &TickerState {
        &self.state
    }

    /// Everything after the network: filter, cap, rotate, render.
    pub fn rotate(&mut self, merged: Vec<FeedItem>) -> DataPoint {
        let mut filtered = self.filter.apply(merged);
        filtered.truncate(self.settings.max_items);
        if filtered.is_empty() {
            // An empty poll counts as a list change.
            self.state = TickerState::default();
            return DataPoint::warn(self.name(), "No entries");
        }

        let show_source = self.settings.show_source;
        let value = self
            .state
            .advance(filtered, self.settings.lines)
            .iter()
            .map(|item| item.render(show_source))
            .collect::<Vec<_>>()
            .join("\n");
        DataPoint::ok(self.name(), value)
    }

    /// Fetch all feeds concurrently.  Failed feeds are skipped; if every one
    /// fails the first error is returned.
    async fn fetch_all(&self, urls: &[String]) -> Result<Vec<FeedItem>, SourceError> {
        let results = join_all(urls.iter().map(|url| fetch_feed(&self.http, url))).await;

        let mut merged = Vec::new();
        let mut first_error = None;
        let mut any_ok = false;
        for (url, result) in urls.iter().zip(results) {
            match result {
                Ok(items) => {
                    any_ok = true;
                    merged.extend(items);
                }
                Err(e) => {
                    debug!(source = %self.desc.name, %url, error = %e, "feed fetch failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if !any_ok => Err(e),
            _ => Ok(merged),
        }
    }
}

#[async_trait]
impl DataSource for RssTickerSource {
    fn name(&self) -> &str {
        &self.desc.name
    }

    fn refresh_interval(&self) -> Duration {
        self.desc.refresh_interval()
    }

    async fn fetch(&mut self) -> Result<DataPoint, SourceError> {
        let urls = resolve_urls(&self.desc.options);
        if urls.is_empty() {
            return Err(SourceError::config("Missing URL"));
        }
        let merged = self.fetch_all(&urls).await?;
        Ok(self.rotate(merged))
    }
}
