//! RSS feed fetching and the headline source.
//!
//! [`fetch_feed`] and [`parse_channel`] are shared with the ticker; the
//! [`RssSource`] itself just reports the newest headline of one feed.

use async_trait::async_trait;
use std::time::Duration;

use super::{DataPoint, DataSource, FeedItem, Options};
use crate::config::SourceDescriptor;
use crate::error::SourceError;

/// Shows the first entry of a single RSS feed.
pub struct RssSource {
    desc: SourceDescriptor,
    http: reqwest::Client,
}

impl RssSource {
    pub fn new(desc: SourceDescriptor, http: reqwest::Client) -> Self {
        Self { desc, http }
    }
}

#[async_trait]
impl DataSource for RssSource {
    fn name(&self) -> &str {
        &self.desc.name
    }

    fn refresh_interval(&self) -> Duration {
        self.desc.refresh_interval()
    }

    async fn fetch(&mut self) -> Result<DataPoint, SourceError> {
        let url = self
            .desc
            .options
            .str("url")
            .ok_or_else(|| SourceError::config("Missing URL"))?;

        let items = fetch_feed(&self.http, &url).await?;
        match items.first() {
            Some(item) => Ok(DataPoint::ok(self.name(), item.title.clone())),
            None => Ok(DataPoint::warn(self.name(), "No entries")),
        }
    }
}

/// Feed URLs from either `urls` (a non-empty list wins) or `url`.
pub fn resolve_urls(options: &Options) -> Vec<String> {
    let urls = options.string_list("urls");
    if !urls.is_empty() {
        return urls;
    }
    options.str("url").into_iter().collect()
}

/// Download and parse one RSS feed.
pub async fn fetch_feed(http: &reqwest::Client, url: &str) -> Result<Vec<FeedItem>, SourceError> {
    let body = http.get(url).send().await?.error_for_status()?.bytes().await?;
    let channel = rss::Channel::read_from(body.as_ref())?;
    Ok(parse_channel(&channel))
}

/// Convert an already-parsed [`rss::Channel`] into [`FeedItem`]s.
///
/// Pure so tests can exercise it without a network.
pub fn parse_channel(channel: &rss::Channel) -> Vec<FeedItem> {
    channel
        .items()
        .iter()
        .map(|item| {
            let title = item.title().map(str::trim).unwrap_or("Untitled");
            let link = item.link().map(str::trim).unwrap_or_default();
            let source = item
                .source()
                .and_then(|s| s.title())
                .map(str::trim)
                .unwrap_or_default();
            FeedItem::new(title, link, source)
        })
        .collect()
}
