//! A single feed entry as seen by the feed and ticker sources.
//!
//! Feed parsing converts each RSS `<item>` into a [`FeedItem`] so the ticker's
//! filter and rotation logic can stay independent of the wire format.

/// One entry from an RSS feed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedItem {
    /// Trimmed headline; "Untitled" when the feed omits it.
    pub title: String,

    /// Link to the full article.  Empty when absent.
    pub link: String,

    /// Publisher named in the item's `<source>` element.  Empty when absent.
    ///
    /// Aggregator feeds (Google News and friends) use this to name the
    /// outlet behind each headline.
    pub source: String,
}

impl FeedItem {
    pub fn new(title: impl Into<String>, link: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            source: source.into(),
        }
    }

    /// Lowercased host part of the link, or empty when the link has no scheme.
    pub fn domain(&self) -> String {
        match self.link.split_once("://") {
            Some((_, rest)) => rest.split('/').next().unwrap_or_default().to_lowercase(),
            None => String::new(),
        }
    }

    /// Ticker line for this item.
    pub fn render(&self, show_source: bool) -> String {
        if show_source && !self.source.is_empty() {
            format!("{} ({})", self.title, self.source)
        } else {
            self.title.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_is_lowercased_host() {
        let item = FeedItem::new("t", "https://WWW.Example.com/a/b?c=1", "");
        assert_eq!(item.domain(), "www.example.com");
    }

    #[test]
    fn domain_empty_without_scheme() {
        assert_eq!(FeedItem::new("t", "example.com/a", "").domain(), "");
        assert_eq!(FeedItem::new("t", "", "").domain(), "");
    }

    #[test]
    fn render_appends_source_only_when_present() {
        let with = FeedItem::new("Keep This", "", "Fox News");
        let without = FeedItem::new("Lone", "", "");
        assert_eq!(with.render(true), "Keep This (Fox News)");
        assert_eq!(with.render(false), "Keep This");
        assert_eq!(without.render(true), "Lone");
    }
}
