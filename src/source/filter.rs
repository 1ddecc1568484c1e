//! Feed entry filtering for the ticker.
//!
//! Stages run in this order for every entry:
//!
//! 1. keyword include (title must contain one token)
//! 2. keyword exclude (title must contain none)
//! 3. source block (name or link domain must match none)
//! 4. source allow-list (name or link domain must match one)
//! 5. de-duplication by lowercased, trimmed title
//!
//! Survivors are then stably reordered by preferred-source rank.  All tokens
//! are lowercased substrings; an empty token list disables its stage.

use super::{FeedItem, Options};

#[derive(Debug, Clone, PartialEq)]
pub struct FeedFilter {
    pub include_keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
    pub block_sources: Vec<String>,
    pub only_sources: Vec<String>,
    pub prefer_sources: Vec<String>,
    pub dedupe: bool,
}

impl Default for FeedFilter {
    fn default() -> Self {
        Self {
            include_keywords: Vec::new(),
            exclude_keywords: Vec::new(),
            block_sources: Vec::new(),
            only_sources: Vec::new(),
            prefer_sources: Vec::new(),
            dedupe: true,
        }
    }
}

impl FeedFilter {
    pub fn from_options(options: &Options) -> Self {
        Self {
            include_keywords: options.token_list("include_keywords"),
            exclude_keywords: options.token_list("exclude_keywords"),
            block_sources: options.token_list("block_sources"),
            only_sources: options.token_list("only_sources"),
            prefer_sources: options.token_list("prefer_sources"),
            dedupe: options.bool_or("dedupe", true),
        }
    }

    /// Run the pipeline, preserving feed order except for preference ranking.
    pub fn apply(&self, items: Vec<FeedItem>) -> Vec<FeedItem> {
        let mut seen_titles = std::collections::HashSet::new();
        let mut kept: Vec<FeedItem> = items
            .into_iter()
            .filter(|item| self.admits(item))
            .filter(|item| !self.dedupe || seen_titles.insert(item.title.trim().to_lowercase()))
            .collect();

        if !self.prefer_sources.is_empty() {
            // `sort_by_cached_key` is stable, so equal ranks keep feed order.
            kept.sort_by_cached_key(|item| self.prefer_rank(item));
        }
        kept
    }

    fn admits(&self, item: &FeedItem) -> bool {
        let title = item.title.to_lowercase();
        let source = item.source.to_lowercase();
        let domain = item.domain();

        if !self.include_keywords.is_empty() && !contains_any(&title, &self.include_keywords) {
            return false;
        }
        if contains_any(&title, &self.exclude_keywords) {
            return false;
        }
        if matches_source(&self.block_sources, &source, &domain) {
            return false;
        }
        if !self.only_sources.is_empty() && !matches_source(&self.only_sources, &source, &domain) {
            return false;
        }
        true
    }

    /// Index of the first preferred token found in the source name or link.
    /// Entries matching nothing rank after every match.
    fn prefer_rank(&self, item: &FeedItem) -> usize {
        let source = item.source.to_lowercase();
        let link = item.link.to_lowercase();
        self.prefer_sources
            .iter()
            .position(|pref| source.contains(pref.as_str()) || link.contains(pref.as_str()))
            .unwrap_or(self.prefer_sources.len() + 1)
    }
}

fn contains_any(text: &str, tokens: &[String]) -> bool {
    tokens.iter().any(|t| text.contains(t.as_str()))
}

fn matches_source(tokens: &[String], source: &str, domain: &str) -> bool {
    tokens
        .iter()
        .any(|t| source.contains(t.as_str()) || domain.contains(t.as_str()))
}
