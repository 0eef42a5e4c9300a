use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

pub const UNTITLED_ARTICLE: &str = "Untitled";
pub const UNTITLED_FEED: &str = "Untitled Feed";

/// A single entry of a feed, normalized by the fetcher and cached verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub link: String,
    pub pub_date: Option<DateTime<Utc>>,
    pub description: String,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMetadata {
    pub title: String,
    pub description: String,
    pub feed_url: String,
}

/// A subscription. Two feeds are the same subscription when their URLs match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub title: String,
    pub feed_url: String,
    #[serde(default)]
    pub description: String,
}

impl Feed {
    pub fn new(title: impl Into<String>, feed_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            feed_url: feed_url.into(),
            description: String::new(),
        }
    }

    pub fn from_metadata(meta: FeedMetadata) -> Self {
        Self {
            title: meta.title,
            feed_url: meta.feed_url,
            description: meta.description,
        }
    }

    pub fn same_feed(&self, other: &Feed) -> bool {
        self.feed_url == other.feed_url
    }

    /// A title is missing when it is blank, the placeholder the fetcher
    /// substitutes, or just the feed URL repeated.
    pub fn is_title_missing(title: &str, feed_url: &str) -> bool {
        let title = title.trim();
        title.is_empty() || title == UNTITLED_FEED || title == feed_url
    }
}
