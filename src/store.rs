use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use crate::error::{ReaderError, Result};
use crate::models::Feed;

#[derive(Debug, Default, Serialize, Deserialize)]
struct FeedList {
    #[serde(default)]
    feeds: Vec<Feed>,
}

/// The user's subscriptions, kept as a JSON document
#[derive(Debug, Clone)]
pub struct FeedStore {
    path: PathBuf,
}

impl FeedStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> Result<Vec<Feed>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| ReaderError::io(&self.path, e))?;
        let list: FeedList = serde_json::from_str(&content)
            .map_err(|e| ReaderError::json(&self.path, e))?;
        Ok(list.feeds)
    }

    fn write(&self, feeds: Vec<Feed>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| ReaderError::io(dir, e))?;
        }

        let json = serde_json::to_string_pretty(&FeedList { feeds })
            .map_err(|e| ReaderError::json(&self.path, e))?;
        fs::write(&self.path, json).map_err(|e| ReaderError::io(&self.path, e))
    }

    pub fn contains(&self, feed_url: &str) -> Result<bool> {
        Ok(self.list()?.iter().any(|f| f.feed_url == feed_url))
    }

    /// Appends a subscription, rejecting a URL that is already subscribed
    pub fn add(&self, feed: Feed) -> Result<()> {
        let mut feeds = self.list()?;
        if feeds.iter().any(|f| f.same_feed(&feed)) {
            return Err(ReaderError::FeedAlreadyExists(feed.feed_url));
        }

        debug!(feed_url = %feed.feed_url, "adding subscription");
        feeds.push(feed);
        self.write(feeds)
    }

    pub fn delete(&self, feed_url: &str) -> Result<()> {
        let feeds = self.list()?;
        let before = feeds.len();
        let remaining: Vec<Feed> = feeds.into_iter().filter(|f| f.feed_url != feed_url).collect();

        if remaining.len() == before {
            return Err(ReaderError::FeedNotFound(feed_url.to_string()));
        }

        self.write(remaining)
    }

    /// Renames a subscription. A placeholder title is ignored rather than stored.
    pub fn update_title(&self, feed_url: &str, title: &str) -> Result<()> {
        if Feed::is_title_missing(title, feed_url) {
            return Ok(());
        }

        let mut feeds = self.list()?;
        let feed = feeds
            .iter_mut()
            .find(|f| f.feed_url == feed_url)
            .ok_or_else(|| ReaderError::FeedNotFound(feed_url.to_string()))?;
        feed.title = title.to_string();

        self.write(feeds)
    }
}
