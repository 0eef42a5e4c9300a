use crate::clock::{Clock, SystemClock};
use crate::models::Article;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};

const ENTRY_EXTENSION: &str = "json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    feed_url: String,
    articles: Vec<Article>,
    fetched_at: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntryRef<'a> {
    feed_url: &'a str,
    articles: &'a [Article],
    fetched_at: DateTime<Utc>,
}

/// Outcome of a sweep over the cache directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub corrupted: usize,
    pub kept: usize,
}

impl SweepReport {
    pub fn removed(&self) -> usize {
        self.expired + self.corrupted
    }

    /// Combines an earlier sweep with a later one; `kept` comes from the later
    pub fn followed_by(self, later: SweepReport) -> SweepReport {
        SweepReport {
            expired: self.expired + later.expired,
            corrupted: self.corrupted + later.corrupted,
            kept: later.kept,
        }
    }
}

/// On-disk article cache, one JSON file per feed URL.
///
/// Files are named by the SHA-256 of the feed URL. An entry older than the TTL
/// is never returned; unreadable entries behave exactly like missing ones.
/// Storage failures are logged and swallowed, the cache never fails a caller.
#[derive(Clone)]
pub struct CacheStorage {
    cache_dir: PathBuf,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CacheStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStorage")
            .field("cache_dir", &self.cache_dir)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl CacheStorage {
    pub fn new(cache_dir: impl Into<PathBuf>, ttl_minutes: u32) -> Self {
        Self::with_clock(cache_dir, ttl_minutes, Arc::new(SystemClock))
    }

    pub fn with_clock(cache_dir: impl Into<PathBuf>, ttl_minutes: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ttl: Duration::minutes(i64::from(ttl_minutes)),
            clock,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Path of the entry file that holds `feed_url`, whether or not it exists
    pub fn entry_path(&self, feed_url: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}", cache_key(feed_url), ENTRY_EXTENSION))
    }

    /// Returns the cached articles for `feed_url` if present and still fresh
    pub async fn get(&self, feed_url: &str) -> Option<Vec<Article>> {
        let entry = read_entry(&self.entry_path(feed_url)).await?;

        if entry.feed_url != feed_url {
            debug!(feed_url, stored = %entry.feed_url, "cache entry belongs to another feed");
            return None;
        }

        if self.is_expired(entry.fetched_at) {
            debug!(feed_url, fetched_at = %entry.fetched_at, "cache entry expired");
            return None;
        }

        Some(entry.articles)
    }

    /// Replaces the entry for `feed_url`, stamped with the current time
    pub async fn set(&self, feed_url: &str, articles: &[Article]) {
        let entry = CacheEntryRef {
            feed_url,
            articles,
            fetched_at: self.clock.now(),
        };

        if let Err(e) = self.write_entry(feed_url, &entry).await {
            warn!(feed_url, error = %e, "failed to write cache entry");
        }
    }

    async fn write_entry(&self, feed_url: &str, entry: &CacheEntryRef<'_>) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir).await?;

        let json = serde_json::to_vec(entry)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;

        fs::write(self.entry_path(feed_url), json).await
    }

    /// Drops the entry for a single feed, leaving every other feed cached
    pub async fn remove(&self, feed_url: &str) {
        let path = self.entry_path(feed_url);
        delete_file(&path).await;
    }

    /// Deletes every entry that is expired or cannot be parsed
    pub async fn cleanup_expired(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for path in self.entry_files().await {
            match read_entry(&path).await {
                Some(entry) if self.is_expired(entry.fetched_at) => {
                    delete_file(&path).await;
                    report.expired += 1;
                }
                Some(_) => report.kept += 1,
                None => {
                    debug!(path = %path.display(), "removing unreadable cache entry");
                    delete_file(&path).await;
                    report.corrupted += 1;
                }
            }
        }

        debug!(
            expired = report.expired,
            corrupted = report.corrupted,
            kept = report.kept,
            "cache sweep finished"
        );
        report
    }

    /// Deletes every entry regardless of age
    pub async fn clear(&self) -> usize {
        let files = self.entry_files().await;
        let count = files.len();
        for path in files {
            delete_file(&path).await;
        }
        count
    }

    fn is_expired(&self, fetched_at: DateTime<Utc>) -> bool {
        self.clock.now() - fetched_at > self.ttl
    }

    async fn entry_files(&self) -> Vec<PathBuf> {
        let mut dir = match fs::read_dir(&self.cache_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(dir = %self.cache_dir.display(), error = %e, "failed to scan cache directory");
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        loop {
            match dir.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    if path.extension().map_or(false, |ext| ext == ENTRY_EXTENSION) {
                        files.push(path);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(dir = %self.cache_dir.display(), error = %e, "failed to scan cache directory");
                    break;
                }
            }
        }
        files
    }
}

/// Content-addressed key for a feed URL: lowercase hex SHA-256
pub fn cache_key(feed_url: &str) -> String {
    hex::encode(Sha256::digest(feed_url.as_bytes()))
}

async fn read_entry(path: &Path) -> Option<CacheEntry> {
    let content = fs::read(path).await.ok()?;
    serde_json::from_slice(&content).ok()
}

async fn delete_file(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to delete cache entry"),
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
