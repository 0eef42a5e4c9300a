use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};
use crate::cache::{CacheStorage, SweepReport};
use crate::error::FetchError;
use crate::fetcher::FeedFetcher;
use crate::models::{Article, FeedMetadata};

/// Wraps a [`FeedFetcher`] with the on-disk article cache.
///
/// Fresh cache hits never reach the inner fetcher. Misses are fetched, stored
/// and returned; a failed fetch writes nothing and is returned as-is.
/// Feed metadata is never cached.
#[derive(Debug)]
pub struct CachedFetcher<F> {
    inner: F,
    storage: CacheStorage,
    startup_sweep: SweepReport,
}

impl<F: FeedFetcher> CachedFetcher<F> {
    /// Builds the wrapper and sweeps expired entries left by earlier runs
    pub async fn new(inner: F, cache_dir: impl Into<PathBuf>, ttl_minutes: u32) -> Self {
        Self::with_storage(inner, CacheStorage::new(cache_dir, ttl_minutes)).await
    }

    pub async fn with_storage(inner: F, storage: CacheStorage) -> Self {
        let report = storage.cleanup_expired().await;
        if report.removed() > 0 {
            info!(
                expired = report.expired,
                corrupted = report.corrupted,
                "removed stale cache entries"
            );
        }
        Self { inner, storage, startup_sweep: report }
    }

    /// Forgets the cached articles of one feed
    pub async fn clear_cache(&self, feed_url: &str) {
        self.storage.remove(feed_url).await;
    }

    /// Forgets the cached articles of every feed
    pub async fn clear_all(&self) -> usize {
        self.storage.clear().await
    }

    /// What the sweep run at construction removed
    pub fn startup_sweep(&self) -> SweepReport {
        self.startup_sweep
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: FeedFetcher> FeedFetcher for CachedFetcher<F> {
    async fn validate_and_fetch_feed(&self, url: &str) -> Result<FeedMetadata, FetchError> {
        self.inner.validate_and_fetch_feed(url).await
    }

    async fn fetch_articles(&self, url: &str) -> Result<Vec<Article>, FetchError> {
        if let Some(articles) = self.storage.get(url).await {
            debug!(url, count = articles.len(), "cache hit");
            return Ok(articles);
        }

        debug!(url, "cache miss");
        let articles = self.inner.fetch_articles(url).await?;
        self.storage.set(url, &articles).await;

        Ok(articles)
    }
}
