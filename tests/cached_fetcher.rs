mod common;

use chrono::{Duration, TimeZone, Utc};
use common::{json_files, sample_articles, FakeFetcher};
use std::sync::Arc;
use tempfile::TempDir;
use tidings::clock::ManualClock;
use tidings::{CacheStorage, CachedFetcher, FeedFetcher, FetchError};

const FEED: &str = "https://example.com/feed.xml";
const FEED_1: &str = "https://example.com/feed1.xml";
const FEED_2: &str = "https://example.com/feed2.xml";

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap())
}

fn storage(dir: &TempDir, clock: &ManualClock) -> CacheStorage {
    CacheStorage::with_clock(dir.path(), 60, Arc::new(clock.clone()))
}

async fn create_cached(dir: &TempDir, clock: &ManualClock) -> (CachedFetcher<FakeFetcher>, FakeFetcher) {
    let fake = FakeFetcher::new();
    let cached = CachedFetcher::with_storage(fake.clone(), storage(dir, clock)).await;
    (cached, fake)
}

#[tokio::test]
async fn test_first_fetch_calls_wrapped_fetcher() {
    let dir = TempDir::new().unwrap();
    let (cached, fake) = create_cached(&dir, &clock()).await;

    let articles = cached.fetch_articles(FEED).await.unwrap();

    assert_eq!(fake.fetch_calls(), 1);
    assert_eq!(articles.len(), 2);
}

#[tokio::test]
async fn test_second_fetch_is_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let (cached, fake) = create_cached(&dir, &clock()).await;

    let first = cached.fetch_articles(FEED).await.unwrap();
    let second = cached.fetch_articles(FEED).await.unwrap();

    assert_eq!(fake.fetch_calls(), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_miss_writes_one_entry_file() {
    let dir = TempDir::new().unwrap();
    let (cached, _fake) = create_cached(&dir, &clock()).await;

    cached.fetch_articles(FEED).await.unwrap();

    let files = json_files(dir.path());
    assert_eq!(files.len(), 1);

    let entry: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
    assert_eq!(entry["feedUrl"], FEED);
    assert_eq!(entry["articles"].as_array().unwrap().len(), 2);
    assert!(entry["fetchedAt"].is_string());
}

#[tokio::test]
async fn test_expired_entry_is_fetched_again() {
    let dir = TempDir::new().unwrap();
    let clock = clock();
    let (cached, fake) = create_cached(&dir, &clock).await;

    cached.fetch_articles(FEED).await.unwrap();
    assert_eq!(fake.fetch_calls(), 1);

    clock.advance(Duration::minutes(61));
    cached.fetch_articles(FEED).await.unwrap();

    assert_eq!(fake.fetch_calls(), 2);
}

#[tokio::test]
async fn test_expired_entry_is_fetched_again_by_new_instance() {
    let dir = TempDir::new().unwrap();
    let clock = clock();
    let (cached, fake) = create_cached(&dir, &clock).await;
    cached.fetch_articles(FEED).await.unwrap();

    clock.advance(Duration::minutes(61));
    let reopened = CachedFetcher::with_storage(fake.clone(), storage(&dir, &clock)).await;
    reopened.fetch_articles(FEED).await.unwrap();

    assert_eq!(fake.fetch_calls(), 2);
}

#[tokio::test]
async fn test_feeds_are_cached_independently() {
    let dir = TempDir::new().unwrap();
    let (cached, fake) = create_cached(&dir, &clock()).await;

    cached.fetch_articles(FEED_1).await.unwrap();
    cached.fetch_articles(FEED_2).await.unwrap();
    cached.fetch_articles(FEED_1).await.unwrap();

    assert_eq!(fake.fetch_calls(), 2);
    assert_eq!(fake.calls_for(FEED_1), 1);
    assert_eq!(fake.calls_for(FEED_2), 1);
}

#[tokio::test]
async fn test_validate_passes_through_uncached() {
    let dir = TempDir::new().unwrap();
    let (cached, fake) = create_cached(&dir, &clock()).await;

    let meta = cached.validate_and_fetch_feed(FEED).await.unwrap();
    cached.validate_and_fetch_feed(FEED).await.unwrap();

    assert_eq!(meta.title, "Test Feed");
    assert_eq!(meta.feed_url, FEED);
    assert_eq!(fake.validate_calls(), 2);
    assert!(json_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_construction_sweeps_expired_entries() {
    let dir = TempDir::new().unwrap();
    let clock = clock();
    let (cached, fake) = create_cached(&dir, &clock).await;
    cached.fetch_articles(FEED).await.unwrap();
    assert_eq!(json_files(dir.path()).len(), 1);

    clock.advance(Duration::minutes(61));
    let reopened = CachedFetcher::with_storage(fake, storage(&dir, &clock)).await;

    assert!(json_files(dir.path()).is_empty());
    assert_eq!(reopened.startup_sweep().expired, 1);
    assert_eq!(reopened.startup_sweep().removed(), 1);
}

#[tokio::test]
async fn test_construction_keeps_fresh_entries() {
    let dir = TempDir::new().unwrap();
    let clock = clock();
    let (cached, fake) = create_cached(&dir, &clock).await;
    cached.fetch_articles(FEED).await.unwrap();

    clock.advance(Duration::minutes(30));
    let reopened = CachedFetcher::with_storage(fake.clone(), storage(&dir, &clock)).await;
    reopened.fetch_articles(FEED).await.unwrap();

    assert_eq!(json_files(dir.path()).len(), 1);
    assert_eq!(fake.fetch_calls(), 1);
}

#[tokio::test]
async fn test_fetch_failure_propagates_and_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let (cached, fake) = create_cached(&dir, &clock()).await;
    fake.fail(FEED);

    let err = cached.fetch_articles(FEED).await.unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 503, .. }));
    assert_eq!(err.url(), FEED);
    assert!(json_files(dir.path()).is_empty());

    fake.recover(FEED);
    cached.fetch_articles(FEED).await.unwrap();
    assert_eq!(fake.fetch_calls(), 2);
}

#[tokio::test]
async fn test_failure_after_expiry_does_not_fall_back_to_stale_copy() {
    let dir = TempDir::new().unwrap();
    let clock = clock();
    let (cached, fake) = create_cached(&dir, &clock).await;
    cached.fetch_articles(FEED).await.unwrap();

    clock.advance(Duration::minutes(90));
    fake.fail(FEED);

    assert!(cached.fetch_articles(FEED).await.is_err());
}

#[tokio::test]
async fn test_clear_cache_evicts_only_that_feed() {
    let dir = TempDir::new().unwrap();
    let (cached, fake) = create_cached(&dir, &clock()).await;
    cached.fetch_articles(FEED_1).await.unwrap();
    cached.fetch_articles(FEED_2).await.unwrap();

    cached.clear_cache(FEED_1).await;
    cached.fetch_articles(FEED_1).await.unwrap();
    cached.fetch_articles(FEED_2).await.unwrap();

    assert_eq!(fake.calls_for(FEED_1), 2);
    assert_eq!(fake.calls_for(FEED_2), 1);
}

#[tokio::test]
async fn test_clear_all_evicts_everything() {
    let dir = TempDir::new().unwrap();
    let (cached, fake) = create_cached(&dir, &clock()).await;
    cached.fetch_articles(FEED_1).await.unwrap();
    cached.fetch_articles(FEED_2).await.unwrap();

    assert_eq!(cached.clear_all().await, 2);
    cached.fetch_articles(FEED_2).await.unwrap();

    assert_eq!(fake.calls_for(FEED_2), 2);
}

#[tokio::test]
async fn test_corrupted_entry_is_refetched() {
    let dir = TempDir::new().unwrap();
    let (cached, fake) = create_cached(&dir, &clock()).await;
    std::fs::write(cached.storage().entry_path(FEED), b"\0\0garbage").unwrap();

    let articles = cached.fetch_articles(FEED).await.unwrap();

    assert_eq!(articles, sample_articles(FEED));
    assert_eq!(fake.fetch_calls(), 1);
    assert_eq!(cached.storage().get(FEED).await, Some(articles));
}

#[tokio::test]
async fn test_new_uses_wall_clock_storage() {
    let dir = TempDir::new().unwrap();
    let fake = FakeFetcher::new();
    let cached = CachedFetcher::new(fake.clone(), dir.path().join("cache"), 60).await;

    cached.fetch_articles(FEED).await.unwrap();
    cached.fetch_articles(FEED).await.unwrap();

    assert_eq!(fake.fetch_calls(), 1);
    assert_eq!(cached.storage().ttl(), Duration::minutes(60));
}

#[tokio::test]
async fn test_works_through_shared_trait_object() {
    let dir = TempDir::new().unwrap();
    let fake = FakeFetcher::new();
    let inner: Arc<dyn FeedFetcher> = Arc::new(fake.clone());
    let cached = CachedFetcher::new(inner, dir.path(), 60).await;
    let erased: Box<dyn FeedFetcher> = Box::new(cached);

    erased.fetch_articles(FEED).await.unwrap();
    erased.fetch_articles(FEED).await.unwrap();

    assert_eq!(fake.fetch_calls(), 1);
}
