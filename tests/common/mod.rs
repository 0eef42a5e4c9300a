#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tidings::{Article, FeedFetcher, FeedMetadata, FetchError};

/// In-memory fetcher that counts how often it is asked for articles
#[derive(Debug, Clone, Default)]
pub struct FakeFetcher {
    fetch_calls: Arc<AtomicUsize>,
    validate_calls: Arc<AtomicUsize>,
    per_url: Arc<Mutex<HashMap<String, usize>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    titles: Arc<Mutex<HashMap<String, String>>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, url: &str) -> usize {
        self.per_url.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn recover(&self, url: &str) {
        self.failing.lock().unwrap().remove(url);
    }

    pub fn set_title(&self, url: &str, title: &str) {
        self.titles.lock().unwrap().insert(url.to_string(), title.to_string());
    }

    fn check(&self, url: &str) -> Result<(), FetchError> {
        if self.failing.lock().unwrap().contains(url) {
            return Err(FetchError::Status { url: url.to_string(), status: 503 });
        }
        Ok(())
    }
}

#[async_trait]
impl FeedFetcher for FakeFetcher {
    async fn validate_and_fetch_feed(&self, url: &str) -> Result<FeedMetadata, FetchError> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        self.check(url)?;
        let title = self
            .titles
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| "Test Feed".to_string());
        Ok(FeedMetadata {
            title,
            description: "Test Description".to_string(),
            feed_url: url.to_string(),
        })
    }

    async fn fetch_articles(&self, url: &str) -> Result<Vec<Article>, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        *self.per_url.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
        self.check(url)?;
        Ok(sample_articles(url))
    }
}

pub fn sample_articles(feed_url: &str) -> Vec<Article> {
    vec![
        Article {
            title: "Article 1".to_string(),
            link: format!("{}#1", feed_url),
            pub_date: Some(Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap()),
            description: "Description 1".to_string(),
            thumbnail: None,
        },
        Article {
            title: "Article 2".to_string(),
            link: format!("{}#2", feed_url),
            pub_date: Some(Utc.with_ymd_and_hms(2024, 4, 30, 7, 0, 0).unwrap()),
            description: "Description 2".to_string(),
            thumbnail: Some("https://example.com/2.png".to_string()),
        },
    ]
}

pub fn json_files(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().map_or(false, |ext| ext == "json"))
            .collect(),
        Err(_) => Vec::new(),
    }
}
