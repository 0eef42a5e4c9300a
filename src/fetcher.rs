use async_trait::async_trait;
use feed_rs::model::{Entry, Feed as ParsedFeed};
use feed_rs::parser;
use regex::Regex;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::debug;
use crate::error::FetchError;
use crate::models::{Article, FeedMetadata, UNTITLED_ARTICLE, UNTITLED_FEED};

/// Anything that can turn a feed URL into metadata and articles.
/// Implemented by the network fetcher and by the caching wrapper around it.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn validate_and_fetch_feed(&self, url: &str) -> Result<FeedMetadata, FetchError>;

    async fn fetch_articles(&self, url: &str) -> Result<Vec<Article>, FetchError>;
}

#[async_trait]
impl<F: FeedFetcher + ?Sized> FeedFetcher for Arc<F> {
    async fn validate_and_fetch_feed(&self, url: &str) -> Result<FeedMetadata, FetchError> {
        (**self).validate_and_fetch_feed(url).await
    }

    async fn fetch_articles(&self, url: &str) -> Result<Vec<Article>, FetchError> {
        (**self).fetch_articles(url).await
    }
}

#[async_trait]
impl<F: FeedFetcher + ?Sized> FeedFetcher for Box<F> {
    async fn validate_and_fetch_feed(&self, url: &str) -> Result<FeedMetadata, FetchError> {
        (**self).validate_and_fetch_feed(url).await
    }

    async fn fetch_articles(&self, url: &str) -> Result<Vec<Article>, FetchError> {
        (**self).fetch_articles(url).await
    }
}

/// Fetches RSS/Atom feeds over HTTP and parses them with feed-rs
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Uses a caller-supplied client, e.g. one with a proxy or custom TLS setup
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn download(&self, url: &str) -> Result<ParsedFeed, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request { url: url.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Request { url: url.to_string(), source })?;

        debug!(url, bytes = bytes.len(), "downloaded feed");
        parse_feed(url, &bytes)
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn validate_and_fetch_feed(&self, url: &str) -> Result<FeedMetadata, FetchError> {
        let feed = self.download(url).await?;
        Ok(feed_metadata(url, &feed))
    }

    async fn fetch_articles(&self, url: &str) -> Result<Vec<Article>, FetchError> {
        let feed = self.download(url).await?;
        Ok(feed_articles(feed))
    }
}

/// Parses a raw RSS/Atom document
pub fn parse_feed(url: &str, body: &[u8]) -> Result<ParsedFeed, FetchError> {
    parser::parse(body).map_err(|source| FetchError::Parse { url: url.to_string(), source })
}

pub fn feed_metadata(url: &str, feed: &ParsedFeed) -> FeedMetadata {
    let title = feed
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED_FEED.to_string());

    let description = feed
        .description
        .as_ref()
        .map(|d| d.content.clone())
        .unwrap_or_default();

    FeedMetadata {
        title,
        description,
        feed_url: url.to_string(),
    }
}

/// Converts parsed entries to articles, newest first.
/// Undated entries keep their feed order and go after dated ones.
pub fn feed_articles(feed: ParsedFeed) -> Vec<Article> {
    let mut articles: Vec<Article> = feed.entries.into_iter().map(to_article).collect();
    articles.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
    articles
}

fn to_article(entry: Entry) -> Article {
    let thumbnail = extract_thumbnail(&entry);

    let title = entry
        .title
        .map(|t| t.content)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| UNTITLED_ARTICLE.to_string());

    let link = entry
        .links
        .first()
        .map(|l| l.href.clone())
        .unwrap_or_default();

    let pub_date = entry.published.or(entry.updated);

    let summary = entry.summary.map(|s| s.content);
    let description = entry
        .content
        .and_then(|c| c.body)
        .or(summary)
        .unwrap_or_default();

    Article {
        title,
        link,
        pub_date,
        description,
        thumbnail,
    }
}

/// Enclosure or media attachment first, then the first inline image in the body
fn extract_thumbnail(entry: &Entry) -> Option<String> {
    let enclosure = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .find_map(|c| c.url.as_ref().map(|u| u.to_string()));
    if enclosure.is_some() {
        return enclosure;
    }

    let media_thumbnail = entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.clone())
        .next();
    if media_thumbnail.is_some() {
        return media_thumbnail;
    }

    let body = entry
        .content
        .as_ref()
        .and_then(|c| c.body.as_deref())
        .or_else(|| entry.summary.as_ref().map(|s| s.content.as_str()))?;
    first_image_src(body)
}

fn first_image_src(html: &str) -> Option<String> {
    static IMG_SRC: OnceLock<Option<Regex>> = OnceLock::new();
    if !html.contains("<img") {
        return None;
    }
    let re = IMG_SRC
        .get_or_init(|| Regex::new(r#"<img[^>]+src=["']([^"']+)["']"#).ok())
        .as_ref()?;
    re.captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}
