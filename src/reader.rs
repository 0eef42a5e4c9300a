use futures::future::join_all;
use tracing::info;
use crate::cached::CachedFetcher;
use crate::config::Config;
use crate::error::{ReaderError, Result};
use crate::fetcher::{FeedFetcher, HttpFetcher};
use crate::models::{Article, Feed};
use crate::read_state::ReadArticles;
use crate::store::FeedStore;
use crate::titles::{refresh_missing_titles, TitleRefreshReport};

/// Result of fetching one subscription during [`Reader::fetch_all`]
#[derive(Debug)]
pub struct FeedFetchOutcome {
    pub feed: Feed,
    pub result: Result<Vec<Article>>,
}

/// The operations the application exposes: subscriptions, articles and read state
#[derive(Debug)]
pub struct Reader<F> {
    feeds: FeedStore,
    read: ReadArticles,
    fetcher: CachedFetcher<F>,
}

impl Reader<HttpFetcher> {
    pub async fn open(config: &Config) -> Result<Self> {
        let http = HttpFetcher::new(&config.user_agent, config.request_timeout)?;
        Ok(Self::with_fetcher(config, http).await)
    }
}

impl<F: FeedFetcher> Reader<F> {
    pub async fn with_fetcher(config: &Config, fetcher: F) -> Self {
        let fetcher = CachedFetcher::new(fetcher, config.cache_dir(), config.cache_ttl_minutes).await;
        Self::from_parts(
            FeedStore::new(config.feeds_file()),
            ReadArticles::new(config.read_articles_file()),
            fetcher,
        )
    }

    pub fn from_parts(feeds: FeedStore, read: ReadArticles, fetcher: CachedFetcher<F>) -> Self {
        Self { feeds, read, fetcher }
    }

    pub fn fetcher(&self) -> &CachedFetcher<F> {
        &self.fetcher
    }

    pub fn list_feeds(&self) -> Result<Vec<Feed>> {
        self.feeds.list()
    }

    /// Validates the URL as a feed and subscribes to it
    pub async fn add_feed(&self, url: &str) -> Result<Feed> {
        if self.feeds.contains(url)? {
            return Err(ReaderError::FeedAlreadyExists(url.to_string()));
        }

        let meta = self.fetcher.validate_and_fetch_feed(url).await?;
        let feed = Feed::from_metadata(meta);
        self.feeds.add(feed.clone())?;

        info!(feed_url = %feed.feed_url, title = %feed.title, "subscribed");
        Ok(feed)
    }

    pub async fn articles(&self, url: &str) -> Result<Vec<Article>> {
        Ok(self.fetcher.fetch_articles(url).await?)
    }

    /// Unsubscribes and drops that feed's cached articles
    pub async fn delete_feed(&self, url: &str) -> Result<()> {
        self.feeds.delete(url)?;
        self.fetcher.clear_cache(url).await;
        info!(feed_url = url, "unsubscribed");
        Ok(())
    }

    /// Discards the cached copy and fetches the feed again
    pub async fn refresh_feed(&self, url: &str) -> Result<Vec<Article>> {
        self.fetcher.clear_cache(url).await;
        self.articles(url).await
    }

    pub async fn refresh_titles(&self) -> Result<TitleRefreshReport> {
        refresh_missing_titles(&self.feeds, &self.fetcher).await
    }

    /// Fetches every subscription concurrently; one failing feed does not affect the others
    pub async fn fetch_all(&self) -> Result<Vec<FeedFetchOutcome>> {
        let feeds = self.feeds.list()?;
        let fetches = feeds.into_iter().map(|feed| async move {
            let result = self.articles(&feed.feed_url).await;
            FeedFetchOutcome { feed, result }
        });
        Ok(join_all(fetches).await)
    }

    pub fn mark_read(&self, link: &str) -> Result<()> {
        self.read.add(link)
    }

    pub fn mark_unread(&self, link: &str) -> Result<()> {
        self.read.remove(link)
    }

    pub fn is_read(&self, link: &str) -> bool {
        self.read.contains(link)
    }

    pub fn read_links(&self) -> Vec<String> {
        self.read.all()
    }
}
