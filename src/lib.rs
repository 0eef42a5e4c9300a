//! Feed reader core: subscriptions, a TTL-bounded on-disk article cache, and
//! the fetcher that sits behind it.
//!
//! [`cached::CachedFetcher`] wraps any [`fetcher::FeedFetcher`] (normally
//! [`fetcher::HttpFetcher`]) with [`cache::CacheStorage`], so callers get the
//! same interface with or without caching.

pub mod cache;
pub mod cached;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod read_state;
pub mod reader;
pub mod store;
pub mod titles;

pub use cache::CacheStorage;
pub use cached::CachedFetcher;
pub use error::{FetchError, ReaderError};
pub use fetcher::{FeedFetcher, HttpFetcher};
pub use models::{Article, Feed, FeedMetadata};
pub use reader::Reader;
