use std::path::PathBuf;
use thiserror::Error;

/// Failure to download or parse a feed. Always carries the URL that was requested.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch feed {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch feed {url}: server responded with {status}")]
    Status { url: String, status: u16 },

    #[error("failed to parse feed {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: feed_rs::parser::ParseFeedError,
    },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Request { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Parse { url, .. } => url,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("Feed already exists: {0}")]
    FeedAlreadyExists(String),

    #[error("Feed with URL {0} not found")]
    FeedNotFound(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ReaderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReaderError::Io { path: path.into(), source }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        ReaderError::Json { path: path.into(), source }
    }
}

pub type Result<T, E = ReaderError> = std::result::Result<T, E>;
