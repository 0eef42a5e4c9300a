use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TTL_MINUTES: u32 = 60;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub cache_ttl_minutes: u32,
    pub user_agent: String,
    pub request_timeout: Duration,
}

impl Config {
    /// Resolves the data directory: an explicit path wins, then
    /// `$XDG_DATA_HOME/tidings`, then `~/.local/share/tidings`.
    pub fn resolve(data_dir: Option<&str>, cache_ttl_minutes: Option<u32>) -> Self {
        let data_dir = match data_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).as_ref()),
            None => default_data_dir(),
        };

        Self {
            data_dir,
            cache_ttl_minutes: cache_ttl_minutes.unwrap_or(DEFAULT_TTL_MINUTES),
            user_agent: format!("Tidings/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let mut config = Self::resolve(None, None);
        config.data_dir = data_dir.as_ref().to_path_buf();
        config
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    pub fn feeds_file(&self) -> PathBuf {
        self.data_dir.join("feeds.json")
    }

    pub fn read_articles_file(&self) -> PathBuf {
        self.data_dir.join("read_articles.json")
    }
}

fn default_data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        if !xdg_data.is_empty() {
            return PathBuf::from(xdg_data).join("tidings");
        }
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".local/share/tidings")
}
