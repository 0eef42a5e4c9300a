use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use crate::error::{ReaderError, Result};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadArticlesData {
    #[serde(default)]
    read_articles: BTreeSet<String>,
}

/// Links of articles the user has opened.
/// Loaded from disk on first use; a missing or unreadable file starts empty.
#[derive(Debug)]
pub struct ReadArticles {
    path: PathBuf,
    loaded: Mutex<Option<BTreeSet<String>>>,
}

impl ReadArticles {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loaded: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> MutexGuard<'_, Option<BTreeSet<String>>> {
        let mut guard = self.loaded.lock().unwrap_or_else(|e| e.into_inner());
        if guard.is_none() {
            let links = fs::read_to_string(&self.path)
                .ok()
                .and_then(|content| serde_json::from_str::<ReadArticlesData>(&content).ok())
                .map(|data| data.read_articles)
                .unwrap_or_default();
            *guard = Some(links);
        }
        guard
    }

    fn save(&self, links: &BTreeSet<String>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| ReaderError::io(dir, e))?;
        }

        let data = ReadArticlesData { read_articles: links.clone() };
        let json = serde_json::to_string(&data).map_err(|e| ReaderError::json(&self.path, e))?;
        fs::write(&self.path, json).map_err(|e| ReaderError::io(&self.path, e))
    }

    pub fn add(&self, link: &str) -> Result<()> {
        let mut guard = self.load();
        let links = guard.get_or_insert_with(BTreeSet::new);
        links.insert(link.to_string());
        self.save(links)
    }

    pub fn remove(&self, link: &str) -> Result<()> {
        let mut guard = self.load();
        let links = guard.get_or_insert_with(BTreeSet::new);
        links.remove(link);
        self.save(links)
    }

    pub fn contains(&self, link: &str) -> bool {
        self.load().as_ref().map_or(false, |links| links.contains(link))
    }

    pub fn all(&self) -> Vec<String> {
        self.load()
            .as_ref()
            .map(|links| links.iter().cloned().collect())
            .unwrap_or_default()
    }
}
