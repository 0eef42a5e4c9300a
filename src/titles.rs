use tracing::{debug, warn};
use crate::error::Result;
use crate::fetcher::FeedFetcher;
use crate::models::Feed;
use crate::store::FeedStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TitleRefreshReport {
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Looks up the real title of every subscription saved without one.
/// A feed that cannot be fetched is counted and left alone.
pub async fn refresh_missing_titles<F>(store: &FeedStore, fetcher: &F) -> Result<TitleRefreshReport>
where
    F: FeedFetcher + ?Sized,
{
    let feeds = store.list()?;
    let missing: Vec<&Feed> = feeds
        .iter()
        .filter(|f| Feed::is_title_missing(&f.title, &f.feed_url))
        .collect();

    let mut report = TitleRefreshReport {
        skipped: feeds.len() - missing.len(),
        ..Default::default()
    };

    for feed in missing {
        match fetcher.validate_and_fetch_feed(&feed.feed_url).await {
            Ok(meta) => {
                debug!(feed_url = %feed.feed_url, title = %meta.title, "updating feed title");
                match store.update_title(&feed.feed_url, &meta.title) {
                    Ok(()) => report.successful += 1,
                    Err(e) => {
                        warn!(feed_url = %feed.feed_url, error = %e, "could not store feed title");
                        report.failed += 1;
                    }
                }
            }
            Err(e) => {
                warn!(feed_url = %feed.feed_url, error = %e, "could not fetch feed title");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}
