use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tidings::config::Config;
use tidings::models::Article;
use tidings::Reader;
use tracing_subscriber::EnvFilter;

const WRAP_WIDTH: usize = 80;

#[derive(Parser)]
#[command(name = "tidings")]
#[command(about = "RSS/Atom reader with an on-disk article cache", long_about = None)]
#[command(version)]
struct Cli {
    /// Where subscriptions, read state and the cache live
    #[arg(long, global = true, env = "TIDINGS_DATA_DIR")]
    data_dir: Option<String>,

    /// Minutes a fetched feed stays fresh in the cache
    #[arg(long, global = true, env = "TIDINGS_CACHE_TTL")]
    ttl: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List subscriptions
    List,
    /// Subscribe to a feed
    Add { url: String },
    /// Show the articles of a feed
    Articles {
        url: String,
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Unsubscribe from a feed
    Delete { url: String },
    /// Re-fetch a feed, bypassing the cache
    Refresh { url: String },
    /// Look up titles for feeds saved without one
    RefreshTitles,
    /// Fetch every subscription
    Fetch,
    /// Mark an article as read
    Read { link: String },
    /// Mark an article as unread
    Unread { link: String },
    #[command(subcommand)]
    Cache(CacheCommand),
}

/// Cache maintenance
#[derive(Subcommand)]
enum CacheCommand {
    /// Delete expired and unreadable entries
    Sweep,
    /// Delete every entry
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.data_dir.as_deref(), cli.ttl);
    let reader = Reader::open(&config)
        .await
        .context("Failed to initialize feed reader")?;

    match cli.command {
        Commands::List => {
            let feeds = reader.list_feeds()?;
            println!("{} feeds:", feeds.len());
            for feed in feeds {
                println!("  - {} <{}>", feed.title, feed.feed_url);
            }
        }
        Commands::Add { url } => {
            let feed = reader
                .add_feed(&url)
                .await
                .with_context(|| format!("Failed to add feed {}", url))?;
            println!("✓ Subscribed to {}", feed.title);
        }
        Commands::Articles { url, limit, json } => {
            let articles = reader
                .articles(&url)
                .await
                .with_context(|| format!("Failed to load articles for {}", url))?;
            let limit = limit.unwrap_or(articles.len());
            let shown: Vec<&Article> = articles.iter().take(limit).collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                for article in shown {
                    print_article(article, reader.is_read(&article.link));
                }
            }
        }
        Commands::Delete { url } => {
            reader
                .delete_feed(&url)
                .await
                .with_context(|| format!("Failed to delete feed {}", url))?;
            println!("✓ Removed {}", url);
        }
        Commands::Refresh { url } => {
            let articles = reader
                .refresh_feed(&url)
                .await
                .with_context(|| format!("Failed to refresh {}", url))?;
            println!("✓ Fetched {} items", articles.len());
        }
        Commands::RefreshTitles => {
            let report = reader.refresh_titles().await?;
            println!(
                "Updated {} titles ({} failed, {} already set)",
                report.successful, report.failed, report.skipped
            );
        }
        Commands::Fetch => {
            for outcome in reader.fetch_all().await? {
                println!("Fetching: {}", outcome.feed.feed_url);
                match outcome.result {
                    Ok(articles) => println!("  ✓ {} items", articles.len()),
                    Err(e) => eprintln!("  ✗ Failed: {}", e),
                }
            }
        }
        Commands::Read { link } => {
            reader.mark_read(&link)?;
        }
        Commands::Unread { link } => {
            reader.mark_unread(&link)?;
        }
        Commands::Cache(CacheCommand::Sweep) => {
            let fetcher = reader.fetcher();
            let report = fetcher
                .startup_sweep()
                .followed_by(fetcher.storage().cleanup_expired().await);
            println!(
                "Removed {} expired and {} unreadable entries, kept {}",
                report.expired, report.corrupted, report.kept
            );
        }
        Commands::Cache(CacheCommand::Clear) => {
            let removed = reader.fetcher().clear_all().await;
            println!("Removed {} cache entries", removed);
        }
    }

    Ok(())
}

fn print_article(article: &Article, read: bool) {
    let marker = if read { " " } else { "*" };
    println!("{} {}", marker, article.title);
    if let Some(date) = article.pub_date {
        println!("  Published: {}", date.format("%Y-%m-%d %H:%M"));
    }
    if !article.link.is_empty() {
        println!("  Link: {}", article.link);
    }
    if !article.description.is_empty() {
        let text = html2text::from_read(article.description.as_bytes(), WRAP_WIDTH);
        for line in text.lines().take(4) {
            println!("  {}", line);
        }
    }
    println!();
}
