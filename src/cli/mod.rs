pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::fetcher::refresh::DEFAULT_WORKERS;
use crate::store::DEFAULT_ARTICLE_LIMIT;

#[derive(Parser)]
#[command(name = "driftline")]
#[command(about = "A personal RSS reader with AI summaries", long_about = None)]
pub struct Cli {
    /// Number of parallel workers for fetching feeds
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, global = true)]
    pub workers: usize,

    /// Path to the config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a feed and fetch it immediately
    Add {
        /// URL of the feed to add
        url: String,

        /// Display name for the feed (defaults to the URL)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Remove a feed from the config
    Remove {
        /// URL of the feed to remove
        url: String,

        /// Also delete the feed's stored articles
        #[arg(long)]
        purge: bool,
    },
    /// Fetch all configured feeds
    Refresh,
    /// List stored articles
    List {
        /// Only bookmarked articles
        #[arg(short, long, conflicts_with = "tag")]
        bookmarked: bool,

        /// Only unread articles
        #[arg(short, long, conflicts_with = "tag")]
        unread: bool,

        /// Only articles from this feed
        #[arg(short, long, conflicts_with = "tag")]
        feed: Option<String>,

        /// Substring match on title, description, and AI text
        #[arg(short, long, conflicts_with = "tag")]
        search: Option<String>,

        /// Only bookmarks carrying this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Maximum number of articles to show
        #[arg(short, long, default_value_t = DEFAULT_ARTICLE_LIMIT, conflicts_with = "tag")]
        limit: usize,
    },
    /// Show an article and mark it read
    Read {
        /// Article id
        id: String,
    },
    /// Toggle a bookmark, or set its tags and memo
    Bookmark {
        /// Article id
        id: String,

        /// Comma-separated tags (implies bookmarking)
        #[arg(short, long)]
        tags: Option<String>,

        /// Free-form note (implies bookmarking)
        #[arg(short, long)]
        memo: Option<String>,
    },
    /// List bookmark tags with counts
    Tags,
    /// List configured feeds with article counts
    Feeds,
    /// Show an AI digest of recent articles
    Digest {
        /// Window in days (defaults to config)
        #[arg(short, long)]
        days: Option<i64>,

        /// Maximum articles to cover (defaults to config)
        #[arg(short, long)]
        max: Option<usize>,

        /// Digest bookmarked articles only
        #[arg(long)]
        bookmarked_only: bool,
    },
    /// Show the AI insight for an article
    Insight {
        /// Article id
        id: String,
    },
    /// Translate an article into the configured language
    Translate {
        /// Article id
        id: String,

        /// Translate the stored text instead of title and description
        #[arg(long)]
        body: bool,
    },
}
