//! # Driftline
//!
//! A personal RSS reader for the terminal, with AI summaries on tap.
//!
//! ## Architecture
//!
//! Driftline follows a modular pipeline architecture:
//!
//! ```text
//! Fetcher → Normalizer → Store ← Digest / Insight / Translate
//! ```
//!
//! - [`fetcher`]: HTTP client plus a bounded-concurrency refresher
//! - [`normalizer`]: Converts RSS/Atom feeds into stored articles with
//!   stable content-addressed ids
//! - [`store`]: SQLite persistence for articles, bookmarks, and digests
//! - [`ai`]: Pluggable providers (Claude CLI subprocess or Anthropic API)
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a feed
//! driftline add https://blog.rust-lang.org/feed.xml --name "Rust Blog"
//!
//! # Fetch everything
//! driftline refresh
//!
//! # Browse
//! driftline list --unread
//! driftline read a1b2c3d4e5f60718
//!
//! # AI features
//! driftline digest --days 7
//! driftline insight a1b2c3d4e5f60718
//! ```

/// AI provider abstraction and prompt construction.
///
/// - [`AiProvider`](ai::AiProvider): Async trait over text generation
/// - [`ClaudeCliProvider`](ai::claude_cli::ClaudeCliProvider): `claude -p` subprocess
/// - [`AnthropicProvider`](ai::anthropic::AnthropicProvider): Messages API over HTTPS
pub mod ai;

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// config, store, fetcher, refresher, normalizer, and AI provider.
pub mod app;

/// Command-line interface using clap.
///
/// Defines the CLI structure and subcommands:
/// - `add <url>` / `remove <url>` - Edit the feed list
/// - `refresh` - Fetch all feeds
/// - `list` / `read <id>` - Browse stored articles
/// - `bookmark <id>` / `tags` - Bookmarks, tags, and memos
/// - `digest` / `insight <id>` / `translate <id>` - AI features
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/driftline/config.toml`: feed list, output
/// language, reader persona, AI provider settings, digest defaults.
pub mod config;

/// Digest cache and generation.
///
/// Serves a cached digest when one from the same window is under a day
/// old, otherwise gathers recent articles and asks the provider for a
/// fresh one.
pub mod digest;

/// Core domain models.
///
/// - [`Article`](domain::Article): A stored entry with read/bookmark state
/// - [`NewArticle`](domain::NewArticle): A normalized entry keyed by a
///   content-addressed id
/// - [`Digest`](domain::Digest): A cached digest row
pub mod domain;

/// HTTP fetching and the parallel refresher.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for feed fetching
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`Refresher`](fetcher::refresh::Refresher): Concurrent refresh with semaphore
pub mod fetcher;

/// Per-article insight generation with write-through caching.
pub mod insight;

/// Feed parsing and normalization.
///
/// Converts RSS 0.9x/1.0/2.0 and Atom 0.3/1.0 into
/// [`NewArticle`](domain::NewArticle) structs with cleaned text.
pub mod normalizer;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Title, description, and body translation with per-article caching.
pub mod translate;
