use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use driftline::app::AppContext;
use driftline::cli::{commands, Cli, Commands};
use driftline::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config_path = match cli.config.clone() {
        Some(p) => p,
        None => Config::default_config_path()?,
    };
    let config = Config::load_from(&config_path)?;
    let ctx = AppContext::with_workers(config, config_path, cli.workers)?;

    match cli.command {
        Commands::Add { url, name } => {
            commands::add_feed(&ctx, &url, name).await?;
        }
        Commands::Remove { url, purge } => {
            commands::remove_feed(&ctx, &url, purge)?;
        }
        Commands::Refresh => {
            commands::refresh(&ctx).await?;
        }
        Commands::List {
            bookmarked,
            unread,
            feed,
            search,
            tag,
            limit,
        } => {
            commands::list_articles(&ctx, bookmarked, unread, feed, search, tag, limit)?;
        }
        Commands::Read { id } => {
            commands::read_article(&ctx, &id)?;
        }
        Commands::Bookmark { id, tags, memo } => {
            commands::bookmark(&ctx, &id, tags, memo)?;
        }
        Commands::Tags => {
            commands::list_tags(&ctx)?;
        }
        Commands::Feeds => {
            commands::list_feeds(&ctx)?;
        }
        Commands::Digest {
            days,
            max,
            bookmarked_only,
        } => {
            commands::run_digest(&ctx, days, max, bookmarked_only).await?;
        }
        Commands::Insight { id } => {
            commands::show_insight(&ctx, &id).await?;
        }
        Commands::Translate { id, body } => {
            commands::translate_article(&ctx, &id, body).await?;
        }
    }

    Ok(())
}
