use std::collections::BTreeMap;

use crate::app::{AppContext, DriftlineError, Result};
use crate::config::{self, FeedConfig};
use crate::digest;
use crate::domain::Article;
use crate::insight;
use crate::store::{ArticleFilter, Store};
use crate::translate;

pub async fn add_feed(ctx: &AppContext, url: &str, name: Option<String>) -> Result<()> {
    url::Url::parse(url)?;
    let name = name.unwrap_or_else(|| url.to_string());

    let feed = FeedConfig {
        url: url.to_string(),
        name: name.clone(),
    };
    if !config::add_feed(&ctx.config_path, feed)? {
        println!("Feed already configured: {}", url);
        return Ok(());
    }
    println!("Added feed: {}", url);

    // First fetch right away so the feed shows up without a refresh.
    let body = ctx.fetcher.fetch(url).await?;
    let (meta, articles) = ctx.normalizer.normalize(&name, &body)?;
    let count = ctx.store.upsert_articles(&articles)?;

    if let Some(title) = meta.title {
        println!("Feed title: {}", title);
    }
    println!("Fetched {} new articles", count);

    Ok(())
}

pub fn remove_feed(ctx: &AppContext, url: &str, purge: bool) -> Result<()> {
    let feed_name = ctx
        .config
        .feeds
        .iter()
        .find(|f| f.url == url)
        .map(|f| f.name.clone());

    if !config::remove_feed(&ctx.config_path, url)? {
        return Err(DriftlineError::FeedNotFound(url.to_string()));
    }
    println!("Removed feed: {}", url);

    if purge {
        if let Some(name) = feed_name {
            let deleted = ctx.store.delete_articles_by_feed(&name)?;
            println!("Deleted {} stored articles", deleted);
        }
    }

    Ok(())
}

pub async fn refresh(ctx: &AppContext) -> Result<()> {
    let feeds = ctx.config.feeds.clone();

    if feeds.is_empty() {
        println!("No feeds configured");
        return Ok(());
    }

    println!("Refreshing {} feeds...", feeds.len());

    let results = ctx
        .refresher
        .refresh_all(feeds, ctx.store.clone(), &ctx.normalizer)
        .await;

    let mut total_new = 0;
    let mut errors = 0;

    for (feed_name, result) in results {
        match result {
            Ok(count) => {
                total_new += count;
                if count > 0 {
                    println!("  {} new articles from {}", count, feed_name);
                }
            }
            Err(e) => {
                errors += 1;
                eprintln!("  Error refreshing {}: {}", feed_name, e);
            }
        }
    }

    println!(
        "Refresh complete: {} new articles, {} errors",
        total_new, errors
    );
    Ok(())
}

pub fn list_articles(
    ctx: &AppContext,
    bookmarked: bool,
    unread: bool,
    feed: Option<String>,
    search: Option<String>,
    tag: Option<String>,
    limit: usize,
) -> Result<()> {
    let articles = match tag {
        Some(tag) => ctx.store.get_articles_by_tag(&tag)?,
        None => {
            let filter = ArticleFilter {
                bookmarked_only: bookmarked,
                unread_only: unread,
                feed_name: feed,
                search,
                limit,
            };
            ctx.store.get_articles(&filter)?
        }
    };

    if articles.is_empty() {
        println!("No articles");
        return Ok(());
    }

    for article in &articles {
        print_article_line(article);
    }

    Ok(())
}

fn print_article_line(article: &Article) {
    let read_marker = if article.is_read { " " } else { "●" };
    let star = if article.is_bookmarked { "★" } else { " " };
    let date = article.display_date().format("%Y-%m-%d");
    let title = article
        .translated_title
        .as_deref()
        .unwrap_or(&article.title);

    println!(
        "{}{} {} {}  [{}] {}",
        read_marker, star, date, article.id, article.feed_name, title
    );
}

pub fn read_article(ctx: &AppContext, id: &str) -> Result<()> {
    let article = ctx
        .store
        .get_article(id)?
        .ok_or_else(|| DriftlineError::ArticleNotFound(id.to_string()))?;
    ctx.store.mark_read(id)?;

    println!("{}", article.title);
    if let Some(ref translated) = article.translated_title {
        println!("{}", translated);
    }
    println!();
    println!("  Feed: {}", article.feed_name);
    println!("  Date: {}", article.display_date().format("%Y-%m-%d %H:%M"));
    println!("  Link: {}", article.link);

    if let Some(ref desc) = article.description {
        if !desc.is_empty() {
            println!();
            println!("{}", desc);
        }
    }
    if let Some(ref translated) = article.translated_desc {
        if !translated.is_empty() {
            println!();
            println!("{}", translated);
        }
    }
    if let Some(ref insight) = article.insight {
        println!();
        println!("Insight: {}", insight);
    }

    if article.is_bookmarked {
        let tags = ctx.store.get_bookmark_tags(&article.id)?;
        if !tags.is_empty() {
            println!();
            println!("Tags: {}", tags.join(", "));
        }
        if let Some(memo) = ctx.store.get_bookmark_memo(&article.id)? {
            println!("Memo: {}", memo);
        }
    }

    Ok(())
}

pub fn bookmark(
    ctx: &AppContext,
    id: &str,
    tags: Option<String>,
    memo: Option<String>,
) -> Result<()> {
    let article = ctx
        .store
        .get_article(id)?
        .ok_or_else(|| DriftlineError::ArticleNotFound(id.to_string()))?;

    if tags.is_none() && memo.is_none() {
        let on = ctx.store.toggle_bookmark(id)?;
        if on {
            println!("Bookmarked: {}", article.title);
        } else {
            println!("Bookmark removed: {}", article.title);
        }
        return Ok(());
    }

    // Tags or a memo imply bookmarking.
    if !article.is_bookmarked {
        ctx.store.toggle_bookmark(id)?;
    }

    if let Some(ref raw) = tags {
        let tags = parse_tags(raw);
        ctx.store.set_bookmark_tags(id, &tags)?;
        if tags.is_empty() {
            println!("Tags cleared");
        } else {
            println!("Tags set: {}", tags.join(", "));
        }
    }
    if let Some(ref memo) = memo {
        ctx.store.set_bookmark_memo(id, memo)?;
        println!("Memo saved");
    }

    Ok(())
}

pub fn list_tags(ctx: &AppContext) -> Result<()> {
    let by_article = ctx.store.get_all_bookmark_tags()?;

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for tags in by_article.values() {
        for tag in tags {
            *counts.entry(tag.clone()).or_default() += 1;
        }
    }

    if counts.is_empty() {
        println!("No tags");
        return Ok(());
    }

    for (tag, count) in counts {
        println!("{} ({})", tag, count);
    }

    Ok(())
}

pub fn list_feeds(ctx: &AppContext) -> Result<()> {
    if ctx.config.feeds.is_empty() {
        println!("No feeds configured");
        return Ok(());
    }

    let counts = ctx.store.get_article_count_by_feed()?;

    for feed in &ctx.config.feeds {
        let count = counts.get(&feed.name).copied().unwrap_or(0);
        println!("{} ({} articles)\n  {}", feed.name, count, feed.url);
    }

    Ok(())
}

pub async fn run_digest(
    ctx: &AppContext,
    days: Option<i64>,
    max: Option<usize>,
    bookmarked_only: bool,
) -> Result<()> {
    let mut digest_config = ctx.config.digest.clone();
    if let Some(days) = days {
        digest_config.period_days = days;
    }
    if let Some(max) = max {
        digest_config.max_articles = max;
    }
    if bookmarked_only {
        digest_config.bookmarked_only = true;
    }

    let (content, count) = digest::get_or_generate(
        ctx.store.as_ref(),
        ctx.provider.as_ref(),
        &digest_config,
        &ctx.config.language,
    )
    .await?;

    println!("{}", content);
    println!();
    println!(
        "({} articles from the last {} days)",
        count, digest_config.period_days
    );
    Ok(())
}

pub async fn show_insight(ctx: &AppContext, id: &str) -> Result<()> {
    let article = ctx
        .store
        .get_article(id)?
        .ok_or_else(|| DriftlineError::ArticleNotFound(id.to_string()))?;

    let insight = insight::get_or_generate(
        &article,
        ctx.store.as_ref(),
        ctx.provider.as_ref(),
        &ctx.config.language,
        &ctx.config.persona,
    )
    .await?;

    println!("{}", article.title);
    println!();
    println!("{}", insight);
    Ok(())
}

pub async fn translate_article(ctx: &AppContext, id: &str, body: bool) -> Result<()> {
    let article = ctx
        .store
        .get_article(id)?
        .ok_or_else(|| DriftlineError::ArticleNotFound(id.to_string()))?;

    if body {
        let text = article.description.clone().unwrap_or_default();
        let translated = translate::translate_body(
            &article.id,
            &text,
            ctx.store.as_ref(),
            ctx.provider.as_ref(),
            &ctx.config.language,
        )
        .await?;
        println!("{}", translated);
        return Ok(());
    }

    let (title, desc) = translate::translate_meta(
        &article,
        ctx.store.as_ref(),
        ctx.provider.as_ref(),
        &ctx.config.language,
    )
    .await?;

    println!("{}", title);
    if !desc.is_empty() {
        println!();
        println!("{}", desc);
    }
    Ok(())
}

/// Split a comma-separated tag argument, dropping blanks.
fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
