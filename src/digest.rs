use chrono::{DateTime, Duration, Utc};

use crate::ai::{prompts, AiProvider};
use crate::app::{DriftlineError, Result};
use crate::config::DigestConfig;
use crate::domain::Digest;
use crate::store::Store;

/// Cached digests younger than this are served as-is.
const FRESHNESS_DAYS: i64 = 1;

pub const DIGEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(90);

fn is_fresh(digest: &Digest, now: DateTime<Utc>) -> bool {
    now - digest.created_at < Duration::days(FRESHNESS_DAYS)
}

/// Serve the cached digest for this window if it is fresh, otherwise gather
/// candidates, generate a new one, and persist it.
///
/// Returns the digest text and the number of articles it covers. When the
/// window holds no articles this fails before any provider call is made.
pub async fn get_or_generate<S: Store>(
    store: &S,
    provider: &dyn AiProvider,
    config: &DigestConfig,
    lang: &str,
) -> Result<(String, i64)> {
    get_or_generate_at(store, provider, config, lang, Utc::now()).await
}

pub(crate) async fn get_or_generate_at<S: Store>(
    store: &S,
    provider: &dyn AiProvider,
    config: &DigestConfig,
    lang: &str,
    now: DateTime<Utc>,
) -> Result<(String, i64)> {
    if let Some(cached) = store.get_latest_digest(config.period_days)? {
        if is_fresh(&cached, now) {
            tracing::debug!(
                "Serving cached digest for the {} day window",
                config.period_days
            );
            return Ok((cached.content, cached.article_count));
        }
    }

    let articles = if config.bookmarked_only {
        let mut articles = store.get_recent_bookmarked_articles(config.period_days)?;
        articles.truncate(config.max_articles);
        articles
    } else {
        store.get_recent_articles(config.period_days, config.max_articles)?
    };

    if articles.is_empty() {
        return Err(DriftlineError::NoArticles);
    }
    if !provider.is_available() {
        return Err(DriftlineError::AiUnavailable(provider.name().to_string()));
    }

    let prompt = prompts::digest_prompt(prompts::lang_name(lang), config.period_days, &articles);
    let content = provider
        .generate(&prompt, DIGEST_TIMEOUT)
        .await
        .filter(|c| !c.is_empty())
        .ok_or(DriftlineError::AiGeneration)?;

    let count = articles.len() as i64;
    store.save_digest(config.period_days, count, &content)?;

    Ok((content, count))
}
