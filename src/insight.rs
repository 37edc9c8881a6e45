use std::time::Duration;

use crate::ai::{prompts, AiProvider};
use crate::app::{DriftlineError, Result};
use crate::domain::Article;
use crate::store::Store;

pub const INSIGHT_TIMEOUT: Duration = Duration::from_secs(30);

/// Return the stored insight for an article, generating and persisting one
/// on first request.
pub async fn get_or_generate<S: Store>(
    article: &Article,
    store: &S,
    provider: &dyn AiProvider,
    lang: &str,
    persona: &str,
) -> Result<String> {
    if let Some(ref insight) = article.insight {
        return Ok(insight.clone());
    }

    if !provider.is_available() {
        return Err(DriftlineError::AiUnavailable(provider.name().to_string()));
    }

    let prompt = prompts::insight_prompt(
        prompts::lang_name(lang),
        &article.title,
        article.description.as_deref(),
        persona,
    );
    let insight = provider
        .generate(&prompt, INSIGHT_TIMEOUT)
        .await
        .filter(|text| !text.is_empty())
        .ok_or(DriftlineError::AiGeneration)?;

    store.set_insight(&article.id, &insight)?;
    Ok(insight)
}
