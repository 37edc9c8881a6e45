use std::time::Duration;

use crate::ai::{prompts, AiProvider};
use crate::app::{DriftlineError, Result};
use crate::domain::Article;
use crate::store::Store;

pub const META_TIMEOUT: Duration = Duration::from_secs(30);
pub const BODY_TIMEOUT: Duration = Duration::from_secs(60);

/// Body text is capped before prompting; longer articles are translated
/// up to this many chars.
const BODY_CHAR_LIMIT: usize = 10_000;

/// Translate an article's title and description together, serving and
/// filling the per-article cache.
pub async fn translate_meta<S: Store>(
    article: &Article,
    store: &S,
    provider: &dyn AiProvider,
    lang: &str,
) -> Result<(String, String)> {
    if let Some(ref title) = article.translated_title {
        let desc = article.translated_desc.clone().unwrap_or_default();
        return Ok((title.clone(), desc));
    }

    check_language(lang)?;
    if !provider.is_available() {
        return Err(DriftlineError::AiUnavailable(provider.name().to_string()));
    }

    let prompt = prompts::translate_meta_prompt(
        prompts::lang_name(lang),
        &article.title,
        article.description.as_deref(),
    );
    let output = provider
        .generate(&prompt, META_TIMEOUT)
        .await
        .filter(|text| !text.is_empty())
        .ok_or(DriftlineError::AiGeneration)?;

    let (title, desc) = parse_meta_output(&output, &article.title);
    store.set_translation(&article.id, &title, &desc)?;

    Ok((title, desc))
}

/// Translate article text, serving and filling the translated-body cache.
pub async fn translate_body<S: Store>(
    article_id: &str,
    text: &str,
    store: &S,
    provider: &dyn AiProvider,
    lang: &str,
) -> Result<String> {
    if let Some(cached) = store.get_translated_body(article_id)? {
        return Ok(cached);
    }

    if text.trim().is_empty() {
        return Err(DriftlineError::Config("nothing to translate".to_string()));
    }
    check_language(lang)?;
    if !provider.is_available() {
        return Err(DriftlineError::AiUnavailable(provider.name().to_string()));
    }

    let capped: String = text.chars().take(BODY_CHAR_LIMIT).collect();
    let prompt = prompts::translate_body_prompt(prompts::lang_name(lang), &capped);
    let translated = provider
        .generate(&prompt, BODY_TIMEOUT)
        .await
        .filter(|t| !t.is_empty())
        .ok_or(DriftlineError::AiGeneration)?;

    store.set_translated_body(article_id, &translated)?;
    Ok(translated)
}

fn check_language(lang: &str) -> Result<()> {
    if !prompts::is_translatable(lang) {
        return Err(DriftlineError::Config(format!(
            "no translation target for language '{}'",
            lang
        )));
    }
    Ok(())
}

/// Pick the translated title and description out of the model output.
///
/// The prompt asks for fixed `Title:` / `Description:` lines; models
/// sometimes answer with bare text, in which case the first line stands in
/// for the title, or the original title when even that is unusable.
fn parse_meta_output(output: &str, fallback_title: &str) -> (String, String) {
    let mut title = String::new();
    let mut desc = String::new();

    for line in output.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(prompts::TRANSLATE_TITLE_KEY) {
            title = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix(prompts::TRANSLATE_DESC_KEY) {
            desc = rest.trim().to_string();
        }
    }

    if title.is_empty() {
        let first_line = output.lines().next().unwrap_or("").trim();
        let key_only = first_line.is_empty()
            || first_line == prompts::TRANSLATE_TITLE_KEY
            || first_line == prompts::TRANSLATE_TITLE_KEY.trim_end_matches(':');
        title = if key_only {
            fallback_title.to_string()
        } else {
            first_line.to_string()
        };
    }

    (title, desc)
}
