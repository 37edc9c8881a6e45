//! Prompt templates for insight, translation, and digest generation.
//!
//! Prompts are written in English with the output language injected, which
//! keeps instruction-following stable across target languages.

use crate::domain::Article;

/// Placeholder for absent article fields inside prompts.
pub const NONE_TEXT: &str = "(none)";

/// Languages the translator will target. English is the source language
/// and is never a target.
pub const TRANSLATABLE_LANGS: [&str; 5] = ["ko", "ja", "zh-CN", "es", "de"];

/// Line keys the metadata translation is asked to emit.
pub const TRANSLATE_TITLE_KEY: &str = "Title:";
pub const TRANSLATE_DESC_KEY: &str = "Description:";

pub fn is_translatable(code: &str) -> bool {
    TRANSLATABLE_LANGS.contains(&code)
}

/// Human-readable language name used in prompts. Unknown codes pass through.
pub fn lang_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "ko" => "Korean",
        "ja" => "Japanese",
        "zh-CN" => "Simplified Chinese",
        "es" => "Spanish",
        "de" => "German",
        other => other,
    }
}

pub fn insight_prompt(
    output_language: &str,
    title: &str,
    description: Option<&str>,
    persona: &str,
) -> String {
    let description = description.unwrap_or(NONE_TEXT);
    let profile = if persona.is_empty() {
        String::new()
    } else {
        format!(
            "\n<reader_profile>\n{persona}\n</reader_profile>\n\
             Tailor the insight to this reader's interests and experience.\n"
        )
    };

    format!(
        "You are an intelligent reader analyzing an article.\n\n\
         Based on the title and description below, write a sharp, opinionated insight in 1-2 sentences.\n\n\
         Focus on WHY this matters: the practical impact, hidden implications, or what readers should watch out for.\n\
         Do NOT restate the title or summarize. Add your own analytical perspective.\n\
         Keep technical terms as-is. Respond in {output_language}.\n\
         {profile}\n\
         <article>\n\
         <title>{title}</title>\n\
         <description>{description}</description>\n\
         </article>"
    )
}

pub fn translate_meta_prompt(output_language: &str, title: &str, description: Option<&str>) -> String {
    let description = description.unwrap_or(NONE_TEXT);

    format!(
        "Translate the article title and description below into {output_language}.\n\
         Keep technical terms, product names, and acronyms as-is.\n\
         Output exactly two lines in this format, with no extra commentary:\n\
         {TRANSLATE_TITLE_KEY} <translated title>\n\
         {TRANSLATE_DESC_KEY} <translated description>\n\n\
         <article>\n\
         <title>{title}</title>\n\
         <description>{description}</description>\n\
         </article>"
    )
}

pub fn translate_body_prompt(output_language: &str, text: &str) -> String {
    format!(
        "Translate the following article text into {output_language}.\n\
         Keep technical terms as-is and preserve paragraph breaks.\n\
         Output only the translation.\n\n\
         {text}"
    )
}

pub fn digest_prompt(output_language: &str, period_days: i64, articles: &[Article]) -> String {
    let listing = articles
        .iter()
        .map(digest_item)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an intelligent reader summarizing a period of reading.\n\n\
         Below are articles collected over the last {period_days} days. Write a digest in {output_language}:\n\n\
         1. Group the major themes, naming the key articles under each.\n\
         2. Call out the most important takeaways.\n\
         3. End with anything worth following up on.\n\n\
         Keep technical terms as-is. Do not invent articles that are not listed.\n\n\
         <articles>\n\
         {listing}\n\
         </articles>"
    )
}

fn digest_item(article: &Article) -> String {
    let date = article.display_date().format("%Y-%m-%d");
    let description = article.description.as_deref().unwrap_or(NONE_TEXT);
    let insight = article.insight.as_deref().unwrap_or(NONE_TEXT);

    format!(
        "- Title: {}\n  Feed: {}\n  Date: {}\n  Description: {}\n  Insight: {}",
        article.title, article.feed_name, date, description, insight
    )
}
