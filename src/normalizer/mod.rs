use chrono::Utc;
use feed_rs::parser;
use html_escape::decode_html_entities;
use regex::Regex;

use crate::app::{DriftlineError, Result};
use crate::domain::NewArticle;

/// Title stored when a feed entry has none.
pub const UNTITLED: &str = "(Untitled)";

/// Descriptions are plain text, cut at a char boundary past this length.
const DESCRIPTION_LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct FeedMeta {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct Normalizer {
    tag_re: Regex,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            tag_re: Regex::new(r"<[^>]+>").expect("Failed to compile tag regex"),
        }
    }

    pub fn normalize(&self, feed_name: &str, body: &[u8]) -> Result<(FeedMeta, Vec<NewArticle>)> {
        // Entries without a guid are keyed by their link, never a generated
        // value, so re-fetching reproduces the same article ids.
        let parser = parser::Builder::new()
            .id_generator(|links, _title, _uri| {
                links.first().map(|l| l.href.clone()).unwrap_or_default()
            })
            .build();
        let feed = parser
            .parse(body)
            .map_err(|e| DriftlineError::FeedParse(e.to_string()))?;

        let meta = FeedMeta {
            title: feed.title.map(|t| decode_html_entities(&t.content).to_string()),
            description: feed
                .description
                .map(|d| decode_html_entities(&d.content).to_string()),
        };

        let articles: Vec<NewArticle> = feed
            .entries
            .into_iter()
            .map(|entry| {
                let link = entry.links.first().map(|l| l.href.clone());
                let guid_or_link = if entry.id.is_empty() {
                    link.clone().unwrap_or_default()
                } else {
                    entry.id.clone()
                };

                let mut article = NewArticle::new(feed_name, &guid_or_link);
                article.title = entry
                    .title
                    .map(|t| decode_html_entities(t.content.trim()).to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| UNTITLED.to_string());
                article.link = link.unwrap_or_default();
                article.description = entry
                    .summary
                    .map(|s| self.clean_description(&s.content))
                    .filter(|d| !d.is_empty());
                article.published_at = entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.with_timezone(&Utc));

                article
            })
            .collect();

        Ok((meta, articles))
    }

    fn clean_description(&self, raw: &str) -> String {
        let stripped = self.tag_re.replace_all(raw, "");
        let decoded = decode_html_entities(stripped.as_ref());
        let text = decoded.trim();

        if text.chars().count() > DESCRIPTION_LIMIT {
            let capped: String = text.chars().take(DESCRIPTION_LIMIT).collect();
            format!("{}...", capped)
        } else {
            text.to_string()
        }
    }
}
