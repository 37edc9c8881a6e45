use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex length of an article identifier.
pub const ARTICLE_ID_LEN: usize = 16;

/// A stored article, as read back from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub feed_name: String,
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
    pub is_read: bool,
    pub is_bookmarked: bool,
    pub insight: Option<String>,
    pub translated_title: Option<String>,
    pub translated_desc: Option<String>,
    pub translated_body: Option<String>,
}

impl Article {
    /// Publication date if the feed provided one, otherwise the fetch time.
    pub fn display_date(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.fetched_at)
    }
}

/// A normalized entry ready for insertion.
///
/// Identifiers are content-addressed: the first [`ARTICLE_ID_LEN`] hex chars
/// of sha256 over `feed_name:guid`, where `guid` falls back to the entry link.
/// Re-fetching the same entry therefore reproduces the same id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArticle {
    pub id: String,
    pub feed_name: String,
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
}

impl NewArticle {
    pub fn new(feed_name: &str, guid_or_link: &str) -> Self {
        Self {
            id: Self::article_id(feed_name, guid_or_link),
            feed_name: feed_name.to_string(),
            title: String::new(),
            link: String::new(),
            description: None,
            published_at: None,
            fetched_at: Utc::now(),
        }
    }

    /// Derive the stable id for an entry of a feed.
    pub fn article_id(feed_name: &str, guid_or_link: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(feed_name.as_bytes());
        hasher.update(b":");
        hasher.update(guid_or_link.as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest[..ARTICLE_ID_LEN].to_string()
    }
}
