pub mod sqlite;

use std::collections::HashMap;

use crate::app::Result;
use crate::domain::{Article, Digest, NewArticle};

pub use sqlite::SqliteStore;

/// Cap applied to filtered listings when the caller does not ask for one.
pub const DEFAULT_ARTICLE_LIMIT: usize = 200;

/// Filter criteria for [`Store::get_articles`].
///
/// All set criteria are ANDed together. Tag lookups are a separate path,
/// see [`Store::get_articles_by_tag`].
#[derive(Debug, Clone)]
pub struct ArticleFilter {
    pub bookmarked_only: bool,
    pub unread_only: bool,
    pub feed_name: Option<String>,
    pub search: Option<String>,
    pub limit: usize,
}

impl Default for ArticleFilter {
    fn default() -> Self {
        Self {
            bookmarked_only: false,
            unread_only: false,
            feed_name: None,
            search: None,
            limit: DEFAULT_ARTICLE_LIMIT,
        }
    }
}

pub trait Store {
    // Article operations
    fn upsert_article(&self, article: &NewArticle) -> Result<bool>;
    fn upsert_articles(&self, articles: &[NewArticle]) -> Result<usize>;
    fn get_article(&self, id: &str) -> Result<Option<Article>>;
    fn get_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>>;
    fn mark_read(&self, id: &str) -> Result<()>;
    fn delete_articles_by_feed(&self, feed_name: &str) -> Result<usize>;

    // AI result caching
    fn set_insight(&self, id: &str, insight: &str) -> Result<()>;
    fn set_translation(&self, id: &str, title: &str, desc: &str) -> Result<()>;
    fn set_translated_body(&self, id: &str, body: &str) -> Result<()>;
    fn get_translated_body(&self, id: &str) -> Result<Option<String>>;

    // Bookmark operations
    fn toggle_bookmark(&self, id: &str) -> Result<bool>;
    fn set_bookmark_memo(&self, id: &str, memo: &str) -> Result<()>;
    fn get_bookmark_memo(&self, id: &str) -> Result<Option<String>>;
    fn get_recent_bookmarked_articles(&self, days: i64) -> Result<Vec<Article>>;

    // Tag operations
    fn set_bookmark_tags(&self, id: &str, tags: &[String]) -> Result<()>;
    fn get_bookmark_tags(&self, id: &str) -> Result<Vec<String>>;
    fn get_all_tags(&self) -> Result<Vec<String>>;
    fn get_articles_by_tag(&self, tag: &str) -> Result<Vec<Article>>;
    fn get_all_bookmark_tags(&self) -> Result<HashMap<String, Vec<String>>>;
    fn get_all_bookmark_memos(&self) -> Result<HashMap<String, String>>;

    // Aggregates and windows
    fn get_article_count_by_feed(&self) -> Result<HashMap<String, i64>>;
    fn get_recent_articles(&self, days: i64, limit: usize) -> Result<Vec<Article>>;

    // Digest cache
    fn save_digest(&self, period_days: i64, article_count: i64, content: &str) -> Result<i64>;
    fn get_latest_digest(&self, period_days: i64) -> Result<Option<Digest>>;
}
