use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached AI digest for one trailing window.
///
/// Digests are keyed by `period_days`; windows of different lengths never
/// serve each other's cache entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Digest {
    pub id: i64,
    pub period_days: i64,
    pub article_count: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
