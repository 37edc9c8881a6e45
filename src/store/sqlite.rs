use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, ToSql};
use rusqlite_migration::{Migrations, M};

use crate::app::{DriftlineError, Result};
use crate::domain::{Article, Digest, NewArticle};
use crate::store::{ArticleFilter, Store};

/// Timestamps are stored in the same shape SQLite's CURRENT_TIMESTAMP
/// produces, so string comparison against `datetime('now', ...)` stays valid.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BUSY_TIMEOUT_MS: u64 = 5000;

const ARTICLE_COLUMNS: &str = "id, feed_name, title, link, description, published_at, fetched_at, \
     is_read, is_bookmarked, insight, translated_title, translated_desc, translated_body";

const ARTICLE_COLUMNS_QUALIFIED: &str =
    "a.id, a.feed_name, a.title, a.link, a.description, a.published_at, a.fetched_at, \
     a.is_read, a.is_bookmarked, a.insight, a.translated_title, a.translated_desc, a.translated_body";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(&path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        harden_permissions(path.as_ref());
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![
            M::up(include_str!("../../migrations/001-initial/up.sql")),
            M::up(include_str!("../../migrations/002-digests/up.sql")),
        ]);

        let mut conn = self.conn()?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| DriftlineError::Database(rusqlite::Error::InvalidQuery))?;

        Self::ensure_columns(&conn)?;
        Self::ensure_indexes(&conn)?;

        Ok(())
    }

    /// Add columns that later releases introduced. Runs on every open so a
    /// database created by any earlier version comes up to date in place.
    fn ensure_columns(conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare("PRAGMA table_info(articles)")?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for column in ["translated_title", "translated_desc", "translated_body"] {
            if !columns.iter().any(|c| c == column) {
                conn.execute(
                    &format!("ALTER TABLE articles ADD COLUMN {} TEXT", column),
                    [],
                )?;
            }
        }

        Ok(())
    }

    fn ensure_indexes(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_articles_published
             ON articles(published_at DESC, fetched_at DESC)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_articles_feed
             ON articles(feed_name, published_at DESC)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_articles_read
             ON articles(is_read, published_at DESC)",
            [],
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DriftlineError::LockPoisoned)
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        for format in [DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Some(dt.and_utc());
            }
        }
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }

    fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.format(DATETIME_FORMAT).to_string()
    }

    fn row_to_article(row: &Row<'_>) -> rusqlite::Result<Article> {
        Ok(Article {
            id: row.get(0)?,
            feed_name: row.get(1)?,
            title: row.get(2)?,
            link: row.get(3)?,
            description: row.get(4)?,
            published_at: row
                .get::<_, Option<String>>(5)?
                .and_then(|s| Self::parse_datetime(&s)),
            fetched_at: row
                .get::<_, String>(6)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            is_read: row.get::<_, i32>(7)? != 0,
            is_bookmarked: row.get::<_, i32>(8)? != 0,
            insight: row.get(9)?,
            translated_title: row.get(10)?,
            translated_desc: row.get(11)?,
            translated_body: row.get(12)?,
        })
    }
}

/// Escape LIKE wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn harden_permissions(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
            tracing::warn!(
                "Failed to restrict permissions on {}: {}",
                path.display(),
                e
            );
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

impl Store for SqliteStore {
    fn upsert_article(&self, article: &NewArticle) -> Result<bool> {
        let conn = self.conn()?;

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO articles
             (id, feed_name, title, link, description, published_at, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                article.id,
                article.feed_name,
                article.title,
                article.link,
                article.description,
                article.published_at.as_ref().map(Self::format_datetime),
                Self::format_datetime(&article.fetched_at),
            ],
        )?;

        Ok(inserted > 0)
    }

    fn upsert_articles(&self, articles: &[NewArticle]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for article in articles {
            count += tx.execute(
                "INSERT OR IGNORE INTO articles
                 (id, feed_name, title, link, description, published_at, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    article.id,
                    article.feed_name,
                    article.title,
                    article.link,
                    article.description,
                    article.published_at.as_ref().map(Self::format_datetime),
                    Self::format_datetime(&article.fetched_at),
                ],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    fn get_article(&self, id: &str) -> Result<Option<Article>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                &format!("SELECT {} FROM articles WHERE id = ?1", ARTICLE_COLUMNS),
                params![id],
                Self::row_to_article,
            )
            .optional()?;

        Ok(result)
    }

    fn get_articles(&self, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM articles WHERE 1=1", ARTICLE_COLUMNS);
        let mut bound: Vec<Box<dyn ToSql>> = Vec::new();

        if filter.bookmarked_only {
            sql.push_str(" AND is_bookmarked = 1");
        }
        if filter.unread_only {
            sql.push_str(" AND is_read = 0");
        }
        if let Some(ref feed_name) = filter.feed_name {
            sql.push_str(" AND feed_name = ?");
            bound.push(Box::new(feed_name.clone()));
        }
        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", escape_like(search));
            sql.push_str(
                " AND (title LIKE ? ESCAPE '\\' OR description LIKE ? ESCAPE '\\' \
                 OR insight LIKE ? ESCAPE '\\' OR translated_title LIKE ? ESCAPE '\\' \
                 OR translated_desc LIKE ? ESCAPE '\\')",
            );
            for _ in 0..5 {
                bound.push(Box::new(pattern.clone()));
            }
        }

        sql.push_str(" ORDER BY published_at DESC, fetched_at DESC LIMIT ?");
        bound.push(Box::new(filter.limit as i64));

        let mut stmt = conn.prepare(&sql)?;
        let articles = stmt
            .query_map(params_from_iter(&bound), Self::row_to_article)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(articles)
    }

    fn mark_read(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE articles SET is_read = 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    fn delete_articles_by_feed(&self, feed_name: &str) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        // Bookmarks reference articles, so children go first.
        tx.execute(
            "DELETE FROM bookmarks WHERE article_id IN
             (SELECT id FROM articles WHERE feed_name = ?1)",
            params![feed_name],
        )?;
        let deleted = tx.execute(
            "DELETE FROM articles WHERE feed_name = ?1",
            params![feed_name],
        )?;

        tx.commit()?;
        Ok(deleted)
    }

    fn set_insight(&self, id: &str, insight: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE articles SET insight = ?1 WHERE id = ?2",
            params![insight, id],
        )?;
        Ok(())
    }

    fn set_translation(&self, id: &str, title: &str, desc: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE articles SET translated_title = ?1, translated_desc = ?2 WHERE id = ?3",
            params![title, desc, id],
        )?;
        Ok(())
    }

    fn set_translated_body(&self, id: &str, body: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE articles SET translated_body = ?1 WHERE id = ?2",
            params![body, id],
        )?;
        Ok(())
    }

    fn get_translated_body(&self, id: &str) -> Result<Option<String>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                "SELECT translated_body FROM articles WHERE id = ?1",
                params![id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;

        Ok(result.flatten())
    }

    fn toggle_bookmark(&self, id: &str) -> Result<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let current = tx
            .query_row(
                "SELECT is_bookmarked FROM articles WHERE id = ?1",
                params![id],
                |row| row.get::<_, i32>(0),
            )
            .optional()?;

        // Unknown ids are a silent no-op, mirroring the flag they would report.
        let current = match current {
            Some(value) => value,
            None => return Ok(false),
        };

        let new_state = current == 0;

        // The flag and the satellite row move together in one transaction.
        tx.execute(
            "UPDATE articles SET is_bookmarked = ?1 WHERE id = ?2",
            params![new_state as i32, id],
        )?;
        if new_state {
            tx.execute(
                "INSERT INTO bookmarks (article_id) VALUES (?1)",
                params![id],
            )?;
        } else {
            tx.execute(
                "DELETE FROM bookmarks WHERE article_id = ?1",
                params![id],
            )?;
        }

        tx.commit()?;
        Ok(new_state)
    }

    fn set_bookmark_memo(&self, id: &str, memo: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE bookmarks SET memo = ?1 WHERE article_id = ?2",
            params![memo, id],
        )?;
        Ok(())
    }

    fn get_bookmark_memo(&self, id: &str) -> Result<Option<String>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                "SELECT memo FROM bookmarks WHERE article_id = ?1",
                params![id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;

        Ok(result.flatten())
    }

    fn get_recent_bookmarked_articles(&self, days: i64) -> Result<Vec<Article>> {
        let conn = self.conn()?;
        let window = format!("-{} days", days);

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM articles a
             JOIN bookmarks b ON a.id = b.article_id
             WHERE b.bookmarked_at >= datetime('now', ?1)
             ORDER BY b.bookmarked_at DESC, b.id DESC",
            ARTICLE_COLUMNS_QUALIFIED
        ))?;
        let articles = stmt
            .query_map(params![window], Self::row_to_article)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(articles)
    }

    fn set_bookmark_tags(&self, id: &str, tags: &[String]) -> Result<()> {
        let joined = tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(",");
        let value = if joined.is_empty() { None } else { Some(joined) };

        let conn = self.conn()?;
        conn.execute(
            "UPDATE bookmarks SET tags = ?1 WHERE article_id = ?2",
            params![value, id],
        )?;
        Ok(())
    }

    fn get_bookmark_tags(&self, id: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;

        let raw = conn
            .query_row(
                "SELECT tags FROM bookmarks WHERE article_id = ?1",
                params![id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();

        Ok(raw.map(|t| split_tags(&t)).unwrap_or_default())
    }

    fn get_all_tags(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;

        let mut stmt =
            conn.prepare("SELECT tags FROM bookmarks WHERE tags IS NOT NULL AND tags != ''")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut tags = BTreeSet::new();
        for row in rows {
            tags.extend(split_tags(&row?));
        }

        Ok(tags.into_iter().collect())
    }

    fn get_articles_by_tag(&self, tag: &str) -> Result<Vec<Article>> {
        let conn = self.conn()?;

        // Tags are stored comma-joined without spaces, so an exact tag is
        // either the whole value or bounded by commas. "py" must not match
        // a stored "python".
        let prefix = format!("{},%", tag);
        let interior = format!("%,{},%", tag);
        let suffix = format!("%,{}", tag);

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM articles a
             JOIN bookmarks b ON a.id = b.article_id
             WHERE b.tags = ?1 OR b.tags LIKE ?2 OR b.tags LIKE ?3 OR b.tags LIKE ?4
             ORDER BY a.published_at DESC, a.fetched_at DESC",
            ARTICLE_COLUMNS_QUALIFIED
        ))?;
        let articles = stmt
            .query_map(
                params![tag, prefix, interior, suffix],
                Self::row_to_article,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(articles)
    }

    fn get_all_bookmark_tags(&self) -> Result<HashMap<String, Vec<String>>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT article_id, tags FROM bookmarks WHERE tags IS NOT NULL AND tags != ''",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut map = HashMap::new();
        for row in rows {
            let (article_id, raw) = row?;
            map.insert(article_id, split_tags(&raw));
        }

        Ok(map)
    }

    fn get_all_bookmark_memos(&self) -> Result<HashMap<String, String>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT article_id, memo FROM bookmarks WHERE memo IS NOT NULL AND memo != ''",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let memos = rows.collect::<std::result::Result<HashMap<_, _>, _>>()?;
        Ok(memos)
    }

    fn get_article_count_by_feed(&self) -> Result<HashMap<String, i64>> {
        let conn = self.conn()?;

        let mut stmt =
            conn.prepare("SELECT feed_name, COUNT(*) FROM articles GROUP BY feed_name")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let counts = rows.collect::<std::result::Result<HashMap<_, _>, _>>()?;
        Ok(counts)
    }

    fn get_recent_articles(&self, days: i64, limit: usize) -> Result<Vec<Article>> {
        let conn = self.conn()?;
        let window = format!("-{} days", days);

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM articles
             WHERE COALESCE(published_at, fetched_at) >= datetime('now', ?1)
             ORDER BY published_at DESC, fetched_at DESC LIMIT ?2",
            ARTICLE_COLUMNS
        ))?;
        let articles = stmt
            .query_map(params![window, limit as i64], Self::row_to_article)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(articles)
    }

    fn save_digest(&self, period_days: i64, article_count: i64, content: &str) -> Result<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO digests (period_days, article_count, content) VALUES (?1, ?2, ?3)",
            params![period_days, article_count, content],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn get_latest_digest(&self, period_days: i64) -> Result<Option<Digest>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                "SELECT id, period_days, article_count, content, created_at FROM digests
                 WHERE period_days = ?1
                 ORDER BY created_at DESC, id DESC LIMIT 1",
                params![period_days],
                |row| {
                    Ok(Digest {
                        id: row.get(0)?,
                        period_days: row.get(1)?,
                        article_count: row.get(2)?,
                        content: row.get(3)?,
                        created_at: row
                            .get::<_, String>(4)
                            .ok()
                            .and_then(|s| Self::parse_datetime(&s))
                            .unwrap_or_else(Utc::now),
                    })
                },
            )
            .optional()?;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn sample(feed: &str, guid: &str, title: &str) -> NewArticle {
        let mut article = NewArticle::new(feed, guid);
        article.title = title.to_string();
        article.link = format!("https://example.com/{}", guid);
        article
    }

    fn dated(feed: &str, guid: &str, title: &str, published: &str, fetched: &str) -> NewArticle {
        let mut article = sample(feed, guid, title);
        article.published_at = Some(
            NaiveDateTime::parse_from_str(published, DATETIME_FORMAT)
                .unwrap()
                .and_utc(),
        );
        article.fetched_at = NaiveDateTime::parse_from_str(fetched, DATETIME_FORMAT)
            .unwrap()
            .and_utc();
        article
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        let article = sample("feed", "guid-1", "First post");

        assert!(store.upsert_article(&article).unwrap());
        assert!(!store.upsert_article(&article).unwrap());

        let articles = store.get_articles(&ArticleFilter::default()).unwrap();
        assert_eq!(articles.len(), 1);
    }

    #[test]
    fn test_upsert_does_not_overwrite() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_article(&sample("feed", "guid-1", "Original title"))
            .unwrap();

        let mut updated = sample("feed", "guid-1", "Edited title");
        updated.description = Some("new description".to_string());
        assert!(!store.upsert_article(&updated).unwrap());

        let stored = store.get_article(&updated.id).unwrap().unwrap();
        assert_eq!(stored.title, "Original title");
        assert!(stored.description.is_none());
    }

    #[test]
    fn test_upsert_articles_counts_only_new() {
        let store = SqliteStore::in_memory().unwrap();
        let batch = vec![
            sample("feed", "g1", "One"),
            sample("feed", "g2", "Two"),
            sample("feed", "g3", "Three"),
        ];

        assert_eq!(store.upsert_articles(&batch).unwrap(), 3);
        assert_eq!(store.upsert_articles(&batch).unwrap(), 0);

        let mut extended = batch;
        extended.push(sample("feed", "g4", "Four"));
        assert_eq!(store.upsert_articles(&extended).unwrap(), 1);
    }

    #[test]
    fn test_get_article_nonexistent() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_article("missing").unwrap().is_none());
    }

    #[test]
    fn test_mark_read() {
        let store = SqliteStore::in_memory().unwrap();
        let article = sample("feed", "g1", "One");
        store.upsert_article(&article).unwrap();

        store.mark_read(&article.id).unwrap();

        let stored = store.get_article(&article.id).unwrap().unwrap();
        assert!(stored.is_read);

        let filter = ArticleFilter {
            unread_only: true,
            ..Default::default()
        };
        assert!(store.get_articles(&filter).unwrap().is_empty());
    }

    #[test]
    fn test_toggle_bookmark_keeps_flag_and_row_consistent() {
        let store = SqliteStore::in_memory().unwrap();
        let article = sample("feed", "g1", "One");
        store.upsert_article(&article).unwrap();

        assert!(store.toggle_bookmark(&article.id).unwrap());
        let stored = store.get_article(&article.id).unwrap().unwrap();
        assert!(stored.is_bookmarked);
        store.set_bookmark_memo(&article.id, "worth rereading").unwrap();
        assert_eq!(
            store.get_bookmark_memo(&article.id).unwrap().as_deref(),
            Some("worth rereading")
        );

        assert!(!store.toggle_bookmark(&article.id).unwrap());
        let stored = store.get_article(&article.id).unwrap().unwrap();
        assert!(!stored.is_bookmarked);
        // The satellite row went with the flag.
        assert!(store.get_bookmark_memo(&article.id).unwrap().is_none());
        assert!(store.get_bookmark_tags(&article.id).unwrap().is_empty());
    }

    #[test]
    fn test_toggle_bookmark_missing_article_is_noop() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(!store.toggle_bookmark("does-not-exist").unwrap());
        assert!(store
            .get_recent_bookmarked_articles(7)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_filters_combine_with_and() {
        let store = SqliteStore::in_memory().unwrap();
        let a = sample("alpha", "g1", "Alpha unread");
        let b = sample("alpha", "g2", "Alpha read");
        let c = sample("beta", "g3", "Beta unread");
        store.upsert_articles(&[a.clone(), b.clone(), c]).unwrap();
        store.mark_read(&b.id).unwrap();
        store.toggle_bookmark(&a.id).unwrap();
        store.toggle_bookmark(&b.id).unwrap();

        let filter = ArticleFilter {
            bookmarked_only: true,
            unread_only: true,
            feed_name: Some("alpha".to_string()),
            ..Default::default()
        };
        let articles = store.get_articles(&filter).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, a.id);
    }

    #[test]
    fn test_search_matches_literal_wildcards() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_article(&sample("feed", "g1", "100% Pure Python"))
            .unwrap();
        store
            .upsert_article(&sample("feed", "g2", "Python Tips"))
            .unwrap();

        let search = |needle: &str| {
            let filter = ArticleFilter {
                search: Some(needle.to_string()),
                ..Default::default()
            };
            store.get_articles(&filter).unwrap()
        };

        assert_eq!(search("Python").len(), 2);
        // "%" is data here, not a wildcard.
        let percent = search("%");
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].title, "100% Pure Python");
        assert_eq!(search("100% Pure").len(), 1);
    }

    #[test]
    fn test_search_escapes_underscore() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_article(&sample("feed", "g1", "snake_case notes"))
            .unwrap();
        store
            .upsert_article(&sample("feed", "g2", "snakeXcase notes"))
            .unwrap();

        let filter = ArticleFilter {
            search: Some("snake_case".to_string()),
            ..Default::default()
        };
        let articles = store.get_articles(&filter).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "snake_case notes");
    }

    #[test]
    fn test_search_scans_insight_and_translations() {
        let store = SqliteStore::in_memory().unwrap();
        let article = sample("feed", "g1", "Benchmarks");
        store.upsert_article(&article).unwrap();
        store
            .set_insight(&article.id, "a quantum leap for parser throughput")
            .unwrap();
        store
            .set_translation(&article.id, "벤치마크", "파서 처리량")
            .unwrap();

        let search = |needle: &str| {
            let filter = ArticleFilter {
                search: Some(needle.to_string()),
                ..Default::default()
            };
            store.get_articles(&filter).unwrap().len()
        };

        assert_eq!(search("quantum"), 1);
        assert_eq!(search("벤치마크"), 1);
        assert_eq!(search("처리량"), 1);
        assert_eq!(search("nowhere"), 0);
    }

    #[test]
    fn test_ordering_published_desc_then_fetched_desc() {
        let store = SqliteStore::in_memory().unwrap();
        let january = dated("f", "g1", "January", "2024-01-15 08:00:00", "2024-01-15 09:00:00");
        let march = dated("f", "g2", "March", "2024-03-10 08:00:00", "2024-03-10 09:00:00");
        let february = dated("f", "g3", "February", "2024-02-20 08:00:00", "2024-02-20 09:00:00");
        let mut undated_late = sample("f", "g4", "Undated late");
        undated_late.fetched_at = NaiveDateTime::parse_from_str("2024-06-01 12:00:00", DATETIME_FORMAT)
            .unwrap()
            .and_utc();
        let mut undated_early = sample("f", "g5", "Undated early");
        undated_early.fetched_at = NaiveDateTime::parse_from_str("2024-05-01 12:00:00", DATETIME_FORMAT)
            .unwrap()
            .and_utc();

        store
            .upsert_articles(&[january, march, february, undated_late, undated_early])
            .unwrap();

        let titles: Vec<String> = store
            .get_articles(&ArticleFilter::default())
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();

        // Dated articles newest first, undated after all of them by fetch time.
        assert_eq!(
            titles,
            vec!["March", "February", "January", "Undated late", "Undated early"]
        );
    }

    #[test]
    fn test_ordering_tiebreak_on_fetched_at() {
        let store = SqliteStore::in_memory().unwrap();
        let first = dated("f", "g1", "Fetched earlier", "2024-03-10 08:00:00", "2024-03-10 09:00:00");
        let second = dated("f", "g2", "Fetched later", "2024-03-10 08:00:00", "2024-03-10 11:00:00");
        store.upsert_articles(&[first, second]).unwrap();

        let titles: Vec<String> = store
            .get_articles(&ArticleFilter::default())
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["Fetched later", "Fetched earlier"]);
    }

    #[test]
    fn test_limit_caps_results() {
        let store = SqliteStore::in_memory().unwrap();
        for i in 0..5 {
            store
                .upsert_article(&sample("feed", &format!("g{}", i), &format!("Post {}", i)))
                .unwrap();
        }

        let filter = ArticleFilter {
            limit: 3,
            ..Default::default()
        };
        assert_eq!(store.get_articles(&filter).unwrap().len(), 3);
    }

    #[test]
    fn test_tag_match_is_exact() {
        let store = SqliteStore::in_memory().unwrap();
        let article = sample("feed", "g1", "Tagged");
        store.upsert_article(&article).unwrap();
        store.toggle_bookmark(&article.id).unwrap();
        store
            .set_bookmark_tags(
                &article.id,
                &["python".to_string(), "tech".to_string()],
            )
            .unwrap();

        assert_eq!(store.get_articles_by_tag("python").unwrap().len(), 1);
        assert_eq!(store.get_articles_by_tag("tech").unwrap().len(), 1);
        // Substrings of a stored tag must not match.
        assert!(store.get_articles_by_tag("py").unwrap().is_empty());
        assert!(store.get_articles_by_tag("ech").unwrap().is_empty());
    }

    #[test]
    fn test_tag_matches_any_position() {
        let store = SqliteStore::in_memory().unwrap();
        let article = sample("feed", "g1", "Tagged");
        store.upsert_article(&article).unwrap();
        store.toggle_bookmark(&article.id).unwrap();
        store
            .set_bookmark_tags(
                &article.id,
                &["alpha".to_string(), "beta".to_string(), "gamma".to_string()],
            )
            .unwrap();

        for tag in ["alpha", "beta", "gamma"] {
            assert_eq!(store.get_articles_by_tag(tag).unwrap().len(), 1, "{}", tag);
        }
        assert!(store.get_articles_by_tag("amm").unwrap().is_empty());
    }

    #[test]
    fn test_set_bookmark_tags_normalizes_and_clears() {
        let store = SqliteStore::in_memory().unwrap();
        let article = sample("feed", "g1", "Tagged");
        store.upsert_article(&article).unwrap();
        store.toggle_bookmark(&article.id).unwrap();

        store
            .set_bookmark_tags(
                &article.id,
                &[" rust ".to_string(), "".to_string(), "async".to_string()],
            )
            .unwrap();
        assert_eq!(
            store.get_bookmark_tags(&article.id).unwrap(),
            vec!["rust", "async"]
        );

        store.set_bookmark_tags(&article.id, &[]).unwrap();
        assert!(store.get_bookmark_tags(&article.id).unwrap().is_empty());
        assert!(store.get_all_tags().unwrap().is_empty());
    }

    #[test]
    fn test_get_all_tags_sorted_unique() {
        let store = SqliteStore::in_memory().unwrap();
        for (guid, tags) in [
            ("g1", vec!["rust", "tech"]),
            ("g2", vec!["ai", "rust"]),
        ] {
            let article = sample("feed", guid, guid);
            store.upsert_article(&article).unwrap();
            store.toggle_bookmark(&article.id).unwrap();
            let tags: Vec<String> = tags.into_iter().map(String::from).collect();
            store.set_bookmark_tags(&article.id, &tags).unwrap();
        }

        assert_eq!(store.get_all_tags().unwrap(), vec!["ai", "rust", "tech"]);
    }

    #[test]
    fn test_get_all_bookmark_tags_and_memos() {
        let store = SqliteStore::in_memory().unwrap();
        let tagged = sample("feed", "g1", "Tagged");
        let plain = sample("feed", "g2", "Plain");
        store.upsert_articles(&[tagged.clone(), plain.clone()]).unwrap();
        store.toggle_bookmark(&tagged.id).unwrap();
        store.toggle_bookmark(&plain.id).unwrap();
        store
            .set_bookmark_tags(&tagged.id, &["rust".to_string()])
            .unwrap();
        store.set_bookmark_memo(&tagged.id, "ship it").unwrap();
        store.set_bookmark_memo(&plain.id, "").unwrap();

        let tags = store.get_all_bookmark_tags().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[&tagged.id], vec!["rust"]);

        // Empty memos are not reported.
        let memos = store.get_all_bookmark_memos().unwrap();
        assert_eq!(memos.len(), 1);
        assert_eq!(memos[&tagged.id], "ship it");
    }

    #[test]
    fn test_memo_without_bookmark_is_noop() {
        let store = SqliteStore::in_memory().unwrap();
        let article = sample("feed", "g1", "One");
        store.upsert_article(&article).unwrap();

        store.set_bookmark_memo(&article.id, "lost words").unwrap();
        assert!(store.get_bookmark_memo(&article.id).unwrap().is_none());
    }

    #[test]
    fn test_delete_articles_by_feed_removes_children_first() {
        let store = SqliteStore::in_memory().unwrap();
        let doomed_a = sample("doomed", "g1", "A");
        let doomed_b = sample("doomed", "g2", "B");
        let survivor = sample("kept", "g3", "C");
        store
            .upsert_articles(&[doomed_a.clone(), doomed_b.clone(), survivor.clone()])
            .unwrap();
        store.toggle_bookmark(&doomed_a.id).unwrap();
        store.set_bookmark_memo(&doomed_a.id, "gone soon").unwrap();
        store.toggle_bookmark(&survivor.id).unwrap();

        let deleted = store.delete_articles_by_feed("doomed").unwrap();
        assert_eq!(deleted, 2);

        assert!(store.get_article(&doomed_a.id).unwrap().is_none());
        assert!(store.get_bookmark_memo(&doomed_a.id).unwrap().is_none());
        assert!(store.get_article(&survivor.id).unwrap().is_some());
        assert_eq!(store.get_recent_bookmarked_articles(7).unwrap().len(), 1);
    }

    #[test]
    fn test_insight_and_translation_roundtrip() {
        let store = SqliteStore::in_memory().unwrap();
        let article = sample("feed", "g1", "One");
        store.upsert_article(&article).unwrap();

        store.set_insight(&article.id, "matters because X").unwrap();
        store.set_translation(&article.id, "제목", "설명").unwrap();
        store.set_translated_body(&article.id, "본문").unwrap();

        let stored = store.get_article(&article.id).unwrap().unwrap();
        assert_eq!(stored.insight.as_deref(), Some("matters because X"));
        assert_eq!(stored.translated_title.as_deref(), Some("제목"));
        assert_eq!(stored.translated_desc.as_deref(), Some("설명"));
        assert_eq!(stored.translated_body.as_deref(), Some("본문"));
        assert_eq!(
            store.get_translated_body(&article.id).unwrap().as_deref(),
            Some("본문")
        );
        assert!(store.get_translated_body("missing").unwrap().is_none());
    }

    #[test]
    fn test_article_count_by_feed() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_articles(&[
                sample("alpha", "g1", "1"),
                sample("alpha", "g2", "2"),
                sample("beta", "g3", "3"),
            ])
            .unwrap();

        let counts = store.get_article_count_by_feed().unwrap();
        assert_eq!(counts["alpha"], 2);
        assert_eq!(counts["beta"], 1);
    }

    #[test]
    fn test_recent_bookmarked_newest_first() {
        let store = SqliteStore::in_memory().unwrap();
        let first = sample("feed", "g1", "First bookmarked");
        let second = sample("feed", "g2", "Second bookmarked");
        store.upsert_articles(&[first.clone(), second.clone()]).unwrap();
        store.toggle_bookmark(&first.id).unwrap();
        store.toggle_bookmark(&second.id).unwrap();

        let recent = store.get_recent_bookmarked_articles(7).unwrap();
        assert_eq!(recent.len(), 2);
        // Same-second bookmarks fall back to insertion order, newest first.
        assert_eq!(recent[0].id, second.id);
        assert_eq!(recent[1].id, first.id);
    }

    #[test]
    fn test_recent_articles_window_and_limit() {
        let store = SqliteStore::in_memory().unwrap();
        let mut fresh = sample("feed", "g1", "Fresh");
        fresh.published_at = Some(Utc::now());
        let mut undated = sample("feed", "g2", "Undated fresh fetch");
        undated.fetched_at = Utc::now();
        let mut stale = sample("feed", "g3", "Stale");
        stale.published_at = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        store.upsert_articles(&[fresh, undated, stale]).unwrap();

        let recent = store.get_recent_articles(7, 20).unwrap();
        let titles: Vec<_> = recent.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles.len(), 2);
        assert!(titles.contains(&"Fresh"));
        assert!(titles.contains(&"Undated fresh fetch"));

        assert_eq!(store.get_recent_articles(7, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_digest_cache_latest_per_period() {
        let store = SqliteStore::in_memory().unwrap();

        assert!(store.get_latest_digest(7).unwrap().is_none());

        store.save_digest(7, 5, "weekly v1").unwrap();
        store.save_digest(7, 6, "weekly v2").unwrap();
        store.save_digest(30, 12, "monthly").unwrap();

        let weekly = store.get_latest_digest(7).unwrap().unwrap();
        assert_eq!(weekly.content, "weekly v2");
        assert_eq!(weekly.article_count, 6);

        let monthly = store.get_latest_digest(30).unwrap().unwrap();
        assert_eq!(monthly.content, "monthly");
        assert!(store.get_latest_digest(99).unwrap().is_none());
    }

    #[test]
    fn test_reopen_preserves_data_and_adds_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("driftline.db");

        let id = {
            let store = SqliteStore::new(&path).unwrap();
            let article = sample("feed", "g1", "Persisted");
            store.upsert_article(&article).unwrap();
            article.id
        };

        // Second open re-runs migrations and the additive column pass.
        let store = SqliteStore::new(&path).unwrap();
        store.set_translation(&id, "titre", "desc").unwrap();

        let stored = store.get_article(&id).unwrap().unwrap();
        assert_eq!(stored.title, "Persisted");
        assert_eq!(stored.translated_title.as_deref(), Some("titre"));
    }

    #[test]
    fn test_concurrent_writers() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(std::thread::spawn(move || {
                let article = sample("feed", &format!("guid-{}", i), &format!("Post {}", i));
                store.upsert_article(&article).unwrap();
                store.toggle_bookmark(&article.id).unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let filter = ArticleFilter {
            bookmarked_only: true,
            ..Default::default()
        };
        assert_eq!(store.get_articles(&filter).unwrap().len(), 20);
        assert_eq!(store.get_recent_bookmarked_articles(1).unwrap().len(), 20);
    }

    #[test]
    fn test_parse_datetime_fallbacks() {
        assert!(SqliteStore::parse_datetime("2024-03-01 12:30:00").is_some());
        assert!(SqliteStore::parse_datetime("2024-03-01T12:30:00").is_some());
        assert!(SqliteStore::parse_datetime("2024-03-01 12:30:00.123456").is_some());
        assert!(SqliteStore::parse_datetime("2024-03-01T12:30:00+09:00").is_some());
        assert!(SqliteStore::parse_datetime("not a date").is_none());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
