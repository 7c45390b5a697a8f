//! SQLite-backed [`CourseStore`] and [`CacheBackend`].
//!
//! Courses are stored as JSON bodies in the `courses` table, keyed by
//! their identity key. The external cache lives in `external_cache`, one
//! row per cache key, overwritten on each refresh.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::warn;

use course_discovery_core::store::{CacheBackend, CourseStore};
use course_discovery_core::{Course, ExternalCacheEntry};

use crate::config::Config;
use crate::db;
use crate::migrate;

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect and make sure the schema exists.
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::migrate_pool(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn decode_course(key: &str, body: &str) -> Option<Course> {
    match serde_json::from_str::<Course>(body) {
        Ok(course) => Some(course.normalized()),
        Err(e) => {
            warn!(key, error = %e, "skipping unreadable course row");
            None
        }
    }
}

#[async_trait]
impl CourseStore for SqliteStore {
    async fn list_courses(&self) -> Result<Vec<Course>> {
        let rows = sqlx::query("SELECT key, body FROM courses ORDER BY rowid ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list courses")?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let key: String = row.get("key");
                let body: String = row.get("body");
                decode_course(&key, &body)
            })
            .collect())
    }

    async fn get_course(&self, key: &str) -> Result<Option<Course>> {
        let row = sqlx::query(
            "SELECT key, body FROM courses \
             WHERE key = ?1 OR json_extract(body, '$.slug') = ?1 \
             ORDER BY key = ?1 DESC LIMIT 1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to look up course: {}", key))?;

        Ok(row.and_then(|row| {
            let key: String = row.get("key");
            let body: String = row.get("body");
            decode_course(&key, &body)
        }))
    }

    async fn upsert_course(&self, course: &Course) -> Result<bool> {
        let Some(key) = course.identity_key() else {
            return Ok(false);
        };
        let body = serde_json::to_string(course)?;

        sqlx::query(
            "INSERT INTO courses (key, body, updated_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(&body)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to upsert course: {}", key))?;

        Ok(true)
    }
}

#[async_trait]
impl CacheBackend for SqliteStore {
    async fn read_entry(&self, key: &str) -> Result<Option<ExternalCacheEntry>> {
        let row = sqlx::query("SELECT fetched_at, body FROM external_cache WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read external cache")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let fetched_at: String = row.get("fetched_at");
        let body: String = row.get("body");

        let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
            .with_context(|| format!("Invalid cache timestamp: {}", fetched_at))?
            .with_timezone(&Utc);
        let courses: Vec<Course> =
            serde_json::from_str(&body).context("Invalid cached course list")?;

        Ok(Some(ExternalCacheEntry::new(
            courses.into_iter().map(Course::normalized).collect(),
            fetched_at,
        )))
    }

    async fn write_entry(&self, key: &str, entry: &ExternalCacheEntry) -> Result<()> {
        let body = serde_json::to_string(&entry.courses)?;

        sqlx::query(
            "INSERT INTO external_cache (key, fetched_at, body) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO UPDATE SET fetched_at = excluded.fetched_at, body = excluded.body",
        )
        .bind(key)
        .bind(entry.fetched_at.to_rfc3339())
        .bind(&body)
        .execute(&self.pool)
        .await
        .context("Failed to write external cache")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_discovery_core::store::EXTERNAL_CACHE_KEY;
    use tempfile::TempDir;

    async fn open_temp() -> (TempDir, SqliteStore) {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.db.path = tmp.path().join("data").join("courses.sqlite");
        let store = SqliteStore::open(&config).await.unwrap();
        (tmp, store)
    }

    fn course(id: Option<&str>, slug: &str, title: &str) -> Course {
        Course {
            id: id.map(String::from),
            slug: Some(slug.into()),
            title: title.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_upsert_and_list_in_insert_order() {
        let (_tmp, store) = open_temp().await;
        store.upsert_course(&course(Some("b"), "bee", "B")).await.unwrap();
        store.upsert_course(&course(Some("a"), "ay", "A")).await.unwrap();
        store.upsert_course(&course(Some("b"), "bee", "B2")).await.unwrap();

        let all = store.list_courses().await.unwrap();
        let titles: Vec<&str> = all.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["B2", "A"]);
    }

    #[tokio::test]
    async fn test_get_by_slug_and_id() {
        let (_tmp, store) = open_temp().await;
        store
            .upsert_course(&course(Some("c-1"), "intro-rust", "Intro"))
            .await
            .unwrap();
        store.upsert_course(&course(None, "slug-only", "Slugged")).await.unwrap();

        assert_eq!(store.get_course("c-1").await.unwrap().unwrap().title, "Intro");
        assert_eq!(store.get_course("intro-rust").await.unwrap().unwrap().title, "Intro");
        assert_eq!(store.get_course("slug-only").await.unwrap().unwrap().title, "Slugged");
        assert!(store.get_course("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keyless_course_is_skipped() {
        let (_tmp, store) = open_temp().await;
        assert!(!store.upsert_course(&Course::default()).await.unwrap());
        assert!(store.list_courses().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_entry_overwrite() {
        let (_tmp, store) = open_temp().await;
        assert!(store.read_entry(EXTERNAL_CACHE_KEY).await.unwrap().is_none());

        let t0 = Utc::now() - chrono::Duration::hours(30);
        let old = ExternalCacheEntry::new(vec![course(Some("x"), "x", "Old")], t0);
        store.write_entry(EXTERNAL_CACHE_KEY, &old).await.unwrap();

        let t1 = Utc::now();
        let new = ExternalCacheEntry::new(vec![course(Some("y"), "y", "New")], t1);
        store.write_entry(EXTERNAL_CACHE_KEY, &new).await.unwrap();

        let read = store.read_entry(EXTERNAL_CACHE_KEY).await.unwrap().unwrap();
        assert_eq!(read.courses.len(), 1);
        assert_eq!(read.courses[0].title, "New");
        assert_eq!(read.fetched_at.timestamp(), t1.timestamp());
    }
}
