//! Storage abstraction for the discovery pipeline.
//!
//! [`CourseStore`] is the primary document store holding in-house courses.
//! [`CacheBackend`] durably holds the [`ExternalCacheEntry`] snapshot of the
//! last external fetch. Both are pluggable: SQLite in the application,
//! [`memory::InMemoryStore`] for tests and embedding.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Course, ExternalCacheEntry};

/// Key of the single external cache entry.
pub const EXTERNAL_CACHE_KEY: &str = "external_courses_cache_all";

/// Primary document store for in-house courses.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_courses`](CourseStore::list_courses) | All stored courses, in stable order |
/// | [`get_course`](CourseStore::get_course) | One course by id or slug |
/// | [`upsert_course`](CourseStore::upsert_course) | Insert or replace by identity key |
#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn list_courses(&self) -> Result<Vec<Course>>;

    async fn get_course(&self, key: &str) -> Result<Option<Course>>;

    /// Returns `false` when the course has no identity key and was skipped.
    async fn upsert_course(&self, course: &Course) -> Result<bool>;
}

/// Durable key/value storage for external cache entries.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn read_entry(&self, key: &str) -> Result<Option<ExternalCacheEntry>>;

    /// Overwrite the entry stored under `key`.
    async fn write_entry(&self, key: &str, entry: &ExternalCacheEntry) -> Result<()>;
}
