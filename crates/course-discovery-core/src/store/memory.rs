//! In-memory [`CourseStore`] and [`CacheBackend`] for tests and embedding.
//!
//! Uses `Vec` and `HashMap` behind `std::sync::RwLock`. Locks are never
//! held across an await point.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::{Course, ExternalCacheEntry};

use super::{CacheBackend, CourseStore};

/// In-memory store. Courses keep insertion order; upserts replace in place.
pub struct InMemoryStore {
    courses: RwLock<Vec<Course>>,
    cache: RwLock<HashMap<String, ExternalCacheEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            courses: RwLock::new(Vec::new()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_courses(courses: Vec<Course>) -> Self {
        Self {
            courses: RwLock::new(courses),
            cache: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl CourseStore for InMemoryStore {
    async fn list_courses(&self) -> Result<Vec<Course>> {
        Ok(self.courses.read().map_err(|_| poisoned())?.clone())
    }

    async fn get_course(&self, key: &str) -> Result<Option<Course>> {
        let courses = self.courses.read().map_err(|_| poisoned())?;
        Ok(courses.iter().find(|c| c.matches_key(key)).cloned())
    }

    async fn upsert_course(&self, course: &Course) -> Result<bool> {
        let Some(key) = course.identity_key() else {
            return Ok(false);
        };
        let mut courses = self.courses.write().map_err(|_| poisoned())?;
        match courses.iter_mut().find(|c| c.identity_key() == Some(key)) {
            Some(existing) => *existing = course.clone(),
            None => courses.push(course.clone()),
        }
        Ok(true)
    }
}

#[async_trait]
impl CacheBackend for InMemoryStore {
    async fn read_entry(&self, key: &str) -> Result<Option<ExternalCacheEntry>> {
        Ok(self.cache.read().map_err(|_| poisoned())?.get(key).cloned())
    }

    async fn write_entry(&self, key: &str, entry: &ExternalCacheEntry) -> Result<()> {
        self.cache
            .write()
            .map_err(|_| poisoned())?
            .insert(key.to_string(), entry.clone());
        Ok(())
    }
}
