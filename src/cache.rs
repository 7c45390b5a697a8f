//! External Result Cache.
//!
//! Wraps the [`Aggregator`] with a single durable entry stored under
//! [`EXTERNAL_CACHE_KEY`]. A fresh entry (age within the TTL, inclusive)
//! is served without network calls; anything else triggers a fetch that
//! overwrites the entry. Without a backend every call fetches live.
//!
//! There is no locking: concurrent callers that both see a stale entry
//! both refresh, and the last write wins.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use course_discovery_core::store::{CacheBackend, EXTERNAL_CACHE_KEY};
use course_discovery_core::{Course, ExternalCacheEntry};

use crate::aggregate::Aggregator;

/// Outcome of a forced refresh.
#[derive(Debug)]
pub struct Refresh {
    pub courses: Vec<Course>,
    /// Whether a backend durably stored the result.
    pub stored: bool,
}

#[derive(Clone)]
pub struct ExternalCache {
    aggregator: Aggregator,
    backend: Option<Arc<dyn CacheBackend>>,
    ttl: Duration,
    limit: usize,
}

impl ExternalCache {
    pub fn new(
        aggregator: Aggregator,
        backend: Option<Arc<dyn CacheBackend>>,
        ttl: Duration,
        limit: usize,
    ) -> Self {
        Self {
            aggregator,
            backend,
            ttl,
            limit,
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn get_external_courses(&self, force_refresh: bool) -> Vec<Course> {
        self.get_external_courses_at(force_refresh, Utc::now()).await
    }

    /// [`get_external_courses`](Self::get_external_courses) with an explicit clock.
    pub async fn get_external_courses_at(
        &self,
        force_refresh: bool,
        now: DateTime<Utc>,
    ) -> Vec<Course> {
        if !force_refresh {
            if let Some(courses) = self.read_fresh(now).await {
                return courses;
            }
        }
        self.refresh_at(now).await.courses
    }

    pub async fn refresh(&self) -> Refresh {
        self.refresh_at(Utc::now()).await
    }

    /// Fetch from every provider and overwrite the cache entry stamped `now`.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Refresh {
        let courses = self.aggregator.fetch_external_courses(self.limit).await;

        let Some(backend) = &self.backend else {
            return Refresh {
                courses,
                stored: false,
            };
        };

        let entry = ExternalCacheEntry::new(courses, now);
        let stored = match backend.write_entry(EXTERNAL_CACHE_KEY, &entry).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "external cache write failed");
                false
            }
        };

        Refresh {
            courses: entry.courses,
            stored,
        }
    }

    async fn read_fresh(&self, now: DateTime<Utc>) -> Option<Vec<Course>> {
        let backend = self.backend.as_ref()?;

        match backend.read_entry(EXTERNAL_CACHE_KEY).await {
            Ok(Some(entry)) if entry.is_fresh(now, self.ttl) => {
                debug!(count = entry.courses.len(), fetched_at = %entry.fetched_at, "external cache hit");
                Some(entry.courses)
            }
            Ok(Some(entry)) => {
                debug!(fetched_at = %entry.fetched_at, "external cache stale");
                None
            }
            Ok(None) => {
                debug!("external cache empty");
                None
            }
            Err(e) => {
                warn!(error = %format!("{:#}", e), "external cache read failed, fetching live");
                None
            }
        }
    }
}
