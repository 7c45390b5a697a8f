//! The discovery pipeline wired together.
//!
//! [`CourseService`] is constructed once at startup from [`Config`] and
//! shared by reference with the CLI and HTTP handlers. Each search loads
//! base and external courses concurrently, merges them, and hands the
//! merged set to the core ranking functions.

use anyhow::{bail, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use course_discovery_core::merge::merge;
use course_discovery_core::paginate::paginate;
use course_discovery_core::search::{apply_sort, rank, SortOrder};
use course_discovery_core::store::{CacheBackend, CourseStore};
use course_discovery_core::{Course, DiscoveryError, Page, ScoredCourse, SearchFilters};

use crate::aggregate::Aggregator;
use crate::cache::ExternalCache;
use crate::config::{Config, SearchConfig};
use crate::dataset;
use crate::http;
use crate::resolver::SourceResolver;
use crate::sqlite_store::SqliteStore;
use crate::traits::{ProviderInfo, ProviderRegistry};

/// A ranked search over the merged catalog.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub q: String,
    pub filters: SearchFilters,
    /// 1-based; `0` means the first page.
    pub page: usize,
    /// `0` means `[search].default_per_page`.
    pub per_page: usize,
    pub free_boost: Option<f64>,
}

/// A catalog listing, optionally narrowed by a query.
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub search: SearchRequest,
    pub sort: SortOrder,
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub count: usize,
    pub stored: bool,
}

impl SyncOutcome {
    pub fn message(&self) -> String {
        if self.stored {
            format!("External cache refreshed with {} courses", self.count)
        } else {
            format!(
                "Fetched {} external courses (no cache backend configured, nothing stored)",
                self.count
            )
        }
    }
}

pub struct CourseService {
    resolver: SourceResolver,
    cache: ExternalCache,
    search: SearchConfig,
    db: Option<SqliteStore>,
    /// Why the enabled primary store could not be opened.
    db_error: Option<String>,
}

impl CourseService {
    pub fn new(resolver: SourceResolver, cache: ExternalCache, search: SearchConfig) -> Self {
        Self {
            resolver,
            cache,
            search,
            db: None,
            db_error: None,
        }
    }

    /// Build every component from config: the SQLite store when the
    /// primary store or durable cache is enabled, the dataset, one HTTP
    /// client and the provider registry.
    ///
    /// A database that cannot be opened is not fatal: searches fall back
    /// to the static dataset and external catalogs are fetched live.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let (db, db_error) = if config.needs_db() {
            match SqliteStore::open(config).await {
                Ok(db) => (Some(db), None),
                Err(e) => {
                    let cause = format!("{:#}", e);
                    warn!(
                        path = %config.db.path.display(),
                        error = %cause,
                        "database unavailable, using static dataset and live fetch"
                    );
                    (None, config.store.enabled.then_some(cause))
                }
            }
        } else {
            (None, None)
        };

        let store: Option<Arc<dyn CourseStore>> = match (&db, config.store.enabled) {
            (Some(db), true) => Some(Arc::new(db.clone())),
            _ => None,
        };
        let backend: Option<Arc<dyn CacheBackend>> = match (&db, config.cache.enabled) {
            (Some(db), true) => Some(Arc::new(db.clone())),
            _ => None,
        };

        let resolver = SourceResolver::new(store, dataset::load(config)?);

        let client = http::build_client(config)?;
        let registry = ProviderRegistry::from_config(config, client);
        let aggregator = Aggregator::new(
            Arc::new(registry),
            Duration::from_secs(config.providers.timeout_secs),
        );
        let cache = ExternalCache::new(
            aggregator,
            backend,
            config.cache.ttl(),
            config.search.provider_limit,
        );

        debug!(
            store = config.store.enabled,
            cache = config.cache.enabled,
            "course service ready"
        );

        Ok(Self {
            resolver,
            cache,
            search: config.search.clone(),
            db,
            db_error,
        })
    }

    pub async fn close(&self) {
        if let Some(db) = &self.db {
            db.close().await;
        }
    }

    /// Base and external courses, fetched concurrently, merged base-first.
    pub async fn merged_courses(&self) -> Vec<Course> {
        let (base, external) = tokio::join!(
            self.resolver.load_base_courses(),
            self.cache.get_external_courses(false)
        );
        debug!(base = base.len(), external = external.len(), "merging course sources");
        merge(base, external)
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<Page<ScoredCourse>, DiscoveryError> {
        let ranked = self.ranked(request).await?;
        let (page, per_page) = self.page_params(request);
        Ok(paginate(ranked, page, per_page))
    }

    pub async fn list(&self, request: &ListRequest) -> Result<Page<ScoredCourse>, DiscoveryError> {
        let mut ranked = self.ranked(&request.search).await?;
        apply_sort(&mut ranked, request.sort);
        let (page, per_page) = self.page_params(&request.search);
        Ok(paginate(ranked, page, per_page))
    }

    async fn ranked(&self, request: &SearchRequest) -> Result<Vec<ScoredCourse>, DiscoveryError> {
        if let Some(boost) = request.free_boost {
            if !(boost.is_finite() && boost > 0.0) {
                return Err(DiscoveryError::Validation(
                    "free_boost must be a positive number".to_string(),
                ));
            }
        }

        let courses = self.merged_courses().await;
        let params = self.search.rank_params(request.free_boost);
        rank(courses, &request.q, &request.filters, &params, Utc::now())
    }

    fn page_params(&self, request: &SearchRequest) -> (usize, usize) {
        let page = request.page.max(1);
        let per_page = if request.per_page == 0 {
            self.search.default_per_page
        } else {
            request.per_page
        };
        (page, per_page)
    }

    /// Find a course by slug or id: base courses first, then external.
    pub async fn get_course(&self, key: &str) -> Result<Course, DiscoveryError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(DiscoveryError::Validation("slug must not be empty".to_string()));
        }
        if let Some(course) = self.resolver.find(key).await {
            return Ok(course);
        }
        self.cache
            .get_external_courses(false)
            .await
            .into_iter()
            .find(|c| c.matches_key(key))
            .ok_or_else(|| DiscoveryError::NotFound(format!("course not found: {}", key)))
    }

    /// Force an external refresh, overwriting the cache entry.
    pub async fn sync(&self) -> SyncOutcome {
        let refresh = self.cache.refresh().await;
        let outcome = SyncOutcome {
            count: refresh.courses.len(),
            stored: refresh.stored,
        };
        info!(count = outcome.count, stored = outcome.stored, "external sync complete");
        outcome
    }

    /// Upsert the static dataset into the primary store.
    pub async fn seed(&self) -> Result<usize> {
        let Some(store) = self.resolver.store() else {
            if let Some(cause) = &self.db_error {
                bail!("primary store is unavailable: {}", cause);
            }
            bail!("primary store is disabled; set [store].enabled = true or COURSES_STORE_ENABLED=true");
        };

        let mut seeded = 0;
        for course in self.resolver.fallback() {
            if store.upsert_course(course).await? {
                seeded += 1;
            } else {
                debug!(title = %course.title, "skipping course without id or slug");
            }
        }
        info!(count = seeded, "seeded primary store");
        Ok(seeded)
    }

    pub fn sources(&self) -> Vec<ProviderInfo> {
        self.cache.aggregator().providers().infos()
    }

    pub fn has_cache_backend(&self) -> bool {
        self.cache.has_backend()
    }
}
