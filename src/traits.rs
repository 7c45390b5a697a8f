//! Extension trait for external course catalogs.
//!
//! Every third-party catalog implements [`CourseProvider`]. Providers are
//! collected in a [`ProviderRegistry`] and fetched concurrently by the
//! aggregator.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            ProviderRegistry              │
//! │  ┌──────┐ ┌──────┐ ┌───────┐ ┌────────┐  │
//! │  │ edX  │ │ fCC  │ │ Udemy │ │Coursera│  │
//! │  └──────┘ └──────┘ └───────┘ └────────┘  │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!      aggregate::fetch_external_courses()
//! ```
//!
//! # Usage
//!
//! ```rust
//! use course_discovery::traits::ProviderRegistry;
//!
//! let mut providers = ProviderRegistry::new();
//! // providers.register(Box::new(MyCatalog::new()));
//! ```

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use course_discovery_core::Course;

use crate::config::Config;

/// A third-party catalog that produces normalized courses.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use course_discovery::traits::CourseProvider;
/// use course_discovery_core::Course;
///
/// pub struct StaticCatalog;
///
/// #[async_trait]
/// impl CourseProvider for StaticCatalog {
///     fn name(&self) -> &str { "static" }
///     fn description(&self) -> &str { "A fixed list of partner courses" }
///
///     async fn fetch(&self, _limit: usize) -> Result<Vec<Course>> {
///         Ok(vec![])
///     }
/// }
/// ```
#[async_trait]
pub trait CourseProvider: Send + Sync {
    /// Short lowercase name used in logs and `courses sources`.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Whether the provider can run. Disabled providers are skipped by
    /// the aggregator and contribute no courses.
    fn status(&self) -> ProviderStatus {
        ProviderStatus::Enabled
    }

    /// Fetch up to `limit` courses, already normalized.
    ///
    /// Network errors, non-success statuses and malformed payloads are
    /// returned as errors; the aggregator turns them into an empty
    /// contribution.
    async fn fetch(&self, limit: usize) -> Result<Vec<Course>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum ProviderStatus {
    Enabled,
    Disabled(String),
}

impl ProviderStatus {
    pub fn is_enabled(&self) -> bool {
        matches!(self, ProviderStatus::Enabled)
    }
}

/// Provider summary for `courses sources`.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub description: String,
    pub status: ProviderStatus,
}

/// Registry of external catalogs, in fetch order.
///
/// Use [`ProviderRegistry::from_config`] for the built-in catalogs, then
/// optionally call [`register`](ProviderRegistry::register) to add custom ones.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn CourseProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Registry with edX, freeCodeCamp, Udemy and Coursera, sharing one
    /// HTTP client.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        use crate::provider_coursera::CourseraProvider;
        use crate::provider_edx::EdxProvider;
        use crate::provider_fcc::FreeCodeCampProvider;
        use crate::provider_udemy::UdemyProvider;

        let providers = &config.providers;
        let mut registry = Self::new();
        registry.register(Box::new(EdxProvider::new(
            providers.edx.clone(),
            client.clone(),
        )));
        registry.register(Box::new(FreeCodeCampProvider::new(
            providers.freecodecamp.clone(),
            client.clone(),
        )));
        registry.register(Box::new(UdemyProvider::new(
            providers.udemy.clone(),
            client.clone(),
        )));
        registry.register(Box::new(CourseraProvider::new(
            providers.coursera.clone(),
            client,
        )));
        registry
    }

    pub fn register(&mut self, provider: Box<dyn CourseProvider>) {
        self.providers.push(provider);
    }

    pub fn providers(&self) -> &[Box<dyn CourseProvider>] {
        &self.providers
    }

    pub fn find(&self, name: &str) -> Option<&dyn CourseProvider> {
        self.providers
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    pub fn infos(&self) -> Vec<ProviderInfo> {
        self.providers
            .iter()
            .map(|p| ProviderInfo {
                name: p.name().to_string(),
                description: p.description().to_string(),
                status: p.status(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
