//! External Provider Aggregator.
//!
//! Fetches every enabled provider concurrently and concatenates their
//! courses in registry order. Each fetch runs under its own timeout; a
//! failing or slow provider contributes nothing and never affects the
//! others. Dedup happens later, in the merge stage.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use course_discovery_core::Course;

use crate::traits::{CourseProvider, ProviderRegistry, ProviderStatus};

#[derive(Clone)]
pub struct Aggregator {
    providers: Arc<ProviderRegistry>,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(providers: Arc<ProviderRegistry>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub async fn fetch_external_courses(&self, limit: usize) -> Vec<Course> {
        let futures = self
            .providers
            .providers()
            .iter()
            .map(|provider| fetch_one(provider.as_ref(), limit, self.timeout));

        let courses: Vec<Course> = join_all(futures).await.into_iter().flatten().collect();
        info!(count = courses.len(), "external fetch complete");
        courses
    }
}

async fn fetch_one(provider: &dyn CourseProvider, limit: usize, timeout: Duration) -> Vec<Course> {
    let name = provider.name();

    if let Some(reason) = disabled_reason(provider) {
        debug!(provider = name, reason = %reason, "provider skipped");
        return Vec::new();
    }

    match tokio::time::timeout(timeout, provider.fetch(limit)).await {
        Ok(Ok(courses)) => {
            debug!(provider = name, count = courses.len(), "provider fetched");
            courses
        }
        Ok(Err(e)) => {
            warn!(provider = name, error = %format!("{:#}", e), "provider fetch failed");
            Vec::new()
        }
        Err(_) => {
            warn!(provider = name, timeout_secs = timeout.as_secs_f64(), "provider timed out");
            Vec::new()
        }
    }
}

fn disabled_reason(provider: &dyn CourseProvider) -> Option<String> {
    match provider.status() {
        ProviderStatus::Enabled => None,
        ProviderStatus::Disabled(reason) => Some(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{bail, Result};
    use async_trait::async_trait;

    struct Fixed(&'static str, Vec<&'static str>);
    struct Failing;
    struct Slow;
    struct Off;

    fn course(id: &str) -> Course {
        Course {
            id: Some(id.to_string()),
            title: id.to_string(),
            ..Default::default()
        }
    }

    #[async_trait]
    impl CourseProvider for Fixed {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "fixed"
        }
        async fn fetch(&self, limit: usize) -> Result<Vec<Course>> {
            Ok(self.1.iter().take(limit).map(|id| course(id)).collect())
        }
    }

    #[async_trait]
    impl CourseProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn description(&self) -> &str {
            "always errors"
        }
        async fn fetch(&self, _limit: usize) -> Result<Vec<Course>> {
            bail!("unexpected status 503 Service Unavailable")
        }
    }

    #[async_trait]
    impl CourseProvider for Slow {
        fn name(&self) -> &str {
            "slow"
        }
        fn description(&self) -> &str {
            "never answers in time"
        }
        async fn fetch(&self, _limit: usize) -> Result<Vec<Course>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![course("late")])
        }
    }

    #[async_trait]
    impl CourseProvider for Off {
        fn name(&self) -> &str {
            "off"
        }
        fn description(&self) -> &str {
            "disabled"
        }
        fn status(&self) -> ProviderStatus {
            ProviderStatus::Disabled("no credentials".to_string())
        }
        async fn fetch(&self, _limit: usize) -> Result<Vec<Course>> {
            panic!("disabled providers must not be fetched")
        }
    }

    #[tokio::test]
    async fn test_concatenates_in_registry_order() {
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(Fixed("a", vec!["a1", "a2"])));
        registry.register(Box::new(Fixed("b", vec!["b1", "a1"])));
        let aggregator = Aggregator::new(Arc::new(registry), Duration::from_secs(5));

        let ids: Vec<String> = aggregator
            .fetch_external_courses(10)
            .await
            .into_iter()
            .filter_map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["a1", "a2", "b1", "a1"], "no dedup at this stage");
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(Failing));
        registry.register(Box::new(Slow));
        registry.register(Box::new(Off));
        registry.register(Box::new(Fixed("ok", vec!["x"])));
        let aggregator = Aggregator::new(Arc::new(registry), Duration::from_millis(100));

        let courses = aggregator.fetch_external_courses(10).await;
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].id.as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_limit_is_passed_through() {
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(Fixed("a", vec!["1", "2", "3"])));
        let aggregator = Aggregator::new(Arc::new(registry), Duration::from_secs(5));
        assert_eq!(aggregator.fetch_external_courses(2).await.len(), 2);
    }
}
