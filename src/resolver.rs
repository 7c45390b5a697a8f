//! Course Source Resolver.
//!
//! Loads the in-house course set from the primary store, falling back to
//! the static dataset when the store is disabled, empty, or failing.
//! Store failures are logged and never reach the caller.

use std::sync::Arc;
use tracing::{debug, warn};

use course_discovery_core::store::CourseStore;
use course_discovery_core::Course;

#[derive(Clone)]
pub struct SourceResolver {
    store: Option<Arc<dyn CourseStore>>,
    fallback: Arc<Vec<Course>>,
}

impl SourceResolver {
    pub fn new(store: Option<Arc<dyn CourseStore>>, fallback: Vec<Course>) -> Self {
        Self {
            store,
            fallback: Arc::new(fallback),
        }
    }

    pub fn store(&self) -> Option<&Arc<dyn CourseStore>> {
        self.store.as_ref()
    }

    pub fn fallback(&self) -> &[Course] {
        &self.fallback
    }

    pub async fn load_base_courses(&self) -> Vec<Course> {
        if let Some(store) = &self.store {
            match store.list_courses().await {
                Ok(courses) if !courses.is_empty() => return courses,
                Ok(_) => debug!("primary store is empty, using static dataset"),
                Err(e) => warn!(error = %e, "primary store read failed, using static dataset"),
            }
        }
        self.fallback.as_ref().clone()
    }

    /// Look up one course by id or slug, store first, then the dataset.
    pub async fn find(&self, key: &str) -> Option<Course> {
        if let Some(store) = &self.store {
            match store.get_course(key).await {
                Ok(Some(course)) => return Some(course),
                Ok(None) => {}
                Err(e) => warn!(key, error = %e, "primary store lookup failed"),
            }
        }
        self.fallback.iter().find(|c| c.matches_key(key)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use course_discovery_core::store::memory::InMemoryStore;

    struct BrokenStore;

    #[async_trait]
    impl CourseStore for BrokenStore {
        async fn list_courses(&self) -> Result<Vec<Course>> {
            Err(anyhow!("connection refused"))
        }
        async fn get_course(&self, _key: &str) -> Result<Option<Course>> {
            Err(anyhow!("connection refused"))
        }
        async fn upsert_course(&self, _course: &Course) -> Result<bool> {
            Err(anyhow!("connection refused"))
        }
    }

    fn course(id: &str) -> Course {
        Course {
            id: Some(id.into()),
            title: id.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_store_wins_when_populated() {
        let store: Arc<dyn CourseStore> = Arc::new(InMemoryStore::with_courses(vec![course("s")]));
        let resolver = SourceResolver::new(Some(store), vec![course("f")]);
        let ids: Vec<_> = resolver.load_base_courses().await.into_iter().map(|c| c.title).collect();
        assert_eq!(ids, vec!["s"]);
    }

    #[tokio::test]
    async fn test_empty_store_falls_back() {
        let store: Arc<dyn CourseStore> = Arc::new(InMemoryStore::new());
        let resolver = SourceResolver::new(Some(store), vec![course("f")]);
        assert_eq!(resolver.load_base_courses().await[0].title, "f");
    }

    #[tokio::test]
    async fn test_failing_store_falls_back() {
        let resolver = SourceResolver::new(Some(Arc::new(BrokenStore)), vec![course("f")]);
        assert_eq!(resolver.load_base_courses().await[0].title, "f");
        assert_eq!(resolver.find("f").await.unwrap().title, "f");
    }

    #[tokio::test]
    async fn test_no_store_uses_dataset() {
        let resolver = SourceResolver::new(None, vec![course("f")]);
        assert_eq!(resolver.load_base_courses().await.len(), 1);
        assert!(resolver.find("missing").await.is_none());
    }
}
