//! edX catalog provider.
//!
//! Reads `GET {base_url}/api/v1/catalog/search?limit=N`. edX rarely
//! publishes a price; a course is free when its price is absent or zero.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use course_discovery_core::models::lenient;
use course_discovery_core::{Course, Instructor};

use crate::config::EdxConfig;
use crate::http::{fetch_json, first_non_blank, generated_id};
use crate::traits::{CourseProvider, ProviderStatus};

pub struct EdxProvider {
    config: EdxConfig,
    client: reqwest::Client,
}

impl EdxProvider {
    pub fn new(config: EdxConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<EdxCourse>,
}

#[derive(Debug, Default, Deserialize)]
struct EdxCourse {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    key: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    slug: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    short_description: String,
    #[serde(default, deserialize_with = "lenient::string")]
    description: String,
    #[serde(default)]
    subjects: Vec<Subject>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    subject: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    level: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    avg_rating: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    review_count: u64,
    #[serde(default, deserialize_with = "lenient::number")]
    price: f64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    start: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    published: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    keywords: Vec<String>,
    #[serde(default)]
    image: Option<ImageUrl>,
    #[serde(default)]
    media: Option<Media>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    org: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Subject {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageUrl {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Media {
    #[serde(default)]
    image: Option<MediaImage>,
}

#[derive(Debug, Deserialize)]
struct MediaImage {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    uri: Option<String>,
}

fn normalize(raw: EdxCourse) -> Course {
    let id = match first_non_blank([raw.key.as_deref(), raw.id.as_deref()]) {
        Some(key) => format!("edx-{}", key),
        None => generated_id("edx"),
    };
    let slug = first_non_blank([raw.key.as_deref(), raw.slug.as_deref(), raw.id.as_deref()])
        .map(String::from);
    let category = first_non_blank([
        raw.subjects.first().and_then(|s| s.name.as_deref()),
        raw.subject.as_deref(),
    ])
    .unwrap_or("General")
    .to_string();
    let thumbnail = first_non_blank([
        raw.image.as_ref().and_then(|i| i.url.as_deref()),
        raw.media
            .as_ref()
            .and_then(|m| m.image.as_ref())
            .and_then(|i| i.uri.as_deref()),
    ])
    .unwrap_or_default()
    .to_string();
    let is_free = raw.price <= 0.0;

    Course {
        id: Some(id),
        slug,
        title: raw.title.unwrap_or_else(|| "edX Course".to_string()),
        short_description: raw.short_description,
        long_description: raw.description,
        category,
        level: raw.level.unwrap_or_else(|| "All".to_string()),
        tags: raw.keywords,
        is_free,
        price: if is_free { 0.0 } else { raw.price },
        avg_rating: raw.avg_rating,
        review_count: raw.review_count,
        published_at: first_non_blank([raw.start.as_deref(), raw.published.as_deref()])
            .map(String::from),
        thumbnail_url: thumbnail,
        instructor: Some(Instructor {
            id: "edx".to_string(),
            name: raw.org.unwrap_or_else(|| "edX".to_string()),
            ..Default::default()
        }),
    }
    .normalized()
}

#[async_trait]
impl CourseProvider for EdxProvider {
    fn name(&self) -> &str {
        "edx"
    }

    fn description(&self) -> &str {
        "edX public course catalog"
    }

    fn status(&self) -> ProviderStatus {
        if self.config.enabled {
            ProviderStatus::Enabled
        } else {
            ProviderStatus::Disabled("disabled in config".to_string())
        }
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<Course>> {
        let url = format!(
            "{}/api/v1/catalog/search",
            self.config.base_url.trim_end_matches('/')
        );
        let request = self.client.get(url).query(&[("limit", limit)]);
        let response: SearchResponse = fetch_json(request).await?;

        Ok(response
            .results
            .into_iter()
            .take(limit)
            .map(normalize)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Vec<Course> {
        let response: SearchResponse = serde_json::from_value(value).unwrap();
        response.results.into_iter().map(normalize).collect()
    }

    #[test]
    fn test_normalize_full_record() {
        let courses = parse(json!({
            "results": [{
                "key": "HarvardX+CS50",
                "title": "CS50",
                "short_description": "Intro to CS",
                "description": "Long text",
                "subjects": [{"name": "Computer Science"}],
                "level": "Introductory",
                "start": "2025-01-01T00:00:00Z",
                "keywords": ["c", "python", "c"],
                "media": {"image": {"uri": "https://img/cs50.png"}},
                "org": "HarvardX"
            }]
        }));
        let c = &courses[0];
        assert_eq!(c.id.as_deref(), Some("edx-HarvardX+CS50"));
        assert_eq!(c.slug.as_deref(), Some("HarvardX+CS50"));
        assert_eq!(c.category, "Computer Science");
        assert!(c.is_free);
        assert_eq!(c.price, 0.0);
        assert_eq!(c.avg_rating, 0.0);
        assert_eq!(c.tags, vec!["c", "python"]);
        assert_eq!(c.thumbnail_url, "https://img/cs50.png");
        assert_eq!(c.instructor.as_ref().unwrap().name, "HarvardX");
    }

    #[test]
    fn test_normalize_sparse_record() {
        let courses = parse(json!({ "results": [{ "price": "49.5" }] }));
        let c = &courses[0];
        assert!(c.id.as_deref().unwrap().starts_with("edx-"));
        assert_eq!(c.title, "edX Course");
        assert_eq!(c.category, "General");
        assert_eq!(c.level, "All");
        assert!(!c.is_free);
        assert_eq!(c.price, 49.5);
    }

    #[test]
    fn test_missing_results_is_empty() {
        assert!(parse(json!({})).is_empty());
    }
}
