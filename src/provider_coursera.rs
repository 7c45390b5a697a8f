//! Coursera public catalog provider. Coursera courses are never free.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use course_discovery_core::models::lenient;
use course_discovery_core::{Course, Instructor};

use crate::config::CourseraConfig;
use crate::http::{fetch_json, first_non_blank, generated_id};
use crate::traits::{CourseProvider, ProviderStatus};

pub struct CourseraProvider {
    config: CourseraConfig,
    client: reqwest::Client,
}

impl CourseraProvider {
    pub fn new(config: CourseraConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CatalogResponse {
    Elements {
        #[serde(default)]
        elements: Vec<CourseraCourse>,
    },
    Bare(Vec<CourseraCourse>),
}

impl CatalogResponse {
    fn into_courses(self) -> Vec<CourseraCourse> {
        match self {
            CatalogResponse::Elements { elements } => elements,
            CatalogResponse::Bare(list) => list,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseraCourse {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    slug: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    description: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    partner_ids: Vec<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    level: Option<String>,
    #[serde(default, rename = "avg_rating", deserialize_with = "lenient::number")]
    avg_rating: f64,
    #[serde(default, rename = "review_count", deserialize_with = "lenient::count")]
    review_count: u64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    photo_url: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    instructor: Option<String>,
}

fn normalize(raw: CourseraCourse) -> Course {
    let id = match raw.id.as_deref() {
        Some(id) => format!("coursera-{}", id),
        None => generated_id("coursera"),
    };

    Course {
        id: Some(id),
        slug: first_non_blank([raw.slug.as_deref(), raw.name.as_deref()]).map(String::from),
        title: first_non_blank([raw.name.as_deref(), raw.title.as_deref()])
            .unwrap_or("Coursera Course")
            .to_string(),
        short_description: raw.description.clone(),
        long_description: raw.description,
        category: raw
            .partner_ids
            .into_iter()
            .next()
            .unwrap_or_else(|| "General".to_string()),
        level: raw.level.unwrap_or_else(|| "All".to_string()),
        tags: raw.tags,
        is_free: false,
        price: 0.0,
        avg_rating: raw.avg_rating,
        review_count: raw.review_count,
        published_at: raw.created_at,
        thumbnail_url: raw.photo_url.unwrap_or_default(),
        instructor: Some(Instructor {
            id: "coursera".to_string(),
            name: raw.instructor.unwrap_or_else(|| "Coursera".to_string()),
            ..Default::default()
        }),
    }
    .normalized()
}

#[async_trait]
impl CourseProvider for CourseraProvider {
    fn name(&self) -> &str {
        "coursera"
    }

    fn description(&self) -> &str {
        "Coursera public course catalog"
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
            "{}/api/catalog.v1/courses",
            self.config.base_url.trim_end_matches('/')
        );
        let request = self.client.get(url).query(&[("limit", limit)]);
        let response: CatalogResponse = fetch_json(request).await?;

        Ok(response
            .into_courses()
            .into_iter()
            .take(limit)
            .map(normalize)
            .collect())
    }
}
