//! Udemy affiliate API provider.
//!
//! Requires a client id and secret sent as HTTP Basic auth. Without both
//! the provider reports itself disabled and never touches the network.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;

use course_discovery_core::models::lenient;
use course_discovery_core::{Course, Instructor};

use crate::config::UdemyConfig;
use crate::http::{fetch_json, first_non_blank, generated_id, slugify};
use crate::traits::{CourseProvider, ProviderStatus};

pub struct UdemyProvider {
    config: UdemyConfig,
    client: reqwest::Client,
}

impl UdemyProvider {
    pub fn new(config: UdemyConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CoursesResponse {
    Paged {
        #[serde(default)]
        results: Vec<UdemyCourse>,
    },
    Bare(Vec<UdemyCourse>),
}

impl CoursesResponse {
    fn into_courses(self) -> Vec<UdemyCourse> {
        match self {
            CoursesResponse::Paged { results } => results,
            CoursesResponse::Bare(list) => list,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct UdemyCourse {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    url: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    short_description: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    headline: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    description: String,
    #[serde(default)]
    primary_subcategory: Option<Subcategory>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    category: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    level: Option<String>,
    #[serde(default)]
    is_paid: Option<bool>,
    #[serde(default, deserialize_with = "lenient::number")]
    price: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    avg_rating: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    rating: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    num_reviews: u64,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    published_time: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    created: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    image_480x270: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    image: Option<String>,
    #[serde(default)]
    visible_instructors: Vec<VisibleInstructor>,
}

#[derive(Debug, Deserialize)]
struct Subcategory {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VisibleInstructor {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    display_name: Option<String>,
}

fn normalize(raw: UdemyCourse) -> Course {
    let id = match raw.id.as_deref() {
        Some(id) => format!("udemy-{}", id),
        None => generated_id("udemy"),
    };
    let slug = first_non_blank([raw.url.as_deref()])
        .map(|url| url.trim_matches('/').trim_start_matches("course/").to_string())
        .or_else(|| raw.title.as_deref().map(slugify))
        .or_else(|| raw.id.clone())
        .filter(|s| !s.is_empty());
    let is_free = raw.is_paid == Some(false);
    let price = if is_free {
        0.0
    } else if raw.price > 0.0 {
        raw.price
    } else if raw.is_paid == Some(true) {
        1.0
    } else {
        0.0
    };
    let level = if is_free {
        Some("Beginner".to_string())
    } else {
        raw.level
    };
    let rating = if raw.avg_rating > 0.0 {
        raw.avg_rating
    } else {
        raw.rating
    };

    Course {
        id: Some(id),
        slug,
        title: raw.title.unwrap_or_else(|| "Udemy Course".to_string()),
        short_description: first_non_blank([
            raw.short_description.as_deref(),
            raw.headline.as_deref(),
        ])
        .unwrap_or_default()
        .to_string(),
        long_description: raw.description,
        category: first_non_blank([
            raw.primary_subcategory.as_ref().and_then(|s| s.title.as_deref()),
            raw.category.as_deref(),
        ])
        .unwrap_or("General")
        .to_string(),
        level: level.unwrap_or_else(|| "All".to_string()),
        tags: raw.tags,
        is_free,
        price,
        avg_rating: rating,
        review_count: raw.num_reviews,
        published_at: first_non_blank([raw.published_time.as_deref(), raw.created.as_deref()])
            .map(String::from),
        thumbnail_url: first_non_blank([raw.image_480x270.as_deref(), raw.image.as_deref()])
            .unwrap_or_default()
            .to_string(),
        instructor: Some(Instructor {
            id: "udemy".to_string(),
            name: raw
                .visible_instructors
                .first()
                .and_then(|i| i.display_name.clone())
                .unwrap_or_else(|| "Udemy Instructor".to_string()),
            ..Default::default()
        }),
    }
    .normalized()
}

#[async_trait]
impl CourseProvider for UdemyProvider {
    fn name(&self) -> &str {
        "udemy"
    }

    fn description(&self) -> &str {
        "Udemy affiliate course API"
    }

    fn status(&self) -> ProviderStatus {
        if !self.config.enabled {
            ProviderStatus::Disabled("disabled in config".to_string())
        } else if self.config.credentials().is_none() {
            ProviderStatus::Disabled("missing UDEMY_CLIENT_ID / UDEMY_CLIENT_SECRET".to_string())
        } else {
            ProviderStatus::Enabled
        }
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<Course>> {
        let Some((client_id, client_secret)) = self.config.credentials() else {
            bail!("udemy credentials are not configured");
        };

        let url = format!(
            "{}/api-2.0/courses/",
            self.config.base_url.trim_end_matches('/')
        );
        let request = self
            .client
            .get(url)
            .query(&[("page_size", limit)])
            .basic_auth(client_id, Some(client_secret))
            .header(reqwest::header::ACCEPT, "application/json, text/plain, */*");
        let response: CoursesResponse = fetch_json(request).await?;

        Ok(response
            .into_courses()
            .into_iter()
            .take(limit)
            .map(normalize)
            .collect())
    }
}
