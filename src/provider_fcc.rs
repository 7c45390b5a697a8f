//! freeCodeCamp curriculum provider.
//!
//! The curriculum document is either an array of blocks or an object
//! keyed by block name. Every course is free and carries no rating data.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use course_discovery_core::models::lenient;
use course_discovery_core::{Course, Instructor};

use crate::config::FreeCodeCampConfig;
use crate::http::{fetch_json, first_non_blank, slugify};
use crate::traits::{CourseProvider, ProviderStatus};

pub struct FreeCodeCampProvider {
    config: FreeCodeCampConfig,
    client: reqwest::Client,
}

impl FreeCodeCampProvider {
    pub fn new(config: FreeCodeCampConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

/// Object curricula keep payload order (`serde_json` is built with
/// `preserve_order`), so `limit` keeps the first blocks as published.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Curriculum {
    List(Vec<Block>),
    Map(Map<String, Value>),
}

impl Curriculum {
    fn into_blocks(self) -> Vec<Block> {
        match self {
            Curriculum::List(blocks) => blocks,
            Curriculum::Map(map) => map
                .into_iter()
                .filter_map(|(key, value)| match serde_json::from_value(value) {
                    Ok(block) => Some(block),
                    Err(e) => {
                        warn!(block = %key, error = %e, "skipping unreadable curriculum block");
                        None
                    }
                })
                .collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Block {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    slug: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    description: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    topics: Vec<String>,
}

fn normalize(index: usize, raw: Block) -> Course {
    let title = first_non_blank([raw.title.as_deref(), raw.name.as_deref()])
        .unwrap_or("freeCodeCamp Course")
        .to_string();
    let slug = first_non_blank([raw.slug.as_deref(), raw.name.as_deref()])
        .map(slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("fcc-{}", index));

    // Block names repeat across curricula; the position keeps ids unique.
    let prefix = format!("fcc-{}", index);
    let id = if slug == prefix {
        prefix
    } else {
        format!("{}-{}", prefix, slug)
    };

    Course {
        id: Some(id),
        slug: Some(slug),
        title,
        short_description: raw.description.clone(),
        long_description: raw.description,
        category: "freeCodeCamp".to_string(),
        level: "All".to_string(),
        tags: raw.topics,
        is_free: true,
        price: 0.0,
        avg_rating: 0.0,
        review_count: 0,
        published_at: None,
        thumbnail_url: String::new(),
        instructor: Some(Instructor {
            id: "fcc".to_string(),
            name: "freeCodeCamp".to_string(),
            ..Default::default()
        }),
    }
    .normalized()
}

fn normalize_all(curriculum: Curriculum, limit: usize) -> Vec<Course> {
    curriculum
        .into_blocks()
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, block)| normalize(i, block))
        .collect()
}

#[async_trait]
impl CourseProvider for FreeCodeCampProvider {
    fn name(&self) -> &str {
        "freecodecamp"
    }

    fn description(&self) -> &str {
        "freeCodeCamp curriculum (always free)"
    }

    fn status(&self) -> ProviderStatus {
        if self.config.enabled {
            ProviderStatus::Enabled
        } else {
            ProviderStatus::Disabled("disabled in config".to_string())
        }
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<Course>> {
        let curriculum: Curriculum = fetch_json(self.client.get(&self.config.url)).await?;
        Ok(normalize_all(curriculum, limit))
    }
}
