//! Bundled static course dataset.
//!
//! The dataset ships inside the binary so a fresh install always has a
//! non-empty base catalog. `[store].dataset_path` replaces it with a file
//! of the same shape (a JSON array of courses).

use anyhow::{Context, Result};
use std::path::Path;

use course_discovery_core::Course;

use crate::config::Config;

const BUNDLED: &str = include_str!("../data/courses.seed.json");

/// Parse a JSON array of courses, normalizing each record.
pub fn parse_courses(json: &str) -> Result<Vec<Course>> {
    let courses: Vec<Course> = serde_json::from_str(json)?;
    Ok(courses.into_iter().map(Course::normalized).collect())
}

pub fn bundled() -> Result<Vec<Course>> {
    parse_courses(BUNDLED).context("Bundled course dataset is invalid")
}

pub fn load_file(path: &Path) -> Result<Vec<Course>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dataset: {}", path.display()))?;
    parse_courses(&content).with_context(|| format!("Invalid dataset: {}", path.display()))
}

/// The configured dataset: `[store].dataset_path` if set, else the bundled one.
pub fn load(config: &Config) -> Result<Vec<Course>> {
    match &config.store.dataset_path {
        Some(path) => load_file(path),
        None => bundled(),
    }
}
