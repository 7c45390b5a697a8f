//! Shared HTTP plumbing for catalog providers.

use anyhow::{bail, Context, Result};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;

/// One client for all providers, built once at startup.
pub fn build_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.providers.timeout_secs))
        .user_agent(concat!("course-discovery/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Send a request and decode a JSON body. Non-success statuses are errors.
pub async fn fetch_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await.context("request failed")?;
    let status = response.status();
    if !status.is_success() {
        bail!("unexpected status {}", status);
    }
    response.json::<T>().await.context("malformed payload")
}

/// Identifier for a record the catalog did not give one.
pub fn generated_id(prefix: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &uuid[..8])
}

/// Lowercase, hyphen-separated form of a title.
pub fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// First non-blank value.
pub fn first_non_blank<'a>(values: impl IntoIterator<Item = Option<&'a str>>) -> Option<&'a str> {
    values
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_shape() {
        let id = generated_id("udemy");
        assert!(id.starts_with("udemy-"));
        assert_eq!(id.len(), "udemy-".len() + 8);
        assert_ne!(id, generated_id("udemy"));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Intro to ML: Part 1"), "intro-to-ml-part-1");
        assert_eq!(slugify("  "), "");
    }

    #[test]
    fn test_first_non_blank() {
        assert_eq!(first_non_blank([None, Some(" "), Some("b"), Some("c")]), Some("b"));
        assert_eq!(first_non_blank([None, Some("")]), None);
    }
}
