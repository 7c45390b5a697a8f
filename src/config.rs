//! TOML configuration with environment overrides.
//!
//! Every section has defaults, so an empty file is a valid configuration
//! (bundled dataset, live external fetches, no durable cache).
//!
//! ```toml
//! [db]
//! path = "./data/courses.sqlite"
//!
//! [store]
//! enabled = true
//!
//! [cache]
//! enabled = true
//! ttl_hours = 24
//!
//! [search]
//! free_boost = 1.25
//!
//! [providers.udemy]
//! client_id = "..."
//! client_secret = "..."
//!
//! [server]
//! bind = "127.0.0.1:7340"
//! ```
//!
//! # Environment Variables
//!
//! Applied after the file is parsed:
//! - `COURSES_STORE_ENABLED`, `COURSES_CACHE_ENABLED`: `true`/`false`
//! - `COURSES_CACHE_TTL_HOURS`: number of hours
//! - `COURSES_FREE_BOOST`: multiplier for free courses
//! - `UDEMY_CLIENT_ID`, `UDEMY_CLIENT_SECRET`: Udemy credentials

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use course_discovery_core::fuzzy::{IndexOptions, DEFAULT_CANDIDATE_LIMIT, DEFAULT_THRESHOLD};
use course_discovery_core::paginate::DEFAULT_PER_PAGE;
use course_discovery_core::scoring::DEFAULT_FREE_BOOST;
use course_discovery_core::search::RankParams;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/courses.sqlite")
}

/// Primary document store.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Replaces the bundled static dataset when set.
    #[serde(default)]
    pub dataset_path: Option<PathBuf>,
}

/// Durable external result cache.
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: f64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_hours: default_ttl_hours(),
        }
    }
}

fn default_ttl_hours() -> f64 {
    24.0
}

/// Upper bound for `[cache].ttl_hours` (over 100,000 years).
pub const MAX_TTL_HOURS: f64 = 1e9;

impl CacheConfig {
    /// Saturates at the largest representable duration.
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::try_seconds((self.ttl_hours * 3600.0).round() as i64)
            .unwrap_or(chrono::Duration::MAX)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_free_boost")]
    pub free_boost: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
    #[serde(default = "default_per_page")]
    pub default_per_page: usize,
    /// Courses requested from each external provider per refresh.
    #[serde(default = "default_provider_limit")]
    pub provider_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            free_boost: default_free_boost(),
            threshold: default_threshold(),
            candidate_limit: default_candidate_limit(),
            default_per_page: default_per_page(),
            provider_limit: default_provider_limit(),
        }
    }
}

fn default_free_boost() -> f64 {
    DEFAULT_FREE_BOOST
}
fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}
fn default_candidate_limit() -> usize {
    DEFAULT_CANDIDATE_LIMIT
}
fn default_per_page() -> usize {
    DEFAULT_PER_PAGE
}
fn default_provider_limit() -> usize {
    40
}

impl SearchConfig {
    /// Ranking parameters with an optional per-request free boost.
    pub fn rank_params(&self, free_boost: Option<f64>) -> RankParams {
        RankParams {
            free_boost: free_boost.unwrap_or(self.free_boost),
            index: IndexOptions {
                threshold: self.threshold,
                limit: self.candidate_limit,
                ..IndexOptions::default()
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProvidersConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "EdxConfig::default")]
    pub edx: EdxConfig,
    #[serde(default = "FreeCodeCampConfig::default")]
    pub freecodecamp: FreeCodeCampConfig,
    #[serde(default = "UdemyConfig::default")]
    pub udemy: UdemyConfig,
    #[serde(default = "CourseraConfig::default")]
    pub coursera: CourseraConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            edx: EdxConfig::default(),
            freecodecamp: FreeCodeCampConfig::default(),
            udemy: UdemyConfig::default(),
            coursera: CourseraConfig::default(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct EdxConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_edx_url")]
    pub base_url: String,
}

impl Default for EdxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_edx_url(),
        }
    }
}

fn default_edx_url() -> String {
    "https://www.edx.org".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FreeCodeCampConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Full URL of the curriculum JSON document.
    #[serde(default = "default_fcc_url")]
    pub url: String,
}

impl Default for FreeCodeCampConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_fcc_url(),
        }
    }
}

fn default_fcc_url() -> String {
    "https://raw.githubusercontent.com/freeCodeCamp/freeCodeCamp/main/curriculum/curriculum.json"
        .to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct UdemyConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_udemy_url")]
    pub base_url: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl Default for UdemyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_udemy_url(),
            client_id: None,
            client_secret: None,
        }
    }
}

fn default_udemy_url() -> String {
    "https://www.udemy.com".to_string()
}

impl UdemyConfig {
    /// Both credentials, when present and non-blank.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let id = self.client_id.as_deref().filter(|s| !s.trim().is_empty())?;
        let secret = self
            .client_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())?;
        Some((id, secret))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CourseraConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_coursera_url")]
    pub base_url: String,
}

impl Default for CourseraConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_coursera_url(),
        }
    }
}

fn default_coursera_url() -> String {
    "https://www.coursera.org".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Reject `POST /search` without a non-empty `q`.
    #[serde(default)]
    pub require_query: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            require_query: false,
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

impl Config {
    /// Whether anything needs the SQLite database.
    pub fn needs_db(&self) -> bool {
        self.store.enabled || self.cache.enabled
    }
}

pub const DEFAULT_CONFIG_PATH: &str = "./config/courses.toml";

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Configuration when no `--config` flag was given: the default file if
/// it exists, otherwise built-in defaults plus environment overrides.
pub fn load_default() -> Result<Config> {
    let path = Path::new(DEFAULT_CONFIG_PATH);
    if path.exists() {
        return load_config(path);
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Apply environment overrides through `lookup` (`std::env::var` in production).
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("COURSES_STORE_ENABLED") {
        config.store.enabled = parse_flag("COURSES_STORE_ENABLED", &v)?;
    }
    if let Some(v) = lookup("COURSES_CACHE_ENABLED") {
        config.cache.enabled = parse_flag("COURSES_CACHE_ENABLED", &v)?;
    }
    if let Some(v) = lookup("COURSES_CACHE_TTL_HOURS") {
        config.cache.ttl_hours = v
            .trim()
            .parse()
            .with_context(|| format!("COURSES_CACHE_TTL_HOURS must be a number, got '{}'", v))?;
    }
    if let Some(v) = lookup("COURSES_FREE_BOOST") {
        config.search.free_boost = v
            .trim()
            .parse()
            .with_context(|| format!("COURSES_FREE_BOOST must be a number, got '{}'", v))?;
    }
    if let Some(v) = lookup("UDEMY_CLIENT_ID") {
        config.providers.udemy.client_id = Some(v);
    }
    if let Some(v) = lookup("UDEMY_CLIENT_SECRET") {
        config.providers.udemy.client_secret = Some(v);
    }
    Ok(())
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => bail!("{} must be true or false, got '{}'", name, other),
    }
}

pub fn validate(config: &Config) -> Result<()> {
    if !(config.search.free_boost.is_finite() && config.search.free_boost > 0.0) {
        bail!("search.free_boost must be > 0");
    }
    if !(0.0..=1.0).contains(&config.search.threshold) {
        bail!("search.threshold must be in [0.0, 1.0]");
    }
    if config.search.candidate_limit < 1 {
        bail!("search.candidate_limit must be >= 1");
    }
    if config.search.default_per_page < 1 {
        bail!("search.default_per_page must be >= 1");
    }
    if config.search.provider_limit < 1 {
        bail!("search.provider_limit must be >= 1");
    }
    if !(config.cache.ttl_hours.is_finite() && config.cache.ttl_hours >= 0.0) {
        bail!("cache.ttl_hours must be >= 0");
    }
    if config.cache.ttl_hours > MAX_TTL_HOURS {
        bail!("cache.ttl_hours must be <= {}", MAX_TTL_HOURS);
    }
    if config.providers.timeout_secs < 1 {
        bail!("providers.timeout_secs must be >= 1");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(!config.store.enabled);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_hours, 24.0);
        assert_eq!(config.search.free_boost, 1.25);
        assert_eq!(config.search.threshold, 0.45);
        assert_eq!(config.search.default_per_page, 24);
        assert!(config.providers.edx.enabled);
        assert!(config.providers.udemy.credentials().is_none());
        validate(&config).unwrap();
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: Config = toml::from_str(
            r#"
            [cache]
            enabled = true

            [providers.edx]
            base_url = "http://localhost:9999"
            "#,
        )
        .unwrap();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_hours, 24.0);
        assert!(config.providers.edx.enabled);
        assert_eq!(config.providers.edx.base_url, "http://localhost:9999");
        assert_eq!(config.providers.timeout_secs, 10);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("COURSES_STORE_ENABLED", "true"),
                ("COURSES_CACHE_TTL_HOURS", "6"),
                ("COURSES_FREE_BOOST", "1.5"),
                ("UDEMY_CLIENT_ID", "id"),
                ("UDEMY_CLIENT_SECRET", "secret"),
            ]),
        )
        .unwrap();
        assert!(config.store.enabled);
        assert_eq!(config.cache.ttl_hours, 6.0);
        assert_eq!(config.search.free_boost, 1.5);
        assert_eq!(config.providers.udemy.credentials(), Some(("id", "secret")));
        assert_eq!(config.cache.ttl(), chrono::Duration::hours(6));
    }

    #[test]
    fn test_bad_env_values_rejected() {
        let mut config = Config::default();
        assert!(apply_env_overrides(&mut config, env(&[("COURSES_CACHE_ENABLED", "sometimes")])).is_err());
        assert!(apply_env_overrides(&mut config, env(&[("COURSES_FREE_BOOST", "lots")])).is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.search.free_boost = 0.0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.search.threshold = 1.5;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.cache.ttl_hours = -1.0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.cache.ttl_hours = 1e13;
        assert!(validate(&config).is_err());
        config.cache.ttl_hours = MAX_TTL_HOURS;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let cache = CacheConfig {
            enabled: true,
            ttl_hours: 1e13,
        };
        assert_eq!(cache.ttl(), chrono::Duration::MAX);

        let cache = CacheConfig {
            enabled: true,
            ttl_hours: 1.5,
        };
        assert_eq!(cache.ttl(), chrono::Duration::minutes(90));
    }

    #[test]
    fn test_huge_ttl_from_env_rejected() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, env(&[("COURSES_CACHE_TTL_HOURS", "1e13")])).unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_blank_credentials_disable() {
        let udemy = UdemyConfig {
            client_id: Some("id".into()),
            client_secret: Some("  ".into()),
            ..UdemyConfig::default()
        };
        assert!(udemy.credentials().is_none());
    }
}
