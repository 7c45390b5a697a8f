//! Core data models used throughout the discovery pipeline.
//!
//! [`Course`] is the single record shape shared by the primary store, the
//! bundled dataset, and every external catalog. Deserialization is lenient
//! (nulls, numeric strings, and missing fields fall back to defaults) and
//! [`Course::normalized`] applies the defaulting rules once, at the source
//! boundary, so the rest of the pipeline can trust the values.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Course author as shown on cards and detail pages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instructor {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A course record from any source.
///
/// `id` and `slug` are both optional; the identity key used for dedup is
/// `id` when present, else `slug` (see [`Course::identity_key`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Course {
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub short_description: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub long_description: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub level: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient::boolean")]
    pub is_free: bool,
    #[serde(default, deserialize_with = "lenient::number")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub avg_rating: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub review_count: u64,
    #[serde(default, deserialize_with = "lenient::opt_string", skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub thumbnail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<Instructor>,
}

impl Course {
    /// Apply the defaulting rules: blank identifiers and dates become
    /// absent, `avg_rating` is clamped to `[0, 5]`, `price` to `>= 0`, and
    /// duplicate or blank tags are dropped (first occurrence wins).
    pub fn normalized(mut self) -> Self {
        self.id = non_blank(self.id);
        self.slug = non_blank(self.slug);
        self.published_at = non_blank(self.published_at);

        self.avg_rating = if self.avg_rating.is_finite() {
            self.avg_rating.clamp(0.0, 5.0)
        } else {
            0.0
        };
        self.price = if self.price.is_finite() {
            self.price.max(0.0)
        } else {
            0.0
        };

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags.drain(..) {
            let tag = tag.trim().to_string();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        self.tags = tags;
        self
    }

    /// The dedup key: `id`, else `slug`, else nothing.
    pub fn identity_key(&self) -> Option<&str> {
        self.id
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.slug.as_deref().filter(|s| !s.is_empty()))
    }

    /// Effective price: always `0.0` for free courses.
    pub fn effective_price(&self) -> f64 {
        if self.is_free {
            0.0
        } else {
            self.price
        }
    }

    /// Parse `published_at` as RFC 3339, a naive ISO datetime, or a plain
    /// `YYYY-MM-DD` date (midnight UTC). Unparseable values count as absent.
    pub fn published_date(&self) -> Option<DateTime<Utc>> {
        let raw = self.published_at.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(ndt.and_utc());
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|ndt| ndt.and_utc())
    }

    /// True if `key` matches this course's id or slug.
    pub fn matches_key(&self, key: &str) -> bool {
        self.id.as_deref() == Some(key) || self.slug.as_deref() == Some(key)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Optional exact-match filters applied before ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub level: Option<String>,
    /// Accepts `true`/`false` or the strings `"true"`/`"false"`.
    #[serde(default, deserialize_with = "lenient::opt_flag")]
    pub is_free: Option<bool>,
}

/// A course with its request-relative ranking score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCourse {
    #[serde(flatten)]
    pub course: Course,
    pub final_score: f64,
    /// `1 - raw match score`; present only for query-driven results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bm25_like_score: Option<f64>,
}

/// The durable snapshot of the last external fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalCacheEntry {
    pub fetched_at: DateTime<Utc>,
    pub courses: Vec<Course>,
}

impl ExternalCacheEntry {
    pub fn new(courses: Vec<Course>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            fetched_at,
            courses,
        }
    }

    /// An entry is fresh while `now - fetched_at <= ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.fetched_at) <= ttl
    }
}

/// Paginated response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

/// Tolerant field deserializers for records coming from third parties.
pub mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Bool(bool),
        Int(i64),
        Float(f64),
        Str(String),
    }

    impl Scalar {
        fn into_string(self) -> String {
            match self {
                Scalar::Bool(b) => b.to_string(),
                Scalar::Int(i) => i.to_string(),
                Scalar::Float(f) => f.to_string(),
                Scalar::Str(s) => s,
            }
        }

        fn into_f64(self) -> f64 {
            match self {
                Scalar::Bool(_) => 0.0,
                Scalar::Int(i) => i as f64,
                Scalar::Float(f) => f,
                Scalar::Str(s) => s.trim().parse().unwrap_or(0.0),
            }
        }
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(Option::<Scalar>::deserialize(d)?
            .map(Scalar::into_string)
            .unwrap_or_default())
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Scalar>::deserialize(d)?
            .map(Scalar::into_string)
            .filter(|s| !s.trim().is_empty()))
    }

    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(Option::<Vec<Option<Scalar>>>::deserialize(d)?
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(Scalar::into_string)
            .collect())
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<Scalar>::deserialize(d)?
            .map(Scalar::into_f64)
            .unwrap_or(0.0))
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let n = number(d)?;
        Ok(if n.is_finite() && n > 0.0 { n as u64 } else { 0 })
    }

    pub fn boolean<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(match Option::<Scalar>::deserialize(d)? {
            Some(Scalar::Bool(b)) => b,
            Some(Scalar::Str(s)) => s.trim().eq_ignore_ascii_case("true"),
            Some(Scalar::Int(i)) => i != 0,
            _ => false,
        })
    }

    /// A number or numeric string. Blank strings and null are absent;
    /// anything else is an error.
    pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        use serde::de::Error;

        match Option::<Scalar>::deserialize(d)? {
            None => Ok(None),
            Some(Scalar::Int(i)) => Ok(Some(i as f64)),
            Some(Scalar::Float(f)) => Ok(Some(f)),
            Some(Scalar::Str(s)) if s.trim().is_empty() => Ok(None),
            Some(Scalar::Str(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected a number, got '{}'", s))),
            Some(Scalar::Bool(b)) => Err(D::Error::custom(format!("expected a number, got {}", b))),
        }
    }

    pub fn opt_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        use serde::de::Error;

        match Option::<Scalar>::deserialize(d)? {
            None => Ok(None),
            Some(Scalar::Bool(b)) => Ok(Some(b)),
            Some(Scalar::Str(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                "" => Ok(None),
                other => Err(D::Error::custom(format!(
                    "is_free must be true or false, got '{}'",
                    other
                ))),
            },
            Some(_) => Err(D::Error::custom("is_free must be a boolean")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_course_defaults() {
        let course: Course = serde_json::from_value(json!({
            "id": 42,
            "title": "Rust",
            "avg_rating": null,
            "review_count": "17",
            "price": "19.99",
            "tags": ["a", null, "b"],
            "published_at": ""
        }))
        .unwrap();
        let course = course.normalized();

        assert_eq!(course.id.as_deref(), Some("42"));
        assert_eq!(course.avg_rating, 0.0);
        assert_eq!(course.review_count, 17);
        assert!((course.price - 19.99).abs() < 1e-9);
        assert_eq!(course.tags, vec!["a", "b"]);
        assert_eq!(course.published_at, None);
        assert!(!course.is_free);
    }

    #[test]
    fn test_normalized_clamps_and_dedups() {
        let course = Course {
            id: Some("  ".into()),
            slug: Some("rust-101".into()),
            avg_rating: 7.5,
            price: -3.0,
            tags: vec!["rust".into(), "rust".into(), " ".into(), "cargo".into()],
            ..Default::default()
        }
        .normalized();

        assert_eq!(course.id, None);
        assert_eq!(course.identity_key(), Some("rust-101"));
        assert_eq!(course.avg_rating, 5.0);
        assert_eq!(course.price, 0.0);
        assert_eq!(course.tags, vec!["rust", "cargo"]);
    }

    #[test]
    fn test_identity_key_prefers_id() {
        let course = Course {
            id: Some("c1".into()),
            slug: Some("intro".into()),
            ..Default::default()
        };
        assert_eq!(course.identity_key(), Some("c1"));
        assert_eq!(Course::default().identity_key(), None);
    }

    #[test]
    fn test_published_date_formats() {
        let mut course = Course {
            published_at: Some("2024-03-01".into()),
            ..Default::default()
        };
        assert_eq!(
            course.published_date().unwrap().to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );

        course.published_at = Some("2024-03-01T12:30:00Z".into());
        assert!(course.published_date().is_some());

        course.published_at = Some("2024-03-01T12:30:00.250".into());
        assert!(course.published_date().is_some());

        course.published_at = Some("next tuesday".into());
        assert!(course.published_date().is_none());
    }

    #[test]
    fn test_filters_accept_string_flags() {
        let f: SearchFilters = serde_json::from_value(json!({ "is_free": "true" })).unwrap();
        assert_eq!(f.is_free, Some(true));

        let f: SearchFilters = serde_json::from_value(json!({ "is_free": false })).unwrap();
        assert_eq!(f.is_free, Some(false));

        let f: SearchFilters = serde_json::from_value(json!({})).unwrap();
        assert_eq!(f.is_free, None);

        assert!(serde_json::from_value::<SearchFilters>(json!({ "is_free": "maybe" })).is_err());
    }

    #[test]
    fn test_opt_number_accepts_numeric_strings() {
        #[derive(Deserialize)]
        struct Body {
            #[serde(default, deserialize_with = "lenient::opt_number")]
            boost: Option<f64>,
        }

        let parse = |v: serde_json::Value| serde_json::from_value::<Body>(v).map(|b| b.boost);
        assert_eq!(parse(json!({"boost": "1.5"})).unwrap(), Some(1.5));
        assert_eq!(parse(json!({"boost": 2})).unwrap(), Some(2.0));
        assert_eq!(parse(json!({"boost": " "})).unwrap(), None);
        assert_eq!(parse(json!({"boost": null})).unwrap(), None);
        assert_eq!(parse(json!({})).unwrap(), None);
        assert!(parse(json!({"boost": "lots"})).is_err());
        assert!(parse(json!({"boost": true})).is_err());
    }

    #[test]
    fn test_scored_course_flattens() {
        let scored = ScoredCourse {
            course: Course {
                id: Some("c1".into()),
                title: "Intro".into(),
                ..Default::default()
            },
            final_score: 1.5,
            bm25_like_score: None,
        };
        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(value["id"], "c1");
        assert_eq!(value["final_score"], 1.5);
        assert!(value.get("bm25_like_score").is_none());
    }

    #[test]
    fn test_cache_entry_freshness_inclusive() {
        let t0 = Utc::now();
        let entry = ExternalCacheEntry::new(vec![], t0);
        let ttl = Duration::hours(24);
        assert!(entry.is_fresh(t0 + ttl, ttl));
        assert!(!entry.is_fresh(t0 + ttl + Duration::seconds(1), ttl));
    }
}
