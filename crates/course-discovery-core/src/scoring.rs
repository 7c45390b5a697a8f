//! Ranking formulas.
//!
//! Query-driven results use [`compute_final_score`]:
//!
//! ```text
//! base        = (1 - raw) * 3
//! rating_adj  = (avg_rating - 3) * 0.35
//! rc_adj      = ln(1 + review_count) * 0.04
//! recency_adj = clamp((30 - days) / 30, 0, 1) * 0.15
//! final       = (base + rating_adj + rc_adj + recency_adj) * (free_boost if free else 1)
//! ```
//!
//! Empty queries use [`popularity_score`]: `avg_rating + ln(1 + review_count) * 0.1`.

use chrono::{DateTime, Utc};

use crate::models::Course;

pub const DEFAULT_FREE_BOOST: f64 = 1.25;

/// Age used when a course has no (parseable) publication date.
pub const UNKNOWN_AGE_DAYS: i64 = 3650;

const SECONDS_PER_DAY: i64 = 86_400;

/// Breakdown of [`compute_final_score`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreComponents {
    pub base: f64,
    pub rating_adj: f64,
    pub rc_adj: f64,
    pub recency_adj: f64,
    pub free_multiplier: f64,
    pub final_score: f64,
}

/// Whole days since `published_at`, floored. Future dates give negative ages.
pub fn days_since(course: &Course, now: DateTime<Utc>) -> i64 {
    match course.published_date() {
        Some(published) => now
            .signed_duration_since(published)
            .num_seconds()
            .div_euclid(SECONDS_PER_DAY),
        None => UNKNOWN_AGE_DAYS,
    }
}

pub fn score_components(
    course: &Course,
    raw_match_score: f64,
    free_boost: f64,
    now: DateTime<Utc>,
) -> ScoreComponents {
    let base = (1.0 - raw_match_score) * 3.0;
    let rating_adj = (course.avg_rating - 3.0) * 0.35;
    let rc_adj = (1.0 + course.review_count as f64).ln() * 0.04;
    let days = days_since(course, now);
    let recency_adj = ((30 - days) as f64 / 30.0).clamp(0.0, 1.0) * 0.15;
    let free_multiplier = if course.is_free { free_boost } else { 1.0 };

    ScoreComponents {
        base,
        rating_adj,
        rc_adj,
        recency_adj,
        free_multiplier,
        final_score: (base + rating_adj + rc_adj + recency_adj) * free_multiplier,
    }
}

pub fn compute_final_score(
    course: &Course,
    raw_match_score: f64,
    free_boost: f64,
    now: DateTime<Utc>,
) -> f64 {
    score_components(course, raw_match_score, free_boost, now).final_score
}

/// Score exposed to callers alongside query-driven results.
pub fn bm25_like_score(raw_match_score: f64) -> f64 {
    1.0 - raw_match_score
}

pub fn popularity_score(course: &Course) -> f64 {
    course.avg_rating + (1.0 + course.review_count as f64).ln() * 0.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn ml_course() -> Course {
        Course {
            id: Some("c1".into()),
            title: "Intro to ML".into(),
            avg_rating: 4.0,
            review_count: 10,
            is_free: true,
            published_at: Some("2025-06-15".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_reference_scenario() {
        let parts = score_components(&ml_course(), 0.1, 1.25, now());
        assert!((parts.base - 2.7).abs() < 1e-9);
        assert!((parts.rating_adj - 0.35).abs() < 1e-9);
        assert!((parts.rc_adj - 11f64.ln() * 0.04).abs() < 1e-9);
        assert!((parts.recency_adj - 0.15).abs() < 1e-9);
        assert!((parts.final_score - 4.1199).abs() < 1e-3);
    }

    #[test]
    fn test_missing_date_has_no_recency() {
        let course = Course {
            published_at: None,
            ..ml_course()
        };
        assert_eq!(days_since(&course, now()), UNKNOWN_AGE_DAYS);
        assert_eq!(score_components(&course, 0.1, 1.25, now()).recency_adj, 0.0);
    }

    #[test]
    fn test_days_since_floors() {
        let course = Course {
            published_at: Some("2025-06-14T18:00:00Z".into()),
            ..Default::default()
        };
        // 18 hours ago floors to 0 days
        assert_eq!(days_since(&course, now()), 0);

        let future = Course {
            published_at: Some("2025-06-16T00:00:00Z".into()),
            ..Default::default()
        };
        assert_eq!(days_since(&future, now()), -1);
        let parts = score_components(&future, 0.0, 1.0, now());
        assert!((parts.recency_adj - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_recency_decays_linearly() {
        let course = Course {
            published_at: Some((now() - Duration::days(15)).to_rfc3339()),
            ..Default::default()
        };
        let parts = score_components(&course, 0.0, 1.0, now());
        assert!((parts.recency_adj - 0.075).abs() < 1e-9);
    }

    #[test]
    fn test_review_count_monotonic() {
        let mut previous = f64::NEG_INFINITY;
        for rc in [0u64, 1, 5, 50, 500, 5000] {
            let course = Course {
                review_count: rc,
                ..ml_course()
            };
            let score = compute_final_score(&course, 0.2, 1.25, now());
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_free_boost_strictly_increases() {
        let paid = Course {
            is_free: false,
            price: 49.0,
            ..ml_course()
        };
        let free = Course {
            is_free: true,
            price: 0.0,
            ..ml_course()
        };
        let paid_score = compute_final_score(&paid, 0.1, 1.25, now());
        let free_score = compute_final_score(&free, 0.1, 1.25, now());
        assert!(free_score > paid_score);
    }

    #[test]
    fn test_popularity_and_bm25() {
        let course = ml_course();
        assert!((popularity_score(&course) - (4.0 + 11f64.ln() * 0.1)).abs() < 1e-9);
        assert!((bm25_like_score(0.1) - 0.9).abs() < 1e-9);
    }
}
