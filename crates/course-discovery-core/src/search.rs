//! Ranking over an already merged course set.
//!
//! The core search algorithm operates on plain course vectors, with no
//! storage or configuration dependencies. The calling application loads
//! and merges courses, then hands them here:
//!
//! 1. Apply [`SearchFilters`] (exact match, AND).
//! 2. Empty query: score by the popularity heuristic.
//! 3. Otherwise: build a [`FuzzyIndex`], keep surviving candidates, and
//!    score each with [`compute_final_score`].
//! 4. Stable sort by `final_score` descending.
//! 5. [`paginate`](crate::paginate::paginate).

use chrono::{DateTime, Utc};
use std::str::FromStr;

use crate::error::DiscoveryError;
use crate::filter::apply_filters;
use crate::fuzzy::{FuzzyIndex, IndexOptions};
use crate::models::{Course, Page, ScoredCourse, SearchFilters};
use crate::paginate::paginate;
use crate::scoring::{bm25_like_score, compute_final_score, popularity_score, DEFAULT_FREE_BOOST};

/// Ranking tuning parameters, decoupled from application config.
#[derive(Debug, Clone)]
pub struct RankParams {
    pub free_boost: f64,
    pub index: IndexOptions,
}

impl Default for RankParams {
    fn default() -> Self {
        Self {
            free_boost: DEFAULT_FREE_BOOST,
            index: IndexOptions::default(),
        }
    }
}

/// Listing order requested by callers of `GET /courses`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ranking order: popularity without a query, final score with one.
    #[default]
    Relevance,
    /// `avg_rating` descending.
    Rating,
    /// `review_count` descending.
    Popular,
    /// Free courses before paid ones.
    FreeFirst,
}

impl FromStr for SortOrder {
    type Err = DiscoveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "relevance" => Ok(SortOrder::Relevance),
            "rating" => Ok(SortOrder::Rating),
            "popular" => Ok(SortOrder::Popular),
            "free_first" => Ok(SortOrder::FreeFirst),
            other => Err(DiscoveryError::Validation(format!(
                "unknown sort '{}': use rating, popular, free_first, or relevance",
                other
            ))),
        }
    }
}

/// Filter, score, and sort. The result is not paginated.
pub fn rank(
    courses: Vec<Course>,
    query: &str,
    filters: &SearchFilters,
    params: &RankParams,
    now: DateTime<Utc>,
) -> Result<Vec<ScoredCourse>, DiscoveryError> {
    let filtered = apply_filters(courses, filters);

    let mut scored = if query.trim().is_empty() {
        filtered
            .into_iter()
            .map(|course| ScoredCourse {
                final_score: popularity_score(&course),
                course,
                bm25_like_score: None,
            })
            .collect::<Vec<_>>()
    } else {
        let index = FuzzyIndex::build(&filtered, &params.index);
        let matches = index.search(query);

        let mut slots: Vec<Option<Course>> = filtered.into_iter().map(Some).collect();
        matches
            .into_iter()
            .filter_map(|m| {
                slots[m.index].take().map(|course| ScoredCourse {
                    final_score: compute_final_score(&course, m.score, params.free_boost, now),
                    bm25_like_score: Some(bm25_like_score(m.score)),
                    course,
                })
            })
            .collect()
    };

    if let Some(bad) = scored.iter().find(|s| !s.final_score.is_finite()) {
        return Err(DiscoveryError::Internal(format!(
            "non-finite score for course '{}'",
            bad.course.identity_key().unwrap_or(&bad.course.title)
        )));
    }

    sort_by_score(&mut scored);
    Ok(scored)
}

/// Stable descending sort by `final_score`.
pub fn sort_by_score(scored: &mut [ScoredCourse]) {
    scored.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Re-order ranked results for a listing. `Relevance` keeps the ranking.
pub fn apply_sort(scored: &mut [ScoredCourse], order: SortOrder) {
    match order {
        SortOrder::Relevance => {}
        SortOrder::Rating => scored.sort_by(|a, b| {
            b.course
                .avg_rating
                .partial_cmp(&a.course.avg_rating)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortOrder::Popular => {
            scored.sort_by(|a, b| b.course.review_count.cmp(&a.course.review_count))
        }
        SortOrder::FreeFirst => scored.sort_by_key(|s| !s.course.is_free),
    }
}

/// Rank, then slice one page.
pub fn search_page(
    courses: Vec<Course>,
    query: &str,
    filters: &SearchFilters,
    params: &RankParams,
    page: usize,
    per_page: usize,
    now: DateTime<Utc>,
) -> Result<Page<ScoredCourse>, DiscoveryError> {
    let ranked = rank(courses, query, filters, params, now)?;
    Ok(paginate(ranked, page, per_page))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(id: &str, title: &str, rating: f64, reviews: u64, free: bool) -> Course {
        Course {
            id: Some(id.into()),
            title: title.into(),
            avg_rating: rating,
            review_count: reviews,
            is_free: free,
            category: "General".into(),
            ..Default::default()
        }
    }

    fn ids(scored: &[ScoredCourse]) -> Vec<&str> {
        scored.iter().filter_map(|s| s.course.id.as_deref()).collect()
    }

    #[test]
    fn test_empty_query_uses_popularity() {
        let courses = vec![
            course("low", "A", 3.0, 0, false),
            course("high", "B", 4.5, 100, false),
            course("mid", "C", 4.0, 10, false),
        ];
        let ranked = rank(courses, "   ", &SearchFilters::default(), &RankParams::default(), Utc::now()).unwrap();
        assert_eq!(ids(&ranked), vec!["high", "mid", "low"]);
        assert!(ranked.iter().all(|s| s.bm25_like_score.is_none()));
    }

    #[test]
    fn test_popularity_ties_keep_input_order() {
        let courses = vec![
            course("first", "A", 4.0, 10, false),
            course("second", "B", 4.0, 10, true),
            course("third", "C", 4.0, 10, false),
        ];
        let ranked = rank(courses, "", &SearchFilters::default(), &RankParams::default(), Utc::now()).unwrap();
        assert_eq!(ids(&ranked), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_query_scores_include_bm25_like() {
        let courses = vec![
            course("ml", "Intro to ML", 4.0, 10, true),
            course("cook", "Cooking", 5.0, 1000, true),
        ];
        let ranked = rank(courses, "ml", &SearchFilters::default(), &RankParams::default(), Utc::now()).unwrap();
        assert_eq!(ids(&ranked), vec!["ml"]);
        let bm25 = ranked[0].bm25_like_score.unwrap();
        assert!(bm25 > 0.99 && bm25 <= 1.0);
    }

    #[test]
    fn test_filters_apply_before_ranking() {
        let courses = vec![
            course("a", "Rust", 4.0, 10, true),
            course("b", "Rust Advanced", 4.0, 10, false),
        ];
        let filters = SearchFilters {
            is_free: Some(false),
            ..Default::default()
        };
        let ranked = rank(courses, "rust", &filters, &RankParams::default(), Utc::now()).unwrap();
        assert_eq!(ids(&ranked), vec!["b"]);
    }

    #[test]
    fn test_non_finite_score_is_internal_error() {
        let mut bad = course("nan", "Rust", 4.0, 10, false);
        bad.avg_rating = f64::NAN;
        let err = rank(vec![bad], "", &SearchFilters::default(), &RankParams::default(), Utc::now())
            .unwrap_err();
        assert_eq!(err.code(), "E_INTERNAL");
    }

    #[test]
    fn test_sort_orders() {
        let courses = vec![
            course("a", "A", 3.0, 500, false),
            course("b", "B", 4.8, 5, false),
            course("c", "C", 4.0, 50, true),
        ];
        let ranked = rank(courses, "", &SearchFilters::default(), &RankParams::default(), Utc::now()).unwrap();

        let mut by_rating = ranked.clone();
        apply_sort(&mut by_rating, SortOrder::Rating);
        assert_eq!(ids(&by_rating), vec!["b", "c", "a"]);

        let mut by_reviews = ranked.clone();
        apply_sort(&mut by_reviews, SortOrder::Popular);
        assert_eq!(ids(&by_reviews), vec!["a", "c", "b"]);

        let mut free_first = ranked.clone();
        apply_sort(&mut free_first, SortOrder::FreeFirst);
        assert_eq!(ids(&free_first)[0], "c");
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("".parse::<SortOrder>().unwrap(), SortOrder::Relevance);
        assert_eq!("free_first".parse::<SortOrder>().unwrap(), SortOrder::FreeFirst);
        assert!("newest".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_search_page_reports_total() {
        let courses: Vec<Course> = (0..30)
            .map(|i| course(&format!("c{}", i), "Rust", 4.0, i, false))
            .collect();
        let page = search_page(
            courses,
            "",
            &SearchFilters::default(),
            &RankParams::default(),
            2,
            24,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(page.total, 30);
        assert_eq!(page.results.len(), 6);
    }
}
