//! # Course Discovery Core
//!
//! Pure ranking and merging logic for the course discovery pipeline: the
//! course data model, merge & dedup, the filter stage, the weighted fuzzy
//! index, the scoring formula, pagination, and the storage traits.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem dependencies.
//! The calling application loads courses, hands them to [`search::rank`],
//! and slices the result with [`paginate::paginate`].

pub mod error;
pub mod filter;
pub mod fuzzy;
pub mod merge;
pub mod models;
pub mod paginate;
pub mod scoring;
pub mod search;
pub mod store;

pub use error::DiscoveryError;
pub use models::{Course, ExternalCacheEntry, Instructor, Page, ScoredCourse, SearchFilters};
