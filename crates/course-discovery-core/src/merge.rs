//! Merge & dedup of in-house and external course lists.
//!
//! One pass over `base` then `external`. The first course seen for an
//! identity key wins, so in-house records always shadow external
//! duplicates. Courses without an identity key are always kept.

use std::collections::HashSet;

use crate::models::Course;

pub fn merge(base: Vec<Course>, external: Vec<Course>) -> Vec<Course> {
    let mut seen: HashSet<String> = HashSet::with_capacity(base.len() + external.len());
    let mut merged = Vec::with_capacity(base.len() + external.len());

    for course in base.into_iter().chain(external) {
        if let Some(key) = course.identity_key() {
            if !seen.insert(key.to_string()) {
                continue;
            }
        }
        merged.push(course);
    }

    merged
}
