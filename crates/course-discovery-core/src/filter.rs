//! Exact-match filter stage. Absent (or blank) filter fields impose no
//! constraint; present ones compose as logical AND.

use crate::models::{Course, SearchFilters};

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        blank(&self.category) && blank(&self.level) && self.is_free.is_none()
    }

    pub fn matches(&self, course: &Course) -> bool {
        if let Some(category) = self.category.as_deref().filter(|s| !s.is_empty()) {
            if course.category != category {
                return false;
            }
        }
        if let Some(level) = self.level.as_deref().filter(|s| !s.is_empty()) {
            if course.level != level {
                return false;
            }
        }
        if let Some(want_free) = self.is_free {
            if course.is_free != want_free {
                return false;
            }
        }
        true
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

pub fn apply_filters(courses: Vec<Course>, filters: &SearchFilters) -> Vec<Course> {
    if filters.is_empty() {
        return courses;
    }
    courses.into_iter().filter(|c| filters.matches(c)).collect()
}
