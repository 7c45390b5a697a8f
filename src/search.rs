//! `courses search`: rank the merged catalog and print one page.

use anyhow::Result;

use course_discovery_core::SearchFilters;

use crate::service::{CourseService, SearchRequest};

pub struct SearchArgs {
    pub query: String,
    pub category: Option<String>,
    pub level: Option<String>,
    pub is_free: Option<bool>,
    pub page: usize,
    pub per_page: usize,
    pub free_boost: Option<f64>,
}

/// Number of results before `page`, for 1-based result numbering.
fn page_offset(page: usize, per_page: usize) -> usize {
    page.saturating_sub(1).saturating_mul(per_page)
}

pub async fn run_search(service: &CourseService, args: SearchArgs) -> Result<()> {
    let request = SearchRequest {
        q: args.query,
        filters: SearchFilters {
            category: args.category,
            level: args.level,
            is_free: args.is_free,
        },
        page: args.page,
        per_page: args.per_page,
        free_boost: args.free_boost,
    };

    let page = service.search(&request).await?;

    if page.results.is_empty() {
        println!("No results. (total: {}, page {})", page.total, page.page);
        return Ok(());
    }

    let offset = page_offset(page.page, page.per_page);
    for (i, scored) in page.results.iter().enumerate() {
        let course = &scored.course;
        let price = if course.is_free {
            "free".to_string()
        } else {
            format!("{:.2}", course.effective_price())
        };

        println!(
            "{}. [{:.4}] {} / {}",
            offset.saturating_add(i + 1),
            scored.final_score,
            course.category,
            course.title
        );
        println!(
            "    level: {}  price: {}  rating: {:.1} ({} reviews)",
            course.level, price, course.avg_rating, course.review_count
        );
        if let Some(published) = &course.published_at {
            println!("    published: {}", published);
        }
        if let Some(bm25) = scored.bm25_like_score {
            println!("    match: {:.3}", bm25);
        }
        if let Some(key) = course.slug.as_deref().or(course.id.as_deref()) {
            println!("    slug: {}", key);
        }
        println!();
    }
    println!(
        "Showing {} of {} (page {}, {} per page)",
        page.results.len(),
        page.total,
        page.page,
        page.per_page
    );

    Ok(())
}
