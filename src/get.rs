//! `courses get`: print one course by slug or id.

use anyhow::Result;

use crate::service::CourseService;

pub async fn run_get(service: &CourseService, key: &str) -> Result<()> {
    let course = service.get_course(key).await?;

    println!("--- Course ---");
    if let Some(id) = &course.id {
        println!("id:          {}", id);
    }
    if let Some(slug) = &course.slug {
        println!("slug:        {}", slug);
    }
    println!("title:       {}", course.title);
    println!("category:    {}", course.category);
    println!("level:       {}", course.level);
    if course.is_free {
        println!("price:       free");
    } else {
        println!("price:       {:.2}", course.effective_price());
    }
    println!(
        "rating:      {:.1} ({} reviews)",
        course.avg_rating, course.review_count
    );
    if let Some(published) = &course.published_at {
        println!("published:   {}", published);
    }
    if !course.tags.is_empty() {
        println!("tags:        {}", course.tags.join(", "));
    }
    if let Some(instructor) = &course.instructor {
        println!("instructor:  {}", instructor.name);
    }
    println!();

    println!("--- Summary ---");
    println!("{}", course.short_description);
    if !course.long_description.is_empty() {
        println!();
        println!("--- Description ---");
        println!("{}", course.long_description);
    }

    Ok(())
}
