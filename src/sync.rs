//! `courses sync` and `courses seed`.

use anyhow::Result;

use crate::service::CourseService;

pub async fn run_sync(service: &CourseService) -> Result<()> {
    let outcome = service.sync().await;
    println!("{}", outcome.message());
    Ok(())
}

pub async fn run_seed(service: &CourseService) -> Result<()> {
    let count = service.seed().await?;
    println!("Seeded {} courses into the primary store.", count);
    Ok(())
}
