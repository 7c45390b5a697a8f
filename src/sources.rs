use anyhow::Result;

use crate::service::CourseService;
use crate::traits::ProviderStatus;

pub fn list_sources(service: &CourseService) -> Result<()> {
    println!("{:<14} {:<10} DETAILS", "PROVIDER", "STATUS");
    for info in service.sources() {
        match info.status {
            ProviderStatus::Enabled => {
                println!("{:<14} {:<10} {}", info.name, "enabled", info.description)
            }
            ProviderStatus::Disabled(reason) => {
                println!("{:<14} {:<10} {}", info.name, "disabled", reason)
            }
        }
    }

    let cache = if service.has_cache_backend() {
        "durable"
    } else {
        "none (live fetch on every request)"
    };
    println!();
    println!("external cache: {}", cache);
    Ok(())
}
