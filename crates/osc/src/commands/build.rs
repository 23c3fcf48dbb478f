//! Build operations.

use anyhow::{Result, anyhow};
use colored::Colorize;
use osc_core::capability::BuildCancel;
use osc_core::resource::Build;
use osc_core::Facade;

use super::{connect, print_json};
use crate::config::Config;

pub async fn cancel(name: &str, config: &Config, json: bool) -> Result<()> {
    let client = connect(config).await?;
    let build: Build = client.get_typed(name, None).await?;

    let cancel = build
        .capability::<BuildCancel>()
        .await
        .ok_or_else(|| anyhow!("{} cannot be cancelled", build.identity()))?;
    let was_finished = build.is_finished()?;
    let build = cancel.cancel().await?;

    if json {
        return print_json(&build.into_resource());
    }
    if was_finished {
        println!(
            "{} {} already finished ({})",
            "○".yellow(),
            build.identity(),
            build.phase()?
        );
    } else {
        println!("{} {}", "✓ Cancelled".green(), build.identity());
    }
    Ok(())
}
