//! Scale a deployment config or replication controller.

use anyhow::{Result, anyhow};
use colored::Colorize;
use osc_core::capability::Scalable;

use super::{connect, print_json, resolve, summary};
use crate::config::Config;

pub async fn execute(kind: &str, name: &str, replicas: i64, config: &Config, json: bool) -> Result<()> {
    let info = resolve(kind)?;
    let client = connect(config).await?;
    let resource = client.get(info.kind, name, None).await?;

    let scalable = resource
        .capability::<Scalable>()
        .await
        .ok_or_else(|| anyhow!("{} cannot be scaled", resource.identity()))?;
    let scaled = scalable.scale(replicas).await?;

    if json {
        return print_json(&scaled);
    }
    println!(
        "{} {} ({})",
        "✓ Scaled".green(),
        scaled.identity(),
        summary(&scaled)
    );
    Ok(())
}
