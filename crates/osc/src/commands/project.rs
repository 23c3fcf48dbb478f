//! Project requests.

use anyhow::{Result, anyhow};
use colored::Colorize;
use osc_core::capability::ProjectRequest;
use osc_core::Facade;

use super::{connect, print_json};
use crate::config::Config;

pub async fn create(
    name: &str,
    display_name: Option<&str>,
    description: Option<&str>,
    config: &Config,
    json: bool,
) -> Result<()> {
    let client = connect(config).await?;
    let request = client
        .capability::<ProjectRequest>()
        .await
        .ok_or_else(|| anyhow!("Server at {} does not accept project requests", client.base_url()))?;

    let project = request.request(name, display_name, description).await?;
    if json {
        return print_json(&project.into_resource());
    }
    println!(
        "{} {} ({})",
        "✓ Created project".green(),
        project.name().bold(),
        project.display_name()?
    );
    Ok(())
}
