//! Show negotiated API versions.

use anyhow::Result;
use colored::Colorize;
use osc_core::ApiGroup;
use osc_core::capability::ProjectRequest;
use serde_json::{Map, Value, json};

use super::connect;
use crate::config::Config;

pub async fn execute(config: &Config, json: bool) -> Result<()> {
    let client = connect(config).await?;

    if json {
        let versions: Map<String, Value> = client
            .versions()
            .map(|(group, version)| (group.to_string(), json!(version.as_str())))
            .collect();
        let out = json!({
            "server": client.base_url().as_str(),
            "versions": versions,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", format!("Server: {}", client.base_url()).cyan().bold());
    println!("{}", "─".repeat(50));
    for group in ApiGroup::ALL {
        match client.version(group) {
            Ok(version) => println!("  {:<12} {}", group.to_string(), version.to_string().green()),
            Err(_) => println!("  {:<12} {}", group.to_string(), "not served".yellow()),
        }
    }

    print!("  Project requests: ");
    if client.supports::<ProjectRequest>().await {
        println!("{}", "✓ available".green());
    } else {
        println!("{}", "○ unavailable".yellow());
    }
    Ok(())
}
