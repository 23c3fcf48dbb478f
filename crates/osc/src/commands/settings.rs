//! Show or save the effective configuration.

use anyhow::Result;
use colored::Colorize;

use crate::config::Config;

pub fn execute(save: bool, config: &Config, json: bool) -> Result<()> {
    if save {
        let path = config.save()?;
        println!("{} {}", "✓ Saved".green(), path.display());
        return Ok(());
    }

    let mut shown = config.clone();
    if shown.server.token.is_some() {
        shown.server.token = Some("<redacted>".to_string());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    let path = Config::config_path();
    println!("{}", "osc configuration".cyan().bold());
    println!("{}", "─".repeat(50));
    print!("  Config file: ");
    if path.exists() {
        println!("{}", path.display().to_string().green());
    } else {
        println!("{} {}", path.display(), "(not found, using defaults)".yellow());
    }
    println!();
    print!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}
