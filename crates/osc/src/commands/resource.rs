//! Get and list resources.

use anyhow::Result;
use colored::Colorize;
use serde_json::Value;

use super::{connect, print_json, print_resource, resolve, summary, to_value};
use crate::config::Config;

pub async fn get(kind: &str, name: &str, config: &Config, json: bool) -> Result<()> {
    let info = resolve(kind)?;
    let client = connect(config).await?;
    let resource = client.get(info.kind, name, None).await?;

    if json {
        print_json(&resource)
    } else {
        print_resource(&resource);
        Ok(())
    }
}

pub async fn list(kind: &str, config: &Config, json: bool) -> Result<()> {
    let info = resolve(kind)?;
    let client = connect(config).await?;
    let resources = client.list(info.kind, None).await?;

    if json {
        let items = resources.iter().map(to_value).collect::<Result<Vec<_>>>()?;
        println!("{}", serde_json::to_string_pretty(&Value::Array(items))?);
        return Ok(());
    }

    if resources.is_empty() {
        if info.namespaced {
            println!("No {} found in {}", info.plural, client.namespace());
        } else {
            println!("No {} found", info.plural);
        }
        return Ok(());
    }

    let width = resources
        .iter()
        .map(|r| r.name().len())
        .max()
        .unwrap_or(0)
        .max(4);
    let header = format!("{:<width$}  STATUS", "NAME", width = width);
    println!("{}", header.bold());
    for resource in &resources {
        println!("{:<width$}  {}", resource.name(), summary(resource), width = width);
    }
    Ok(())
}
