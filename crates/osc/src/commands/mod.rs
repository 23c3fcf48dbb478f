//! Command implementations for osc CLI.
//!
//! Each submodule implements the logic for one command.

pub mod build;
pub mod exec;
pub mod logs;
pub mod project;
pub mod resource;
pub mod scale;
pub mod settings;
pub mod versions;

use anyhow::{Context, Result, anyhow};
use colored::Colorize;
use osc_core::resource::{resolve_kind, KindInfo};
use osc_core::{Client, Resource};
use serde_json::Value;
use tracing::debug;

use crate::config::Config;

/// Negotiate with the configured server.
pub async fn connect(config: &Config) -> Result<Client> {
    let mut builder = Client::builder(&config.server.url)
        .timeout(config.timeout())
        .namespace(&config.defaults.namespace)
        .insecure(config.server.insecure)
        .exec_protocol(config.exec_protocol()?);
    if let Some(token) = &config.server.token {
        builder = builder.token(token);
    }

    debug!("Connecting to {}", config.server.url);
    builder
        .connect()
        .await
        .with_context(|| format!("Failed to connect to {}", config.server.url))
}

/// Resolve a user-typed kind name.
pub fn resolve(kind: &str) -> Result<&'static KindInfo> {
    resolve_kind(kind).ok_or_else(|| anyhow!("Unknown kind '{}'", kind))
}

/// Resource payload as a JSON value.
pub fn to_value(resource: &Resource) -> Result<Value> {
    serde_json::from_str(&resource.to_json()).context("Failed to re-read resource JSON")
}

/// Print a resource as pretty JSON.
pub fn print_json(resource: &Resource) -> Result<()> {
    println!("{}", resource.to_json_pretty()?);
    Ok(())
}

/// One-line status summary per kind.
pub fn summary(resource: &Resource) -> String {
    let summary = match resource {
        Resource::Pod(pod) => pod.phase(),
        Resource::Service(svc) => svc.cluster_ip(),
        Resource::ReplicationController(rc) => rc
            .replicas()
            .and_then(|want| rc.current_replicas().map(|have| format!("{}/{}", have, want))),
        Resource::DeploymentConfig(dc) => dc.replicas().map(|n| format!("{} replicas", n)),
        Resource::Build(build) => build.phase(),
        Resource::BuildConfig(bc) => bc.strategy(),
        Resource::ImageStream(is) => is.docker_image_repository(),
        Resource::Route(route) => route.url(),
        Resource::Project(project) => project.display_name(),
        Resource::Namespace(ns) => ns.phase(),
    };
    summary.unwrap_or_else(|e| format!("<{}>", e))
}

/// Print a resource for humans.
pub fn print_resource(resource: &Resource) {
    println!("{}", resource.identity().to_string().cyan().bold());
    println!("{}", "─".repeat(50));
    println!("  API version: {}", resource.api_version());
    match resource.creation_timestamp() {
        Some(created) => println!("  Created: {}", created.to_rfc3339()),
        None => println!("  Created: {}", "-".dimmed()),
    }
    println!("  Status: {}", summary(resource));

    if let Ok(labels) = resource.labels() {
        if !labels.is_empty() {
            let labels: Vec<String> = labels.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            println!("  Labels: {}", labels.join(","));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osc_core::{PropertyRegistry, ResourceFactory};
    use std::sync::Arc;

    fn factory() -> ResourceFactory {
        ResourceFactory::new(Arc::new(PropertyRegistry::builtin()))
    }

    #[test]
    fn test_resolve_kind_names() {
        assert_eq!(resolve("pods").unwrap().kind, "Pod");
        assert_eq!(resolve("DeploymentConfig").unwrap().kind, "DeploymentConfig");
        assert!(resolve("widgets").unwrap_err().to_string().contains("widgets"));
    }

    #[test]
    fn test_summary_per_kind() {
        let factory = factory();
        let pod = factory
            .create(r#"{"kind":"Pod","apiVersion":"v1","metadata":{"name":"web"},"status":{"phase":"Running"}}"#)
            .unwrap();
        assert_eq!(summary(&pod), "Running");

        let rc = factory
            .create(
                r#"{"kind":"ReplicationController","apiVersion":"v1","metadata":{"name":"rc"},
                    "spec":{"replicas":3},"status":{"replicas":1}}"#,
            )
            .unwrap();
        assert_eq!(summary(&rc), "1/3");
    }

    #[test]
    fn test_summary_reports_type_errors_inline() {
        let dc = factory()
            .create(
                r#"{"kind":"DeploymentConfig","apiVersion":"v1","metadata":{"name":"dc"},
                    "spec":{"replicas":"two"}}"#,
            )
            .unwrap();
        assert!(summary(&dc).starts_with('<'));
    }

    #[test]
    fn test_to_value_keeps_payload() {
        let pod = factory()
            .create(r#"{"kind":"Pod","apiVersion":"v1","metadata":{"name":"web"}}"#)
            .unwrap();
        let value = to_value(&pod).unwrap();
        assert_eq!(value["metadata"]["name"], "web");
    }
}
