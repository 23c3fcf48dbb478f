//! Configuration management for osc.
//!
//! Configuration is loaded from multiple sources with precedence:
//! 1. Command-line flags
//! 2. Environment variables (OSC_*)
//! 3. Config file (~/.config/osc/config.toml)
//! 4. Default values

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use osc_core::ChannelProtocol;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::GlobalArgs;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub exec: ExecConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// API server URL
    #[serde(default = "default_server_url")]
    pub url: String,

    /// Bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Accept invalid TLS certificates
    #[serde(default)]
    pub insecure: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Namespace used when none is given
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Stream sub-protocol: `channel` or `base64`
    #[serde(default = "default_exec_protocol")]
    pub protocol: String,
}

// Default value functions
fn default_server_url() -> String {
    "https://localhost:8443".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_exec_protocol() -> String {
    "channel".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
            insecure: false,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            protocol: default_exec_protocol(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load a config file, or defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Apply `OSC_SERVER`, `OSC_TOKEN` and `OSC_NAMESPACE`.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("OSC_SERVER") {
            self.server.url = url;
        }
        if let Some(token) = var("OSC_TOKEN") {
            self.server.token = Some(token);
        }
        if let Some(namespace) = var("OSC_NAMESPACE") {
            self.defaults.namespace = namespace;
        }
    }

    /// Apply command-line flags.
    pub fn apply_args(&mut self, args: &GlobalArgs) {
        if let Some(url) = &args.server {
            self.server.url = url.clone();
        }
        if let Some(token) = &args.token {
            self.server.token = Some(token.clone());
        }
        if let Some(namespace) = &args.namespace {
            self.defaults.namespace = namespace.clone();
        }
        if let Some(timeout) = args.timeout {
            self.server.timeout_secs = timeout;
        }
        if args.insecure {
            self.server.insecure = true;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.server.timeout_secs)
    }

    pub fn exec_protocol(&self) -> Result<ChannelProtocol> {
        match ChannelProtocol::from_name(&self.exec.protocol) {
            Some(protocol) => Ok(protocol),
            None => bail!(
                "Unknown exec protocol '{}' (expected 'channel' or 'base64')",
                self.exec.protocol
            ),
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Get the config file path.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("OSC_CONFIG") {
            return PathBuf::from(path);
        }
        if let Some(proj_dirs) = ProjectDirs::from("io", "osc", "osc") {
            proj_dirs.config_dir().join("config.toml")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".osc")
                .join("config.toml")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.url, "https://localhost:8443");
        assert_eq!(config.server.timeout_secs, 30);
        assert_eq!(config.defaults.namespace, "default");
        assert_eq!(config.exec_protocol().unwrap(), ChannelProtocol::Binary);
        assert!(config.server.token.is_none());
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp = tempdir().expect("Failed to create temp dir");
        let loaded = Config::load_from(&temp.path().join("missing.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[server]\nurl = \"https://master.example.com:8443\"\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server.url, "https://master.example.com:8443");
        assert_eq!(loaded.server.timeout_secs, 30);
        assert_eq!(loaded.defaults.namespace, "default");
    }

    #[test]
    fn test_save_and_load() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.server.token = Some("secret".to_string());
        config.defaults.namespace = "demo".to_string();
        config.exec.protocol = "base64".to_string();
        config.save_to(&path).expect("Failed to save config");

        let loaded = Config::load_from(&path).expect("Failed to load config");
        assert_eq!(loaded, config);
        assert_eq!(loaded.exec_protocol().unwrap(), ChannelProtocol::Base64);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "server = 3").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_precedence() {
        let env: HashMap<&str, &str> = [("OSC_SERVER", "https://env:8443"), ("OSC_NAMESPACE", "env-ns")]
            .into_iter()
            .collect();
        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.server.url, "https://env:8443");
        assert_eq!(config.defaults.namespace, "env-ns");

        let args = GlobalArgs {
            namespace: Some("flag-ns".to_string()),
            timeout: Some(5),
            ..GlobalArgs::default()
        };
        config.apply_args(&args);
        assert_eq!(config.server.url, "https://env:8443");
        assert_eq!(config.defaults.namespace, "flag-ns");
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_unknown_exec_protocol() {
        let mut config = Config::default();
        config.exec.protocol = "spdy".to_string();
        assert!(config.exec_protocol().is_err());
    }
}
