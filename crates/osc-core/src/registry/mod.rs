//! Property path registry.
//!
//! Maps (API version, resource kind, symbolic property) to a path in the
//! resource's value tree. The registry is assembled once with
//! [`RegistryBuilder`], then frozen and shared read-only through an `Arc`.
//!
//! # Usage
//!
//! ```rust
//! use osc_core::registry::{keys, PropertyRegistry};
//!
//! let registry = PropertyRegistry::builtin();
//! let map = registry.lookup(&"v1".into(), "Service").unwrap();
//! assert_eq!(map.path(keys::CLUSTER_IP).unwrap().to_string(), "spec.clusterIP");
//! ```

mod builtin;
pub mod keys;
mod version;

pub use version::ApiVersion;

use crate::error::{Error, Result};
use crate::value::PropertyPath;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Immutable mapping for one (version, kind) pair.
#[derive(Debug)]
pub struct PropertyPathMap {
    version: ApiVersion,
    kind: String,
    paths: HashMap<String, PropertyPath>,
}

impl PropertyPathMap {
    pub fn version(&self) -> &ApiVersion {
        &self.version
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Resolve a symbolic property.
    pub fn path(&self, property: &str) -> Result<&PropertyPath> {
        self.paths.get(property).ok_or_else(|| Error::UnmappedProperty {
            property: property.to_string(),
            kind: self.kind.clone(),
            version: self.version.to_string(),
        })
    }

    pub fn contains(&self, property: &str) -> bool {
        self.paths.contains_key(property)
    }

    /// Symbolic property names known to this map.
    pub fn properties(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }
}

/// Read-only table of every registered [`PropertyPathMap`].
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    maps: HashMap<(ApiVersion, String), Arc<PropertyPathMap>>,
    versions: BTreeSet<ApiVersion>,
}

impl PropertyRegistry {
    /// Registry holding the built-in `v1beta3` and `v1` tables.
    pub fn builtin() -> Self {
        RegistryBuilder::new().with_builtin().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Find the map for a (version, kind) pair.
    ///
    /// Fails with [`Error::UnsupportedVersion`] for any unregistered pair.
    pub fn lookup(&self, version: &ApiVersion, kind: &str) -> Result<Arc<PropertyPathMap>> {
        self.maps
            .get(&(version.clone(), kind.to_string()))
            .cloned()
            .ok_or_else(|| Error::unsupported_version(version.as_str(), kind))
    }

    pub fn supports(&self, version: &ApiVersion, kind: &str) -> bool {
        self.maps.contains_key(&(version.clone(), kind.to_string()))
    }

    /// Every version with at least one registered kind, lowest first.
    pub fn versions(&self) -> impl Iterator<Item = &ApiVersion> {
        self.versions.iter()
    }

    /// Pick the highest advertised version that this registry knows.
    ///
    /// When nothing overlaps the error names the server's highest version.
    pub fn negotiate<S: AsRef<str>>(&self, advertised: &[S]) -> Result<ApiVersion> {
        self.pick(advertised, |_| true)
    }

    /// Like [`negotiate`](Self::negotiate), but only versions mapping at
    /// least one of `kinds` are eligible.
    pub fn negotiate_for<S: AsRef<str>>(&self, advertised: &[S], kinds: &[&str]) -> Result<ApiVersion> {
        self.pick(advertised, |version| kinds.iter().any(|kind| self.supports(version, kind)))
    }

    fn pick<S, F>(&self, advertised: &[S], eligible: F) -> Result<ApiVersion>
    where
        S: AsRef<str>,
        F: Fn(&ApiVersion) -> bool,
    {
        let advertised: BTreeSet<ApiVersion> =
            advertised.iter().map(|v| ApiVersion::new(v.as_ref())).collect();
        let supported: BTreeSet<&ApiVersion> = self.versions.iter().filter(|v| eligible(v)).collect();

        if let Some(chosen) = advertised.iter().rev().find(|v| supported.contains(v)) {
            debug!("Negotiated API version {} from {:?}", chosen, advertised);
            return Ok(chosen.clone());
        }

        let highest = advertised
            .iter()
            .next_back()
            .map(ApiVersion::to_string)
            .unwrap_or_else(|| "<none>".to_string());
        Err(Error::UnsupportedVersion {
            version: highest,
            detail: format!(
                "server advertises {:?}, client supports {:?}",
                advertised.iter().map(ApiVersion::as_str).collect::<Vec<_>>(),
                supported.iter().map(|v| v.as_str()).collect::<Vec<_>>()
            ),
        })
    }
}

/// Mutable staging area used to assemble a [`PropertyRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    maps: HashMap<(ApiVersion, String), HashMap<String, PropertyPath>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the built-in tables.
    pub fn with_builtin(mut self) -> Self {
        for (version, kind, table) in builtin::TABLES {
            self = self
                .register(*version, kind, builtin::METADATA.iter().copied())
                .register(*version, kind, table.iter().copied());
        }
        self
    }

    /// Register (or extend) the map for a (version, kind) pair.
    ///
    /// Later entries for the same property replace earlier ones.
    pub fn register<'a, I, P>(mut self, version: impl Into<ApiVersion>, kind: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, P)>,
        P: Into<PropertyPath>,
    {
        let map = self
            .maps
            .entry((version.into(), kind.to_string()))
            .or_default();
        for (property, path) in entries {
            map.insert(property.to_string(), path.into());
        }
        self
    }

    /// Freeze into a read-only registry.
    pub fn build(self) -> PropertyRegistry {
        let mut registry = PropertyRegistry::default();
        for ((version, kind), paths) in self.maps {
            registry.versions.insert(version.clone());
            let map = PropertyPathMap {
                version: version.clone(),
                kind: kind.clone(),
                paths,
            };
            registry.maps.insert((version, kind), Arc::new(map));
        }
        registry
    }
}
