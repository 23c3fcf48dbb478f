//! Version-aware resources.
//!
//! A [`ResourceObject`] pairs a [`ValueTree`] with the [`PropertyPathMap`]
//! of its (version, kind). Symbolic properties are resolved through the map,
//! so the same facade code reads `spec.portalIP` from a `v1beta3` Service
//! and `spec.clusterIP` from a `v1` one.
//!
//! Typed facades ([`Pod`], [`Service`], ...) wrap a `ResourceObject` and
//! [`Resource`] is the closed sum of all of them.

mod build;
mod factory;
mod kind;
mod network;
mod project;
mod workloads;

pub use build::{Build, BuildConfig};
pub use factory::ResourceFactory;
pub use kind::{kind_info, kinds, resolve_kind, ApiGroup, KindInfo};
pub use network::{Route, Service};
pub use project::{ImageStream, Namespace, Project};
pub use workloads::{DeploymentConfig, Pod, ReplicationController};

use crate::capability::{Capabilities, Capability};
use crate::client::{Client, ClientHandle};
use crate::error::Result;
use crate::registry::{keys, ApiVersion, PropertyPathMap};
use crate::value::{Slot, Value, ValueTree};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a resource: kind, namespace and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceId {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}/{}", self.kind, self.name)
        } else {
            write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ResourceObject
// ─────────────────────────────────────────────────────────────────────────────

/// Generic resource: a value tree read through a property path map.
///
/// Equality and hashing use [`ResourceObject::identity`] only.
#[derive(Clone)]
pub struct ResourceObject {
    tree: ValueTree,
    map: Arc<PropertyPathMap>,
    client: ClientHandle,
    capabilities: Arc<Capabilities<ResourceObject>>,
}

impl ResourceObject {
    pub(crate) fn new(
        tree: ValueTree,
        map: Arc<PropertyPathMap>,
        client: ClientHandle,
        capabilities: Arc<Capabilities<ResourceObject>>,
    ) -> Self {
        Self {
            tree,
            map,
            client,
            capabilities,
        }
    }

    pub fn kind(&self) -> &str {
        self.map.kind()
    }

    /// Version fixed when the resource was built
    pub fn api_version(&self) -> &ApiVersion {
        self.map.version()
    }

    pub fn name(&self) -> String {
        self.string(keys::NAME).unwrap_or_default()
    }

    /// Namespace, empty for cluster-scoped resources
    pub fn namespace(&self) -> String {
        self.string(keys::NAMESPACE).unwrap_or_default()
    }

    pub fn identity(&self) -> ResourceId {
        ResourceId {
            kind: self.kind().to_string(),
            namespace: self.namespace(),
            name: self.name(),
        }
    }

    pub fn property_map(&self) -> &PropertyPathMap {
        &self.map
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Symbolic access
    // ─────────────────────────────────────────────────────────────────────────

    /// Three-state read of a symbolic property.
    pub fn get(&self, property: &str) -> Result<Slot<'_>> {
        Ok(self.tree.get(self.map.path(property)?))
    }

    /// Write a symbolic property, creating intermediate objects.
    pub fn set(&mut self, property: &str, value: impl Into<Value>) -> Result<()> {
        self.tree.set(self.map.path(property)?, value)
    }

    /// Remove a symbolic property, returning the previous value.
    pub fn unset(&mut self, property: &str) -> Result<Option<Value>> {
        Ok(self.tree.remove(self.map.path(property)?))
    }

    pub fn string(&self, property: &str) -> Result<String> {
        self.tree.as_string(self.map.path(property)?)
    }

    pub fn boolean(&self, property: &str) -> Result<bool> {
        self.tree.as_bool(self.map.path(property)?)
    }

    pub fn int(&self, property: &str) -> Result<i64> {
        self.tree.as_int(self.map.path(property)?)
    }

    pub fn list(&self, property: &str) -> Result<Vec<Value>> {
        self.tree.as_list(self.map.path(property)?)
    }

    pub fn string_list(&self, property: &str) -> Result<Vec<String>> {
        self.tree.as_string_list(self.map.path(property)?)
    }

    pub fn string_map(&self, property: &str) -> Result<BTreeMap<String, String>> {
        self.tree.as_map(self.map.path(property)?)
    }

    pub fn labels(&self) -> Result<BTreeMap<String, String>> {
        self.string_map(keys::LABELS)
    }

    pub fn annotations(&self) -> Result<BTreeMap<String, String>> {
        self.string_map(keys::ANNOTATIONS)
    }

    /// Creation time, `None` when absent or not RFC 3339.
    pub fn creation_timestamp(&self) -> Option<DateTime<Utc>> {
        let raw = self.string(keys::CREATION_TIMESTAMP).ok()?;
        DateTime::parse_from_rfc3339(&raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn resource_version(&self) -> String {
        self.string(keys::RESOURCE_VERSION).unwrap_or_default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Raw document
    // ─────────────────────────────────────────────────────────────────────────

    pub fn tree(&self) -> &ValueTree {
        &self.tree
    }

    /// Mutable access to the raw document for fields no property maps.
    pub fn tree_mut(&mut self) -> &mut ValueTree {
        &mut self.tree
    }

    pub fn into_tree(self) -> ValueTree {
        self.tree
    }

    pub fn to_json(&self) -> String {
        self.tree.to_json()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        self.tree.to_json_pretty()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Client and capabilities
    // ─────────────────────────────────────────────────────────────────────────

    pub fn client_handle(&self) -> &ClientHandle {
        &self.client
    }

    /// Owning client. Fails with [`ClientDropped`](crate::Error::ClientDropped) once the client is gone
    /// or when the resource was built without one.
    pub fn client(&self) -> Result<Client> {
        self.client.client()
    }

    /// Whether capability `C` is available for this resource.
    ///
    /// The probe runs once per resource; later calls read the cached answer.
    pub async fn supports<C: Capability>(&self) -> bool {
        self.capabilities.supports::<C>(self).await
    }

    /// The capability implementation, or `None` when unsupported.
    pub async fn capability<C: Capability>(&self) -> Option<Arc<C>> {
        self.capabilities.get::<C>(self).await
    }

    /// Run `visitor` against capability `C` if supported.
    pub async fn accept<C, R, F>(&self, visitor: F) -> Option<R>
    where
        C: Capability,
        F: FnOnce(&C) -> R,
    {
        self.capabilities.accept::<C, R, F>(self, visitor).await
    }

    /// Like [`accept`](Self::accept) with a fallback when unsupported.
    pub async fn accept_or<C, R, F>(&self, default: R, visitor: F) -> R
    where
        C: Capability,
        F: FnOnce(&C) -> R,
    {
        self.capabilities
            .accept_or::<C, R, F>(self, default, visitor)
            .await
    }
}

impl PartialEq for ResourceObject {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for ResourceObject {}

impl Hash for ResourceObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Debug for ResourceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceObject")
            .field("id", &self.identity().to_string())
            .field("version", &self.api_version().as_str())
            .field("attached", &self.client.is_attached())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Facades
// ─────────────────────────────────────────────────────────────────────────────

/// Typed view over a [`ResourceObject`] of one kind.
pub trait Facade: Sized + std::ops::Deref<Target = ResourceObject> {
    /// Wire kind
    const KIND: &'static str;

    /// Symbolic properties the facade's accessors read
    const PROPERTIES: &'static [&'static str];

    /// Wrap an object. The caller guarantees the kind matches.
    fn from_object(object: ResourceObject) -> Self;

    fn object(&self) -> &ResourceObject;

    fn object_mut(&mut self) -> &mut ResourceObject;

    fn into_object(self) -> ResourceObject;

    fn into_resource(self) -> Resource;

    /// Narrow a [`Resource`], failing with `KindMismatch` for other kinds.
    fn from_resource(resource: Resource) -> Result<Self>;
}

macro_rules! facade {
    ($(#[$meta:meta])* $name:ident, [$($prop:expr),* $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(crate::resource::ResourceObject);

        impl crate::resource::Facade for $name {
            const KIND: &'static str = stringify!($name);
            const PROPERTIES: &'static [&'static str] = &[$($prop),*];

            fn from_object(object: crate::resource::ResourceObject) -> Self {
                Self(object)
            }

            fn object(&self) -> &crate::resource::ResourceObject {
                &self.0
            }

            fn object_mut(&mut self) -> &mut crate::resource::ResourceObject {
                &mut self.0
            }

            fn into_object(self) -> crate::resource::ResourceObject {
                self.0
            }

            fn into_resource(self) -> crate::resource::Resource {
                crate::resource::Resource::$name(self)
            }

            fn from_resource(resource: crate::resource::Resource) -> crate::error::Result<Self> {
                match resource {
                    crate::resource::Resource::$name(inner) => Ok(inner),
                    other => Err(crate::error::Error::kind_mismatch(
                        stringify!($name),
                        other.kind(),
                    )),
                }
            }
        }

        impl std::ops::Deref for $name {
            type Target = crate::resource::ResourceObject;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl std::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }
    };
}
pub(crate) use facade;

macro_rules! resources {
    ($($name:ident),* $(,)?) => {
        /// Any resource the kind catalogue knows.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum Resource {
            $($name($name),)*
        }

        impl Resource {
            pub fn object(&self) -> &ResourceObject {
                match self {
                    $(Self::$name(inner) => inner.object(),)*
                }
            }

            pub fn object_mut(&mut self) -> &mut ResourceObject {
                match self {
                    $(Self::$name(inner) => inner.object_mut(),)*
                }
            }

            pub fn into_object(self) -> ResourceObject {
                match self {
                    $(Self::$name(inner) => inner.into_object(),)*
                }
            }
        }

        #[cfg(test)]
        pub(crate) fn facade_properties() -> Vec<(&'static str, &'static [&'static str])> {
            vec![$(($name::KIND, $name::PROPERTIES),)*]
        }
    };
}

resources!(
    Pod,
    Service,
    ReplicationController,
    Namespace,
    Build,
    BuildConfig,
    DeploymentConfig,
    ImageStream,
    Route,
    Project,
);

impl Resource {
    /// Narrow to a facade type.
    pub fn downcast<F: Facade>(self) -> Result<F> {
        F::from_resource(self)
    }
}

impl std::ops::Deref for Resource {
    type Target = ResourceObject;

    fn deref(&self) -> &ResourceObject {
        self.object()
    }
}

impl std::ops::DerefMut for Resource {
    fn deref_mut(&mut self) -> &mut ResourceObject {
        self.object_mut()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identity())
    }
}

impl From<Resource> for ResourceObject {
    fn from(resource: Resource) -> Self {
        resource.into_object()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::registry::PropertyRegistry;
    use crate::test_support::fixtures;
    use std::collections::HashSet;

    fn factory() -> ResourceFactory {
        ResourceFactory::new(Arc::new(PropertyRegistry::builtin()))
    }

    #[test]
    fn test_symbolic_access_follows_version() {
        let factory = factory();
        let v1 = factory.create(&fixtures::service("v1")).unwrap();
        let old = factory.create(&fixtures::service("v1beta3")).unwrap();

        assert_eq!(v1.string(keys::CLUSTER_IP).unwrap(), "172.30.0.10");
        assert_eq!(old.string(keys::CLUSTER_IP).unwrap(), "172.30.0.10");
    }

    #[test]
    fn test_set_then_get() {
        let mut pod = factory().create(&fixtures::pod("v1", "web")).unwrap();
        pod.set(keys::NODE, "node-2").unwrap();
        assert_eq!(pod.string(keys::NODE).unwrap(), "node-2");
        assert_eq!(
            pod.tree().get(&"spec.nodeName".into()).value(),
            Some(&Value::from("node-2"))
        );
    }

    #[test]
    fn test_unmapped_property_is_an_error() {
        let pod = factory().create(&fixtures::pod("v1", "web")).unwrap();
        let err = pod.string(keys::HOST).unwrap_err();
        assert!(matches!(err, Error::UnmappedProperty { .. }));
    }

    #[test]
    fn test_identity_equality_and_hash() {
        let factory = factory();
        let a = factory.create(&fixtures::pod("v1", "web")).unwrap();
        let mut b = factory.create(&fixtures::pod("v1", "web")).unwrap();
        b.set(keys::PHASE, "Failed").unwrap();
        let c = factory.create(&fixtures::pod("v1", "db")).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_identity_display() {
        let pod = factory().create(&fixtures::pod("v1", "web")).unwrap();
        assert_eq!(pod.identity().to_string(), "Pod/demo/web");
        assert_eq!(pod.to_string(), "Pod/demo/web");
    }

    #[test]
    fn test_creation_timestamp() {
        let pod = factory().create(&fixtures::pod("v1", "web")).unwrap();
        let ts = pod.creation_timestamp().unwrap();
        assert_eq!(ts.to_rfc3339(), "2015-06-01T10:00:00+00:00");
    }

    #[test]
    fn test_round_trip_preserves_content() {
        let payload = fixtures::pod("v1", "web");
        let pod = factory().create(&payload).unwrap();
        let original: Value = serde_json::from_str(&payload).unwrap();
        let written: Value = serde_json::from_str(&pod.to_json()).unwrap();
        assert_eq!(original, written);
    }

    #[test]
    fn test_facade_properties_resolve_in_some_version() {
        let registry = PropertyRegistry::builtin();
        for (kind, properties) in facade_properties() {
            for property in properties {
                let mapped = registry
                    .versions()
                    .filter_map(|v| registry.lookup(v, kind).ok())
                    .any(|map| map.contains(property));
                assert!(mapped, "{}.{} is not mapped in any version", kind, property);
            }
        }
    }

    #[test]
    fn test_downcast() {
        let resource = factory().create(&fixtures::pod("v1", "web")).unwrap();
        assert!(resource.clone().downcast::<Service>().unwrap_err().to_string().contains("Pod"));
        let pod = resource.downcast::<Pod>().unwrap();
        assert_eq!(pod.name(), "web");
    }

    #[test]
    fn test_detached_resource_has_no_client() {
        let pod = factory().create(&fixtures::pod("v1", "web")).unwrap();
        assert!(matches!(pod.client(), Err(Error::ClientDropped)));
    }
}
