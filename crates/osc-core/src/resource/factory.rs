//! Builds typed resources from wire payloads.
//!
//! The factory reads `kind` and `apiVersion` from the payload, resolves the
//! property map for that pair and the facade constructor from the static
//! kind catalogue. Nothing is inferred: an unknown kind or an unregistered
//! version is an error.

use super::{kind_info, Facade, KindInfo, Resource, ResourceObject};
use crate::capability::{default_resource_capabilities, Capabilities, CapabilityRegistry};
use crate::client::ClientHandle;
use crate::error::{Error, Result};
use crate::registry::{keys, ApiVersion, PropertyRegistry};
use crate::value::{PropertyPath, Value, ValueTree};
use std::sync::Arc;
use tracing::debug;

const KIND: &str = "kind";
const API_VERSION: &str = "apiVersion";
const ITEMS: &str = "items";

/// Resource factory bound to a registry and, optionally, a client.
#[derive(Clone)]
pub struct ResourceFactory {
    registry: Arc<PropertyRegistry>,
    client: ClientHandle,
    capabilities: Arc<CapabilityRegistry<ResourceObject>>,
}

impl ResourceFactory {
    /// Factory whose resources have no client. Client-backed capabilities
    /// report unsupported for them.
    pub fn new(registry: Arc<PropertyRegistry>) -> Self {
        Self {
            registry,
            client: ClientHandle::detached(),
            capabilities: Arc::new(default_resource_capabilities()),
        }
    }

    pub(crate) fn bound(
        registry: Arc<PropertyRegistry>,
        client: ClientHandle,
        capabilities: Arc<CapabilityRegistry<ResourceObject>>,
    ) -> Self {
        Self {
            registry,
            client,
            capabilities,
        }
    }

    pub fn registry(&self) -> &Arc<PropertyRegistry> {
        &self.registry
    }

    /// Build a resource from JSON text.
    pub fn create(&self, payload: &str) -> Result<Resource> {
        self.create_tree(ValueTree::parse(payload)?)
    }

    /// Build a resource from a parsed JSON value.
    pub fn create_value(&self, payload: Value) -> Result<Resource> {
        self.create_tree(ValueTree::from_value(payload)?)
    }

    /// Build a resource of a known facade type.
    pub fn create_typed<F: Facade>(&self, payload: &str) -> Result<F> {
        F::from_resource(self.create(payload)?)
    }

    pub fn create_tree(&self, tree: ValueTree) -> Result<Resource> {
        let kind = required(&tree, KIND)?;
        let version = ApiVersion::new(required(&tree, API_VERSION)?);
        let info = kind_info(&kind).ok_or_else(|| Error::UnregisteredKind(kind.clone()))?;
        let map = self.registry.lookup(&version, &kind)?;
        let object = ResourceObject::new(
            tree,
            map,
            self.client.clone(),
            Arc::new(Capabilities::new(Arc::clone(&self.capabilities))),
        );
        Ok((info.construct)(object))
    }

    /// Build every item of a `<Kind>List` payload.
    ///
    /// Items that omit `kind` or `apiVersion` inherit them from the list. Any
    /// failing item fails the whole call.
    ///
    /// A server answering a `ProjectList` request with a single `Project` is
    /// accepted and yields a one-element list.
    pub fn create_list(&self, payload: &str, expected_kind: &str) -> Result<Vec<Resource>> {
        let tree = ValueTree::parse(payload)?;
        let declared = required(&tree, KIND)?;
        let list_kind = format!("{}List", expected_kind);

        if declared != list_kind {
            if expected_kind == "Project" && declared == "Project" {
                debug!("Server returned a single Project for a ProjectList request");
                return Ok(vec![self.create_tree(tree)?]);
            }
            return Err(Error::kind_mismatch(list_kind, declared));
        }

        let version = tree.as_string(&PropertyPath::from(API_VERSION))?;
        let items = tree.as_list(&PropertyPath::from(ITEMS))?;
        debug!("Building {} {} items", items.len(), expected_kind);

        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                let mut item = ValueTree::from_value(item)
                    .map_err(|_| Error::malformed(format!("{} item {} is not an object", list_kind, i)))?;
                inherit(&mut item, KIND, expected_kind)?;
                inherit(&mut item, API_VERSION, &version)?;
                let item_kind = required(&item, KIND)?;
                if item_kind != expected_kind {
                    return Err(Error::kind_mismatch(expected_kind, item_kind));
                }
                self.create_tree(item)
            })
            .collect()
    }

    /// Fresh resource for `kind` at `version`, ready to be filled and created.
    pub fn stub(
        &self,
        version: &ApiVersion,
        kind: &str,
        name: &str,
        namespace: Option<&str>,
    ) -> Result<Resource> {
        let info: &KindInfo =
            kind_info(kind).ok_or_else(|| Error::UnregisteredKind(kind.to_string()))?;
        let map = self.registry.lookup(version, kind)?;

        let mut tree = ValueTree::new();
        tree.set(&KIND.into(), kind)?;
        tree.set(&API_VERSION.into(), version.as_str())?;
        tree.set(map.path(keys::NAME)?, name)?;
        if let (true, Some(ns)) = (info.namespaced, namespace) {
            tree.set(map.path(keys::NAMESPACE)?, ns)?;
        }
        self.create_tree(tree)
    }
}

fn required(tree: &ValueTree, field: &str) -> Result<String> {
    let value = tree
        .as_string(&PropertyPath::from(field))
        .map_err(|_| Error::malformed(format!("'{}' is not a string", field)))?;
    if value.is_empty() {
        return Err(Error::malformed(format!("missing '{}'", field)));
    }
    Ok(value)
}

fn inherit(item: &mut ValueTree, field: &str, value: &str) -> Result<()> {
    let path = PropertyPath::from(field);
    if !item.is_defined(&path) && !value.is_empty() {
        item.set(&path, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Pod, Project, Service};
    use crate::test_support::fixtures;

    fn factory() -> ResourceFactory {
        ResourceFactory::new(Arc::new(PropertyRegistry::builtin()))
    }

    #[test]
    fn test_create_dispatches_on_kind() {
        let factory = factory();
        assert!(matches!(
            factory.create(&fixtures::pod("v1", "web")).unwrap(),
            Resource::Pod(_)
        ));
        assert!(matches!(
            factory.create(&fixtures::service("v1beta3")).unwrap(),
            Resource::Service(_)
        ));
    }

    #[test]
    fn test_create_rejects_unknown_input() {
        let factory = factory();

        let err = factory.create("{not json").unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));

        let err = factory.create(r#"{"apiVersion":"v1"}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));

        let err = factory
            .create(r#"{"kind":"Widget","apiVersion":"v1"}"#)
            .unwrap_err();
        assert!(matches!(err, Error::UnregisteredKind(ref k) if k == "Widget"));

        let err = factory
            .create(r#"{"kind":"Pod","apiVersion":"v1beta1"}"#)
            .unwrap_err();
        assert!(err.is_unsupported_version());
        assert!(err.to_string().contains("v1beta1"));
    }

    #[test]
    fn test_create_typed_mismatch() {
        let err = factory()
            .create_typed::<Service>(&fixtures::pod("v1", "web"))
            .unwrap_err();
        assert!(matches!(err, Error::KindMismatch { .. }));
    }

    #[test]
    fn test_create_list_inherits_kind_and_version() {
        let payload = r#"{
            "kind": "PodList",
            "apiVersion": "v1beta3",
            "items": [
                {"metadata": {"name": "a", "namespace": "demo"}, "spec": {"host": "node-a"}},
                {"metadata": {"name": "b", "namespace": "demo"}, "spec": {"host": "node-b"}}
            ]
        }"#;
        let pods = factory().create_list(payload, "Pod").unwrap();
        assert_eq!(pods.len(), 2);

        let pod: Pod = pods[1].clone().downcast().unwrap();
        assert_eq!(pod.api_version().as_str(), "v1beta3");
        assert_eq!(pod.node().unwrap(), "node-b");
    }

    #[test]
    fn test_create_list_empty_items() {
        let pods = factory()
            .create_list(r#"{"kind":"PodList","apiVersion":"v1","items":null}"#, "Pod")
            .unwrap();
        assert!(pods.is_empty());
    }

    #[test]
    fn test_create_list_kind_mismatch() {
        let err = factory()
            .create_list(r#"{"kind":"ServiceList","apiVersion":"v1","items":[]}"#, "Pod")
            .unwrap_err();
        match err {
            Error::KindMismatch { expected, found } => {
                assert_eq!(expected, "PodList");
                assert_eq!(found, "ServiceList");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_singular_project_as_list() {
        let payload = fixtures::project("v1", "demo", Some("Demo"));
        let projects = factory().create_list(&payload, "Project").unwrap();
        assert_eq!(projects.len(), 1);
        let project: Project = projects[0].clone().downcast().unwrap();
        assert_eq!(project.name(), "demo");
    }

    #[test]
    fn test_singular_pod_is_not_a_list() {
        let err = factory()
            .create_list(&fixtures::pod("v1", "web"), "Pod")
            .unwrap_err();
        assert!(matches!(err, Error::KindMismatch { .. }));
    }

    #[test]
    fn test_list_fails_as_a_whole() {
        let payload = r#"{
            "kind": "PodList",
            "apiVersion": "v1",
            "items": [
                {"metadata": {"name": "ok"}},
                {"kind": "Service", "metadata": {"name": "stray"}},
                {"metadata": {"name": "never-reached"}}
            ]
        }"#;
        let err = factory().create_list(payload, "Pod").unwrap_err();
        assert!(matches!(err, Error::KindMismatch { .. }));

        let err = factory()
            .create_list(r#"{"kind":"PodList","apiVersion":"v1","items":[42]}"#, "Pod")
            .unwrap_err();
        assert!(matches!(err, Error::MalformedPayload(_)));
    }

    #[test]
    fn test_stub_uses_version_paths() {
        let factory = factory();
        let svc = factory
            .stub(&"v1beta3".into(), "Service", "frontend", Some("demo"))
            .unwrap();
        assert_eq!(svc.identity().to_string(), "Service/demo/frontend");
        assert_eq!(svc.api_version().as_str(), "v1beta3");

        let project = factory.stub(&"v1".into(), "Project", "demo", Some("ignored")).unwrap();
        assert_eq!(project.namespace(), "");

        assert!(factory.stub(&"v9".into(), "Pod", "x", None).unwrap_err().is_unsupported_version());
    }
}
