//! Static catalogue of resource kinds.

use super::{
    Build, BuildConfig, DeploymentConfig, Facade, ImageStream, Namespace, Pod, Project,
    ReplicationController, Resource, ResourceObject, Route, Service,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API group a kind is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiGroup {
    /// Core kinds under `/api`
    Kubernetes,
    /// Platform kinds under `/oapi`
    OpenShift,
}

impl ApiGroup {
    pub const ALL: [ApiGroup; 2] = [ApiGroup::Kubernetes, ApiGroup::OpenShift];

    /// URL prefix of the group
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Kubernetes => "/api",
            Self::OpenShift => "/oapi",
        }
    }
}

impl fmt::Display for ApiGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kubernetes => write!(f, "kubernetes"),
            Self::OpenShift => write!(f, "openshift"),
        }
    }
}

/// Static description of a kind.
#[derive(Clone, Copy)]
pub struct KindInfo {
    pub kind: &'static str,
    /// Collection name used in URLs
    pub plural: &'static str,
    pub group: ApiGroup,
    pub namespaced: bool,
    pub construct: fn(ResourceObject) -> Resource,
}

impl fmt::Debug for KindInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindInfo")
            .field("kind", &self.kind)
            .field("plural", &self.plural)
            .field("group", &self.group)
            .field("namespaced", &self.namespaced)
            .finish()
    }
}

fn construct<F: Facade>(object: ResourceObject) -> Resource {
    F::from_object(object).into_resource()
}

const fn entry<F: Facade>(
    plural: &'static str,
    group: ApiGroup,
    namespaced: bool,
) -> KindInfo {
    KindInfo {
        kind: F::KIND,
        plural,
        group,
        namespaced,
        construct: construct::<F>,
    }
}

static KINDS: &[KindInfo] = &[
    entry::<Pod>("pods", ApiGroup::Kubernetes, true),
    entry::<Service>("services", ApiGroup::Kubernetes, true),
    entry::<ReplicationController>("replicationcontrollers", ApiGroup::Kubernetes, true),
    entry::<Namespace>("namespaces", ApiGroup::Kubernetes, false),
    entry::<Build>("builds", ApiGroup::OpenShift, true),
    entry::<BuildConfig>("buildconfigs", ApiGroup::OpenShift, true),
    entry::<DeploymentConfig>("deploymentconfigs", ApiGroup::OpenShift, true),
    entry::<ImageStream>("imagestreams", ApiGroup::OpenShift, true),
    entry::<Route>("routes", ApiGroup::OpenShift, true),
    entry::<Project>("projects", ApiGroup::OpenShift, false),
];

/// Look up a kind by its exact name.
pub fn kind_info(kind: &str) -> Option<&'static KindInfo> {
    KINDS.iter().find(|k| k.kind == kind)
}

/// Resolve a user-typed name: kind, plural or singular, any case.
pub fn resolve_kind(name: &str) -> Option<&'static KindInfo> {
    let lower = name.to_ascii_lowercase();
    KINDS.iter().find(|k| {
        k.kind.eq_ignore_ascii_case(&lower)
            || k.plural == lower
            || k.plural.strip_suffix('s') == Some(lower.as_str())
    })
}

/// All known kinds.
pub fn kinds() -> &'static [KindInfo] {
    KINDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_lookup() {
        let pod = kind_info("Pod").unwrap();
        assert_eq!(pod.plural, "pods");
        assert_eq!(pod.group, ApiGroup::Kubernetes);
        assert!(pod.namespaced);

        let project = kind_info("Project").unwrap();
        assert_eq!(project.group.prefix(), "/oapi");
        assert!(!project.namespaced);

        assert!(kind_info("pod").is_none());
        assert!(kind_info("Widget").is_none());
    }

    #[test]
    fn test_resolve_user_names() {
        assert_eq!(resolve_kind("pods").unwrap().kind, "Pod");
        assert_eq!(resolve_kind("dc").map(|k| k.kind), None);
        assert_eq!(resolve_kind("deploymentconfig").unwrap().kind, "DeploymentConfig");
        assert_eq!(resolve_kind("BuildConfigs").unwrap().kind, "BuildConfig");
        assert_eq!(resolve_kind("route").unwrap().kind, "Route");
    }

    #[test]
    fn test_kind_names_are_unique() {
        let mut names: Vec<_> = kinds().iter().map(|k| k.kind).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), kinds().len());
    }
}
