//! Built-in property tables for the `v1beta3` and `v1` wire formats.
//!
//! Every kind also gets the [`METADATA`] entries.

use super::keys::*;

pub(super) type Table = &'static [(&'static str, &'static [&'static str])];

pub(super) const METADATA: Table = &[
    (NAME, &["metadata", "name"]),
    (NAMESPACE, &["metadata", "namespace"]),
    (LABELS, &["metadata", "labels"]),
    (ANNOTATIONS, &["metadata", "annotations"]),
    (CREATION_TIMESTAMP, &["metadata", "creationTimestamp"]),
    (RESOURCE_VERSION, &["metadata", "resourceVersion"]),
    (UID, &["metadata", "uid"]),
];

// ─────────────────────────────────────────────────────────────────────────────
// Kubernetes kinds
// ─────────────────────────────────────────────────────────────────────────────

const POD_V1: Table = &[
    (POD_IP, &["status", "podIP"]),
    (PHASE, &["status", "phase"]),
    (NODE, &["spec", "nodeName"]),
    (CONTAINERS, &["spec", "containers"]),
    (SERVICE_ACCOUNT, &["spec", "serviceAccountName"]),
];

const POD_V1BETA3: Table = &[
    (POD_IP, &["status", "podIP"]),
    (PHASE, &["status", "phase"]),
    (NODE, &["spec", "host"]),
    (CONTAINERS, &["spec", "containers"]),
    (SERVICE_ACCOUNT, &["spec", "serviceAccount"]),
];

const SERVICE_V1: Table = &[
    (SELECTOR, &["spec", "selector"]),
    (CLUSTER_IP, &["spec", "clusterIP"]),
    (PORTS, &["spec", "ports"]),
    (SERVICE_TYPE, &["spec", "type"]),
];

const SERVICE_V1BETA3: Table = &[
    (SELECTOR, &["spec", "selector"]),
    (CLUSTER_IP, &["spec", "portalIP"]),
    (PORTS, &["spec", "ports"]),
    (SERVICE_TYPE, &["spec", "type"]),
];

const REPLICATION_CONTROLLER: Table = &[
    (REPLICAS, &["spec", "replicas"]),
    (CURRENT_REPLICAS, &["status", "replicas"]),
    (SELECTOR, &["spec", "selector"]),
];

const NAMESPACE_KIND: Table = &[(PHASE, &["status", "phase"])];

// ─────────────────────────────────────────────────────────────────────────────
// OpenShift kinds
// ─────────────────────────────────────────────────────────────────────────────

const BUILD: Table = &[
    (PHASE, &["status", "phase"]),
    (MESSAGE, &["status", "message"]),
    (CANCELLED, &["status", "cancelled"]),
    (OUTPUT_IMAGE, &["spec", "output", "to", "name"]),
    (SOURCE_URI, &["spec", "source", "git", "uri"]),
];

const BUILD_CONFIG: Table = &[
    (OUTPUT_IMAGE, &["spec", "output", "to", "name"]),
    (SOURCE_URI, &["spec", "source", "git", "uri"]),
    (STRATEGY, &["spec", "strategy", "type"]),
];

const DEPLOYMENT_CONFIG: Table = &[
    (REPLICAS, &["spec", "replicas"]),
    (SELECTOR, &["spec", "selector"]),
    (LATEST_VERSION, &["status", "latestVersion"]),
];

const IMAGE_STREAM_V1: Table = &[
    (DOCKER_IMAGE_REPOSITORY, &["status", "dockerImageRepository"]),
    (TAGS, &["spec", "tags"]),
];

const IMAGE_STREAM_V1BETA3: Table = &[
    (DOCKER_IMAGE_REPOSITORY, &["spec", "dockerImageRepository"]),
    (TAGS, &["spec", "tags"]),
];

const ROUTE: Table = &[
    (HOST, &["spec", "host"]),
    (PATH, &["spec", "path"]),
    (SERVICE_NAME, &["spec", "to", "name"]),
    (TLS_TERMINATION, &["spec", "tls", "termination"]),
];

const PROJECT: Table = &[
    (DISPLAY_NAME, &["metadata", "annotations", "openshift.io/display-name"]),
    (DESCRIPTION, &["metadata", "annotations", "openshift.io/description"]),
    (PHASE, &["status", "phase"]),
];

/// (version, kind, kind-specific table)
pub(super) const TABLES: &[(&str, &str, Table)] = &[
    ("v1", "Pod", POD_V1),
    ("v1beta3", "Pod", POD_V1BETA3),
    ("v1", "Service", SERVICE_V1),
    ("v1beta3", "Service", SERVICE_V1BETA3),
    ("v1", "ReplicationController", REPLICATION_CONTROLLER),
    ("v1beta3", "ReplicationController", REPLICATION_CONTROLLER),
    ("v1", "Namespace", NAMESPACE_KIND),
    ("v1beta3", "Namespace", NAMESPACE_KIND),
    ("v1", "Build", BUILD),
    ("v1beta3", "Build", BUILD),
    ("v1", "BuildConfig", BUILD_CONFIG),
    ("v1beta3", "BuildConfig", BUILD_CONFIG),
    ("v1", "DeploymentConfig", DEPLOYMENT_CONFIG),
    ("v1beta3", "DeploymentConfig", DEPLOYMENT_CONFIG),
    ("v1", "ImageStream", IMAGE_STREAM_V1),
    ("v1beta3", "ImageStream", IMAGE_STREAM_V1BETA3),
    ("v1", "Route", ROUTE),
    ("v1beta3", "Route", ROUTE),
    ("v1", "Project", PROJECT),
    ("v1beta3", "Project", PROJECT),
];
