//! Symbolic property names shared by the property tables and the facades.

// Common metadata
pub const NAME: &str = "name";
pub const NAMESPACE: &str = "namespace";
pub const LABELS: &str = "labels";
pub const ANNOTATIONS: &str = "annotations";
pub const CREATION_TIMESTAMP: &str = "creationTimestamp";
pub const RESOURCE_VERSION: &str = "resourceVersion";
pub const UID: &str = "uid";

// Status / scheduling
pub const PHASE: &str = "phase";
pub const MESSAGE: &str = "message";
pub const POD_IP: &str = "podIP";
pub const NODE: &str = "node";
pub const CONTAINERS: &str = "containers";
pub const SERVICE_ACCOUNT: &str = "serviceAccount";

// Replication
pub const REPLICAS: &str = "replicas";
pub const CURRENT_REPLICAS: &str = "currentReplicas";
pub const SELECTOR: &str = "selector";
pub const LATEST_VERSION: &str = "latestVersion";

// Networking
pub const CLUSTER_IP: &str = "clusterIP";
pub const PORTS: &str = "ports";
pub const SERVICE_TYPE: &str = "serviceType";
pub const HOST: &str = "host";
pub const PATH: &str = "path";
pub const SERVICE_NAME: &str = "serviceName";
pub const TLS_TERMINATION: &str = "tlsTermination";

// Builds and images
pub const CANCELLED: &str = "cancelled";
pub const OUTPUT_IMAGE: &str = "outputImage";
pub const SOURCE_URI: &str = "sourceUri";
pub const STRATEGY: &str = "strategy";
pub const DOCKER_IMAGE_REPOSITORY: &str = "dockerImageRepository";
pub const TAGS: &str = "tags";

// Projects
pub const DISPLAY_NAME: &str = "displayName";
pub const DESCRIPTION: &str = "description";
