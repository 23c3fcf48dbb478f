//! Pods and replicated workloads.

use super::facade;
use crate::error::Result;
use crate::registry::keys;
use std::collections::BTreeMap;

facade!(
    /// A scheduled group of containers.
    Pod,
    [keys::POD_IP, keys::PHASE, keys::NODE, keys::CONTAINERS, keys::SERVICE_ACCOUNT]
);

impl Pod {
    pub fn ip(&self) -> Result<String> {
        self.string(keys::POD_IP)
    }

    /// `Pending`, `Running`, `Succeeded`, `Failed` or `Unknown`
    pub fn phase(&self) -> Result<String> {
        self.string(keys::PHASE)
    }

    /// Node the pod is bound to
    pub fn node(&self) -> Result<String> {
        self.string(keys::NODE)
    }

    pub fn service_account(&self) -> Result<String> {
        self.string(keys::SERVICE_ACCOUNT)
    }

    /// Names of the pod's containers, in declaration order.
    pub fn container_names(&self) -> Result<Vec<String>> {
        let containers = self.list(keys::CONTAINERS)?;
        Ok(containers
            .iter()
            .filter_map(|c| c.get("name").and_then(|n| n.as_str()))
            .map(String::from)
            .collect())
    }

    /// Container exec and logs target when none is named
    pub fn default_container(&self) -> Result<Option<String>> {
        Ok(self.container_names()?.into_iter().next())
    }
}

facade!(
    /// Keeps a fixed number of pod replicas running.
    ReplicationController,
    [keys::REPLICAS, keys::CURRENT_REPLICAS, keys::SELECTOR]
);

impl ReplicationController {
    /// Desired replicas
    pub fn replicas(&self) -> Result<i64> {
        self.int(keys::REPLICAS)
    }

    /// Replicas observed by the controller
    pub fn current_replicas(&self) -> Result<i64> {
        self.int(keys::CURRENT_REPLICAS)
    }

    pub fn selector(&self) -> Result<BTreeMap<String, String>> {
        self.string_map(keys::SELECTOR)
    }

    pub fn set_replicas(&mut self, replicas: i64) -> Result<()> {
        self.set(keys::REPLICAS, replicas)
    }
}

facade!(
    /// Template and trigger policy for rolling out replication controllers.
    DeploymentConfig,
    [keys::REPLICAS, keys::SELECTOR, keys::LATEST_VERSION]
);

impl DeploymentConfig {
    pub fn replicas(&self) -> Result<i64> {
        self.int(keys::REPLICAS)
    }

    pub fn selector(&self) -> Result<BTreeMap<String, String>> {
        self.string_map(keys::SELECTOR)
    }

    /// Sequence number of the most recent deployment
    pub fn latest_version(&self) -> Result<i64> {
        self.int(keys::LATEST_VERSION)
    }

    pub fn set_replicas(&mut self, replicas: i64) -> Result<()> {
        self.set(keys::REPLICAS, replicas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::PropertyRegistry;
    use crate::resource::ResourceFactory;
    use crate::test_support::fixtures;
    use std::sync::Arc;

    fn factory() -> ResourceFactory {
        ResourceFactory::new(Arc::new(PropertyRegistry::builtin()))
    }

    #[test]
    fn test_pod_accessors_across_versions() {
        let factory = factory();
        for version in ["v1", "v1beta3"] {
            let pod: Pod = factory.create_typed(&fixtures::pod(version, "web")).unwrap();
            assert_eq!(pod.ip().unwrap(), "10.1.2.3", "{}", version);
            assert_eq!(pod.node().unwrap(), "node-1", "{}", version);
            assert_eq!(pod.service_account().unwrap(), "default", "{}", version);
            assert_eq!(pod.phase().unwrap(), "Running");
            assert_eq!(pod.container_names().unwrap(), vec!["app", "sidecar"]);
            assert_eq!(pod.default_container().unwrap().as_deref(), Some("app"));
        }
    }

    #[test]
    fn test_pod_without_status_reads_empty() {
        let pod: Pod = factory()
            .create_typed(r#"{"kind":"Pod","apiVersion":"v1","metadata":{"name":"p"}}"#)
            .unwrap();
        assert_eq!(pod.ip().unwrap(), "");
        assert!(pod.container_names().unwrap().is_empty());
        assert_eq!(pod.default_container().unwrap(), None);
    }

    #[test]
    fn test_replicas_type_mismatch() {
        let rc: ReplicationController = factory()
            .create_typed(
                r#"{"kind":"ReplicationController","apiVersion":"v1",
                    "metadata":{"name":"rc"},"spec":{"replicas":"many"}}"#,
            )
            .unwrap();
        assert!(rc.replicas().unwrap_err().is_type_mismatch());
        assert_eq!(rc.current_replicas().unwrap(), 0);
    }

    #[test]
    fn test_deployment_config_scaling() {
        let mut dc: DeploymentConfig = factory()
            .create_typed(&fixtures::deployment_config("v1", "frontend", 2))
            .unwrap();
        assert_eq!(dc.replicas().unwrap(), 2);
        assert_eq!(dc.latest_version().unwrap(), 3);
        assert_eq!(dc.selector().unwrap().get("app").map(String::as_str), Some("frontend"));

        dc.set_replicas(5).unwrap();
        assert_eq!(dc.replicas().unwrap(), 5);
    }
}
