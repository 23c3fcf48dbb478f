//! Replica scaling.

use super::{Capability, CapabilityProvider};
use crate::client::ClientHandle;
use crate::error::{Error, Result};
use crate::registry::keys;
use crate::resource::{DeploymentConfig, Facade, ReplicationController, Resource, ResourceId, ResourceObject};
use async_trait::async_trait;
use tracing::info;

/// Sets the desired replica count of a replicated workload.
#[derive(Debug, Clone)]
pub struct Scalable {
    target: ResourceId,
    client: ClientHandle,
}

impl Capability for Scalable {
    const NAME: &'static str = "scale";
}

impl Scalable {
    /// Read the latest state, set the replica count and write it back.
    pub async fn scale(&self, replicas: i64) -> Result<Resource> {
        if replicas < 0 {
            return Err(Error::Other(format!(
                "Cannot scale {} to {} replicas",
                self.target, replicas
            )));
        }
        let client = self.client.client()?;
        let mut current = client
            .get(&self.target.kind, &self.target.name, Some(&self.target.namespace))
            .await?;
        current.set(keys::REPLICAS, replicas)?;
        info!("Scaling {} to {} replicas", self.target, replicas);
        client.update(&current).await
    }
}

/// Supported for deployment configs and replication controllers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalableProvider;

#[async_trait]
impl CapabilityProvider<ResourceObject> for ScalableProvider {
    type Capability = Scalable;

    async fn supports(&self, owner: &ResourceObject) -> bool {
        let scalable_kind = [DeploymentConfig::KIND, ReplicationController::KIND].contains(&owner.kind());
        scalable_kind
            && owner.property_map().contains(keys::REPLICAS)
            && owner.client_handle().is_attached()
    }

    fn build(&self, owner: &ResourceObject) -> Scalable {
        Scalable {
            target: owner.identity(),
            client: owner.client_handle().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixtures, ScriptedHttp};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_scale_updates_replicas() {
        let http = Arc::new(ScriptedHttp::new());
        let path = "/oapi/v1/namespaces/demo/deploymentconfigs/frontend";
        http.respond("GET", path, &fixtures::deployment_config("v1", "frontend", 2));
        http.respond("PUT", path, &fixtures::deployment_config("v1", "frontend", 4));
        let client = fixtures::client(Arc::clone(&http)).await;

        let dc = client.get("DeploymentConfig", "frontend", Some("demo")).await.unwrap();
        let scaled = dc
            .capability::<Scalable>()
            .await
            .unwrap()
            .scale(4)
            .await
            .unwrap();

        assert_eq!(scaled.int(keys::REPLICAS).unwrap(), 4);
        let sent: serde_json::Value =
            serde_json::from_str(&http.last_body("PUT", path).unwrap()).unwrap();
        assert_eq!(sent["spec"]["replicas"], 4);
    }

    #[tokio::test]
    async fn test_negative_replicas_rejected() {
        let http = Arc::new(ScriptedHttp::new());
        let client = fixtures::client(Arc::clone(&http)).await;
        let rc = client
            .factory()
            .create(
                r#"{"kind":"ReplicationController","apiVersion":"v1",
                    "metadata":{"name":"rc","namespace":"demo"},"spec":{"replicas":1}}"#,
            )
            .unwrap();
        let scale = rc.capability::<Scalable>().await.unwrap();
        assert!(scale.scale(-1).await.is_err());
    }

    #[tokio::test]
    async fn test_pods_are_not_scalable() {
        let http = Arc::new(ScriptedHttp::new());
        let client = fixtures::client(Arc::clone(&http)).await;
        let pod = client.factory().create(&fixtures::pod("v1", "web")).unwrap();
        assert!(!pod.supports::<Scalable>().await);
    }
}
