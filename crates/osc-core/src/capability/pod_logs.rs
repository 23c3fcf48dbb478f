//! Container logs of a pod.

use super::{Capability, CapabilityProvider};
use crate::client::ClientHandle;
use crate::error::Result;
use crate::resource::{ApiGroup, Facade, Pod, ResourceId, ResourceObject};
use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, warn};

/// Fetches the log of one of a pod's containers.
#[derive(Debug, Clone)]
pub struct PodLogs {
    pod: ResourceId,
    client: ClientHandle,
}

impl Capability for PodLogs {
    const NAME: &'static str = "pod-logs";
}

impl PodLogs {
    /// Full log of `container`, or of the pod's only container when `None`.
    pub async fn fetch(&self, container: Option<&str>) -> Result<String> {
        let client = self.client.client()?;
        let mut url =
            client.subresource_url(Pod::KIND, Some(&self.pod.namespace), &self.pod.name, "log")?;
        if let Some(container) = container {
            url.query_pairs_mut().append_pair("container", container);
        }
        debug!("Fetching logs of {}", self.pod);
        client.send(Method::GET, url, None).await
    }
}

/// Supported for pods when the server serves `pods/log`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PodLogsProvider;

#[async_trait]
impl CapabilityProvider<ResourceObject> for PodLogsProvider {
    type Capability = PodLogs;

    async fn supports(&self, owner: &ResourceObject) -> bool {
        if owner.kind() != Pod::KIND {
            return false;
        }
        let Ok(client) = owner.client() else {
            return false;
        };
        client
            .has_api_resource(ApiGroup::Kubernetes, "pods/log")
            .await
            .unwrap_or_else(|e| {
                warn!("Could not probe pods/log for {}: {}", owner.identity(), e);
                false
            })
    }

    fn build(&self, owner: &ResourceObject) -> PodLogs {
        PodLogs {
            pod: owner.identity(),
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
    async fn test_fetch_container_log() {
        let http = Arc::new(ScriptedHttp::new());
        http.respond(
            "GET",
            "/api/v1/namespaces/demo/pods/web",
            &fixtures::pod("v1", "web"),
        );
        http.respond("GET", "/api/v1", &fixtures::api_resources(&["pods", "pods/log"]));
        http.respond(
            "GET",
            "/api/v1/namespaces/demo/pods/web/log?container=app",
            "line one\nline two\n",
        );
        let client = fixtures::client(Arc::clone(&http)).await;

        let pod = client.get("Pod", "web", Some("demo")).await.unwrap();
        let logs = pod.capability::<PodLogs>().await.unwrap();
        assert_eq!(logs.fetch(Some("app")).await.unwrap(), "line one\nline two\n");
    }

    #[tokio::test]
    async fn test_unsupported_without_log_subresource() {
        let http = Arc::new(ScriptedHttp::new());
        http.respond("GET", "/api/v1", &fixtures::api_resources(&["pods"]));
        let client = fixtures::client(Arc::clone(&http)).await;

        let pod = client.factory().create(&fixtures::pod("v1", "web")).unwrap();
        assert!(!pod.supports::<PodLogs>().await);

        let svc = client.factory().create(&fixtures::service("v1")).unwrap();
        assert!(!svc.supports::<PodLogs>().await);
    }
}
