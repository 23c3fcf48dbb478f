//! Build cancellation.

use super::{Capability, CapabilityProvider};
use crate::client::ClientHandle;
use crate::error::Result;
use crate::registry::keys;
use crate::resource::{Build, Facade, ResourceId, ResourceObject};
use async_trait::async_trait;
use tracing::{debug, info};

/// Requests cancellation of a running build.
#[derive(Debug, Clone)]
pub struct BuildCancel {
    build: ResourceId,
    client: ClientHandle,
}

impl Capability for BuildCancel {
    const NAME: &'static str = "build-cancel";
}

impl BuildCancel {
    /// Mark the build cancelled. A build that already finished is returned
    /// unchanged.
    pub async fn cancel(&self) -> Result<Build> {
        let client = self.client.client()?;
        let mut build: Build = client
            .get_typed(&self.build.name, Some(&self.build.namespace))
            .await?;

        if build.is_finished()? {
            debug!("{} already finished, nothing to cancel", self.build);
            return Ok(build);
        }

        build.set(keys::CANCELLED, true)?;
        info!("Cancelling {}", self.build);
        client.update(&build.into_resource()).await?.downcast()
    }
}

/// Supported for builds whose version maps the cancellation flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildCancelProvider;

#[async_trait]
impl CapabilityProvider<ResourceObject> for BuildCancelProvider {
    type Capability = BuildCancel;

    async fn supports(&self, owner: &ResourceObject) -> bool {
        owner.kind() == Build::KIND
            && owner.property_map().contains(keys::CANCELLED)
            && owner.client_handle().is_attached()
    }

    fn build(&self, owner: &ResourceObject) -> BuildCancel {
        BuildCancel {
            build: owner.identity(),
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
    async fn test_cancel_running_build() {
        let http = Arc::new(ScriptedHttp::new());
        let path = "/oapi/v1/namespaces/demo/builds/app-1";
        http.respond("GET", path, &fixtures::build("v1", "app-1", "Running"));
        http.respond("PUT", path, &fixtures::build("v1", "app-1", "Cancelled"));
        let client = fixtures::client(Arc::clone(&http)).await;

        let build = client.get("Build", "app-1", Some("demo")).await.unwrap();
        let cancelled = build
            .capability::<BuildCancel>()
            .await
            .unwrap()
            .cancel()
            .await
            .unwrap();

        assert_eq!(cancelled.phase().unwrap(), "Cancelled");
        let sent: serde_json::Value =
            serde_json::from_str(&http.last_body("PUT", path).unwrap()).unwrap();
        assert_eq!(sent["status"]["cancelled"], true);
    }

    #[tokio::test]
    async fn test_finished_build_is_left_alone() {
        let http = Arc::new(ScriptedHttp::new());
        let path = "/oapi/v1/namespaces/demo/builds/app-2";
        http.respond("GET", path, &fixtures::build("v1", "app-2", "Complete"));
        let client = fixtures::client(Arc::clone(&http)).await;

        let build = client.get("Build", "app-2", Some("demo")).await.unwrap();
        let result = build
            .accept::<BuildCancel, _, _>(|c| c.clone())
            .await
            .unwrap()
            .cancel()
            .await
            .unwrap();

        assert_eq!(result.phase().unwrap(), "Complete");
        assert!(http.last_body("PUT", path).is_none());
    }
}
