//! Self-service project provisioning.

use super::{Capability, CapabilityProvider};
use crate::client::{Client, ClientHandle};
use crate::error::Result;
use crate::resource::{ApiGroup, Project};
use crate::value::ValueTree;
use async_trait::async_trait;
use reqwest::Method;
use tracing::{info, warn};

/// Creates projects through the `projectrequests` endpoint, which lets
/// regular users provision a project without cluster-wide rights.
#[derive(Debug, Clone)]
pub struct ProjectRequest {
    client: ClientHandle,
}

impl Capability for ProjectRequest {
    const NAME: &'static str = "project-request";
}

impl ProjectRequest {
    pub async fn request(
        &self,
        name: &str,
        display_name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Project> {
        let client = self.client.client()?;
        let version = client.version(ApiGroup::OpenShift)?;

        let mut body = ValueTree::new();
        body.set(&"kind".into(), "ProjectRequest")?;
        body.set(&"apiVersion".into(), version.as_str())?;
        body.set(&"metadata.name".into(), name)?;
        if let Some(display_name) = display_name {
            body.set(&"displayName".into(), display_name)?;
        }
        if let Some(description) = description {
            body.set(&"description".into(), description)?;
        }

        let url = client.collection_url(ApiGroup::OpenShift, None, "projectrequests")?;
        info!("Requesting project {}", name);
        let response = client.send(Method::POST, url, Some(body.to_json())).await?;
        client.factory().create_typed(&response)
    }
}

/// Supported when the server lists `projectrequests`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectRequestProvider;

#[async_trait]
impl CapabilityProvider<Client> for ProjectRequestProvider {
    type Capability = ProjectRequest;

    async fn supports(&self, owner: &Client) -> bool {
        owner
            .has_api_resource(ApiGroup::OpenShift, "projectrequests")
            .await
            .unwrap_or_else(|e| {
                warn!("Could not probe projectrequests: {}", e);
                false
            })
    }

    fn build(&self, owner: &Client) -> ProjectRequest {
        ProjectRequest {
            client: owner.handle(),
        }
    }
}
