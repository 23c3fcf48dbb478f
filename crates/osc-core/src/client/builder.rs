//! Client construction and version negotiation.

use super::{Client, ClientInner, Wire, DEFAULT_TIMEOUT};
use crate::capability::{
    default_client_capabilities, default_resource_capabilities, Capabilities, CapabilityProvider,
    CapabilityRegistry,
};
use crate::error::{Error, Result};
use crate::registry::{ApiVersion, PropertyRegistry};
use crate::resource::{kinds, ApiGroup, ResourceObject};
use crate::transport::{
    Anonymous, Authorizer, BearerToken, ChannelProtocol, HttpTransport, ReqwestTransport,
    StreamTransport, WebSocketTransport,
};
use reqwest::{Method, Url};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Deserialize)]
struct VersionList {
    #[serde(default)]
    versions: Vec<String>,
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    base_url: String,
    timeout: Duration,
    namespace: String,
    authorizer: Arc<dyn Authorizer>,
    http: Option<Arc<dyn HttpTransport>>,
    streams: Option<Arc<dyn StreamTransport>>,
    insecure: bool,
    exec_protocol: ChannelProtocol,
    registry: Option<Arc<PropertyRegistry>>,
    resource_capabilities: CapabilityRegistry<ResourceObject>,
    client_capabilities: CapabilityRegistry<Client>,
}

impl ClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            namespace: "default".to_string(),
            authorizer: Arc::new(Anonymous),
            http: None,
            streams: None,
            insecure: false,
            exec_protocol: ChannelProtocol::default(),
            registry: None,
            resource_capabilities: default_resource_capabilities(),
            client_capabilities: default_client_capabilities(),
        }
    }

    /// Authenticate with an OAuth bearer token.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.authorizer = Arc::new(BearerToken::new(token));
        self
    }

    pub fn authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Default per-call timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Namespace for calls that name none
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn http_transport(mut self, http: Arc<dyn HttpTransport>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn stream_transport(mut self, streams: Arc<dyn StreamTransport>) -> Self {
        self.streams = Some(streams);
        self
    }

    /// Accept invalid TLS certificates on the default HTTP transport.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn exec_protocol(mut self, protocol: ChannelProtocol) -> Self {
        self.exec_protocol = protocol;
        self
    }

    /// Property registry; the built-in one when not set.
    pub fn registry(mut self, registry: Arc<PropertyRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Add or replace a resource capability.
    pub fn resource_capability<P>(mut self, provider: P) -> Self
    where
        P: CapabilityProvider<ResourceObject>,
    {
        self.resource_capabilities.register(provider);
        self
    }

    /// Add or replace a client capability.
    pub fn client_capability<P>(mut self, provider: P) -> Self
    where
        P: CapabilityProvider<Client>,
    {
        self.client_capabilities.register(provider);
        self
    }

    /// Negotiate versions with the server and build the client.
    ///
    /// The Kubernetes group must negotiate. A server without `/oapi` is
    /// accepted; OpenShift kinds then fail with `UnsupportedVersion`.
    pub async fn connect(self) -> Result<Client> {
        let wire = self.wire()?;
        let registry = self.registry_or_builtin();

        let mut versions = BTreeMap::new();
        for group in ApiGroup::ALL {
            match negotiate(&wire, &registry, group, self.timeout).await {
                Ok(version) => {
                    info!("Using {} API version {}", group, version);
                    versions.insert(group, version);
                }
                Err(e) if group == ApiGroup::OpenShift && e.is_not_found() => {
                    info!("Server does not serve {}", group.prefix());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(self.finish(wire, registry, versions))
    }

    /// Build without contacting the server, using known versions.
    pub fn build_with_versions<I>(self, versions: I) -> Result<Client>
    where
        I: IntoIterator<Item = (ApiGroup, ApiVersion)>,
    {
        let wire = self.wire()?;
        let registry = self.registry_or_builtin();
        let versions: BTreeMap<_, _> = versions.into_iter().collect();
        for version in versions.values() {
            if !registry.versions().any(|v| v == version) {
                return Err(Error::UnsupportedVersion {
                    version: version.to_string(),
                    detail: "no property maps registered for this version".to_string(),
                });
            }
        }
        Ok(self.finish(wire, registry, versions))
    }

    fn wire(&self) -> Result<Wire> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(self.base_url.clone()));
        }
        let http: Arc<dyn HttpTransport> = match &self.http {
            Some(http) => Arc::clone(http),
            None if self.insecure => Arc::new(ReqwestTransport::insecure()?),
            None => Arc::new(ReqwestTransport::new()?),
        };
        Ok(Wire::new(base_url, http, Arc::clone(&self.authorizer)))
    }

    fn registry_or_builtin(&self) -> Arc<PropertyRegistry> {
        self.registry
            .clone()
            .unwrap_or_else(|| Arc::new(PropertyRegistry::builtin()))
    }

    fn finish(
        self,
        wire: Wire,
        registry: Arc<PropertyRegistry>,
        versions: BTreeMap<ApiGroup, ApiVersion>,
    ) -> Client {
        let streams: Arc<dyn StreamTransport> = match self.streams {
            Some(streams) => streams,
            None => Arc::new(WebSocketTransport::new()),
        };
        let inner = ClientInner {
            wire,
            streams,
            registry,
            versions,
            resource_capabilities: Arc::new(self.resource_capabilities),
            capabilities: Capabilities::new(Arc::new(self.client_capabilities)),
            discovery: Mutex::new(HashMap::new()),
            exec_protocol: self.exec_protocol,
            namespace: self.namespace,
            timeout: self.timeout,
        };
        Client::from_inner(Arc::new(inner))
    }
}

/// Ask `{prefix}` for its versions and pick the best one we can read.
async fn negotiate(
    wire: &Wire,
    registry: &PropertyRegistry,
    group: ApiGroup,
    timeout: Duration,
) -> Result<ApiVersion> {
    let url = wire.url(&[group.prefix().trim_start_matches('/')])?;
    let body = wire.send(Method::GET, url, None, timeout).await?;
    let list: VersionList = serde_json::from_str(&body)
        .map_err(|e| Error::malformed(format!("version list from {}: {}", group.prefix(), e)))?;
    debug!("{} advertises {:?}", group.prefix(), list.versions);
    let kinds: Vec<&str> = kinds()
        .iter()
        .filter(|info| info.group == group)
        .map(|info| info.kind)
        .collect();
    registry.negotiate_for(&list.versions, &kinds)
}
