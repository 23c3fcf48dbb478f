//! Control-plane API client.
//!
//! A [`Client`] owns the negotiated API versions, the transports, the
//! property registry and the capability registries. Resources it returns
//! keep a weak [`ClientHandle`] back to it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use osc_core::resource::Pod;
//! use osc_core::Client;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::builder("https://openshift.example.com:8443")
//!         .token("sha256~...")
//!         .namespace("demo")
//!         .connect()
//!         .await?;
//!     for pod in client.list_typed::<Pod>(None).await? {
//!         println!("{} {}", pod.name(), pod.phase()?);
//!     }
//!     Ok(())
//! }
//! ```

mod builder;

pub use builder::ClientBuilder;

use crate::capability::{Capabilities, Capability, CapabilityRegistry};
use crate::error::{Error, Result, TransportError};
use crate::registry::{ApiVersion, PropertyRegistry};
use crate::resource::{
    kind_info, ApiGroup, Facade, KindInfo, Resource, ResourceFactory, ResourceObject,
};
use crate::transport::{
    Authorizer, ChannelProtocol, HttpRequest, HttpTransport, StreamTransport,
};
use reqwest::header::HeaderMap;
use reqwest::{Method, Url};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tracing::debug;

/// Default per-call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Base URL, HTTP transport and credentials.
pub(crate) struct Wire {
    base_url: Url,
    http: Arc<dyn HttpTransport>,
    authorizer: Arc<dyn Authorizer>,
}

impl Wire {
    pub(crate) fn new(
        base_url: Url,
        http: Arc<dyn HttpTransport>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            base_url,
            http,
            authorizer,
        }
    }

    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<String>,
        timeout: Duration,
    ) -> Result<String> {
        let mut headers = HeaderMap::new();
        self.authorizer.decorate(&mut headers);
        let url = url.to_string();
        let request = HttpRequest {
            method,
            url: url.clone(),
            headers,
            timeout,
            body,
        };

        // Transports may ignore `request.timeout`
        match tokio::time::timeout(timeout, self.http.send(request)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(TransportError::Timeout {
                url,
                timeout_ms: timeout.as_millis() as u64,
            }
            .into()),
        }
    }
}

pub(crate) struct ClientInner {
    wire: Wire,
    streams: Arc<dyn StreamTransport>,
    registry: Arc<PropertyRegistry>,
    versions: BTreeMap<ApiGroup, ApiVersion>,
    resource_capabilities: Arc<CapabilityRegistry<ResourceObject>>,
    capabilities: Capabilities<Client>,
    discovery: Mutex<HashMap<ApiGroup, Arc<Vec<String>>>>,
    exec_protocol: ChannelProtocol,
    namespace: String,
    timeout: Duration,
}

#[derive(Deserialize)]
struct ApiResourceList {
    #[serde(default)]
    resources: Vec<ApiResource>,
}

#[derive(Deserialize)]
struct ApiResource {
    name: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Connected API client. Cheap to clone; clones share everything except
/// the per-call timeout.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
    timeout: Duration,
}

impl Client {
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    fn from_inner(inner: Arc<ClientInner>) -> Self {
        let timeout = inner.timeout;
        Self { inner, timeout }
    }

    /// Weak handle for resources and capabilities
    pub fn handle(&self) -> ClientHandle {
        ClientHandle(Arc::downgrade(&self.inner))
    }

    /// Same client with a different per-call timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Client {
        Self {
            inner: Arc::clone(&self.inner),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.wire.base_url
    }

    /// Namespace used when a call names none
    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn registry(&self) -> &Arc<PropertyRegistry> {
        &self.inner.registry
    }

    /// Negotiated version of `group`.
    pub fn version(&self, group: ApiGroup) -> Result<ApiVersion> {
        self.inner
            .versions
            .get(&group)
            .cloned()
            .ok_or_else(|| Error::UnsupportedVersion {
                version: "<none>".to_string(),
                detail: format!("server does not serve {}", group.prefix()),
            })
    }

    pub fn versions(&self) -> impl Iterator<Item = (ApiGroup, &ApiVersion)> {
        self.inner.versions.iter().map(|(g, v)| (*g, v))
    }

    /// Factory whose resources are bound to this client.
    pub fn factory(&self) -> ResourceFactory {
        ResourceFactory::bound(
            Arc::clone(&self.inner.registry),
            self.handle(),
            Arc::clone(&self.inner.resource_capabilities),
        )
    }

    pub fn exec_protocol(&self) -> ChannelProtocol {
        self.inner.exec_protocol
    }

    pub(crate) fn stream_transport(&self) -> Arc<dyn StreamTransport> {
        Arc::clone(&self.inner.streams)
    }

    pub(crate) fn authorize(&self, headers: &mut HeaderMap) {
        self.inner.wire.authorizer.decorate(headers);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // URLs
    // ─────────────────────────────────────────────────────────────────────────

    fn kind(kind: &str) -> Result<&'static KindInfo> {
        kind_info(kind).ok_or_else(|| Error::UnregisteredKind(kind.to_string()))
    }

    fn kind_url(
        &self,
        info: &KindInfo,
        version: &ApiVersion,
        namespace: Option<&str>,
        name: Option<&str>,
    ) -> Result<Url> {
        let prefix = info.group.prefix().trim_start_matches('/');
        let mut segments = vec![prefix, version.as_str()];
        let namespace = self.resolve_namespace(namespace);
        if info.namespaced {
            segments.extend(["namespaces", namespace]);
        }
        segments.push(info.plural);
        segments.extend(name);
        self.inner.wire.url(&segments)
    }

    fn resolve_namespace<'a>(&'a self, namespace: Option<&'a str>) -> &'a str {
        match namespace {
            Some(ns) if !ns.is_empty() => ns,
            _ => &self.inner.namespace,
        }
    }

    /// `{base}/{prefix}/{version}`
    pub fn group_url(&self, group: ApiGroup) -> Result<Url> {
        let version = self.version(group)?;
        let prefix = group.prefix().trim_start_matches('/');
        self.inner.wire.url(&[prefix, version.as_str()])
    }

    /// URL of a collection that isn't in the kind catalogue, such as
    /// `projectrequests`.
    pub fn collection_url(
        &self,
        group: ApiGroup,
        namespace: Option<&str>,
        plural: &str,
    ) -> Result<Url> {
        let mut url = self.group_url(group)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::InvalidUrl(self.base_url().to_string()))?;
            if let Some(ns) = namespace {
                segments.extend(["namespaces", ns]);
            }
            segments.push(plural);
        }
        Ok(url)
    }

    /// URL of a named resource at the negotiated version.
    pub fn resource_url(&self, kind: &str, namespace: Option<&str>, name: &str) -> Result<Url> {
        let info = Self::kind(kind)?;
        let version = self.version(info.group)?;
        self.kind_url(info, &version, namespace, Some(name))
    }

    /// URL of a subresource such as `pods/{name}/log`.
    pub fn subresource_url(
        &self,
        kind: &str,
        namespace: Option<&str>,
        name: &str,
        subresource: &str,
    ) -> Result<Url> {
        let mut url = self.resource_url(kind, namespace, name)?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidUrl(self.base_url().to_string()))?
            .push(subresource);
        Ok(url)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Authorized request with this client's timeout. Returns the raw body.
    pub async fn send(&self, method: Method, url: Url, body: Option<String>) -> Result<String> {
        self.inner.wire.send(method, url, body, self.timeout).await
    }

    pub async fn get(&self, kind: &str, name: &str, namespace: Option<&str>) -> Result<Resource> {
        let url = self.resource_url(kind, namespace, name)?;
        let body = self.send(Method::GET, url, None).await?;
        self.factory().create(&body)
    }

    pub async fn get_typed<F: Facade>(&self, name: &str, namespace: Option<&str>) -> Result<F> {
        self.get(F::KIND, name, namespace).await?.downcast()
    }

    /// List a kind in `namespace` (the client's namespace when `None`).
    pub async fn list(&self, kind: &str, namespace: Option<&str>) -> Result<Vec<Resource>> {
        let info = Self::kind(kind)?;
        let version = self.version(info.group)?;
        let url = self.kind_url(info, &version, namespace, None)?;
        let body = self.send(Method::GET, url, None).await?;
        self.factory().create_list(&body, kind)
    }

    pub async fn list_typed<F: Facade>(&self, namespace: Option<&str>) -> Result<Vec<F>> {
        self.list(F::KIND, namespace)
            .await?
            .into_iter()
            .map(Resource::downcast)
            .collect()
    }

    /// Create `resource` on the server at its own version.
    pub async fn create(&self, resource: &Resource) -> Result<Resource> {
        let info = Self::kind(resource.kind())?;
        let namespace = resource.namespace();
        let url = self.kind_url(info, resource.api_version(), Some(namespace.as_str()), None)?;
        debug!("Creating {}", resource);
        let body = self
            .send(Method::POST, url, Some(resource.to_json()))
            .await?;
        self.factory().create(&body)
    }

    /// Replace `resource` on the server.
    pub async fn update(&self, resource: &Resource) -> Result<Resource> {
        let info = Self::kind(resource.kind())?;
        let namespace = resource.namespace();
        let name = resource.name();
        let url = self.kind_url(
            info,
            resource.api_version(),
            Some(namespace.as_str()),
            Some(name.as_str()),
        )?;
        debug!("Updating {}", resource);
        let body = self.send(Method::PUT, url, Some(resource.to_json())).await?;
        self.factory().create(&body)
    }

    pub async fn delete(&self, kind: &str, name: &str, namespace: Option<&str>) -> Result<()> {
        let url = self.resource_url(kind, namespace, name)?;
        self.send(Method::DELETE, url, None).await?;
        Ok(())
    }

    /// Fresh resource at the negotiated version, for [`create`](Self::create).
    pub fn stub(&self, kind: &str, name: &str, namespace: Option<&str>) -> Result<Resource> {
        let info = Self::kind(kind)?;
        let version = self.version(info.group)?;
        let namespace = self.resolve_namespace(namespace);
        self.factory().stub(&version, kind, name, Some(namespace))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Discovery
    // ─────────────────────────────────────────────────────────────────────────

    /// Resource names served by `group` at the negotiated version, including
    /// subresources such as `pods/exec`. Cached after the first success.
    pub async fn api_resources(&self, group: ApiGroup) -> Result<Arc<Vec<String>>> {
        if let Some(cached) = self.discovery_cache().get(&group) {
            return Ok(Arc::clone(cached));
        }

        let url = self.group_url(group)?;
        let body = self.send(Method::GET, url, None).await?;
        let list: ApiResourceList = serde_json::from_str(&body)
            .map_err(|e| Error::malformed(format!("resource list for {}: {}", group, e)))?;
        let names = Arc::new(list.resources.into_iter().map(|r| r.name).collect::<Vec<_>>());
        debug!("{} serves {} resources", group, names.len());

        Ok(Arc::clone(
            self.discovery_cache()
                .entry(group)
                .or_insert(names),
        ))
    }

    pub async fn has_api_resource(&self, group: ApiGroup, name: &str) -> Result<bool> {
        Ok(self.api_resources(group).await?.iter().any(|r| r == name))
    }

    fn discovery_cache(&self) -> std::sync::MutexGuard<'_, HashMap<ApiGroup, Arc<Vec<String>>>> {
        self.inner
            .discovery
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Client capabilities
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn supports<C: Capability>(&self) -> bool {
        self.inner.capabilities.supports::<C>(self).await
    }

    pub async fn capability<C: Capability>(&self) -> Option<Arc<C>> {
        self.inner.capabilities.get::<C>(self).await
    }

    pub async fn accept<C, R, F>(&self, visitor: F) -> Option<R>
    where
        C: Capability,
        F: FnOnce(&C) -> R,
    {
        self.inner.capabilities.accept::<C, R, F>(self, visitor).await
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url().as_str())
            .field("versions", &self.inner.versions)
            .field("namespace", &self.inner.namespace)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handle
// ─────────────────────────────────────────────────────────────────────────────

/// Weak reference to a [`Client`].
#[derive(Clone, Default)]
pub struct ClientHandle(Weak<ClientInner>);

impl ClientHandle {
    /// Handle that never resolves
    pub fn detached() -> Self {
        Self(Weak::new())
    }

    pub fn client(&self) -> Result<Client> {
        self.0
            .upgrade()
            .map(Client::from_inner)
            .ok_or(Error::ClientDropped)
    }

    pub fn is_attached(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClientHandle")
            .field(&self.is_attached())
            .finish()
    }
}
