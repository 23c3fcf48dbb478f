//! Capability negotiation.
//!
//! A capability is optional behaviour that depends on the resource kind, the
//! server, or the negotiated version. Each capability is a plain type
//! implementing [`Capability`]; a [`CapabilityProvider`] decides whether an
//! owner supports it and builds the implementation.
//!
//! Providers live in a [`CapabilityRegistry`] keyed by the capability's
//! `TypeId`. Every owner (a resource or the client) carries a
//! [`Capabilities`] cache: the support probe and the build each run at most
//! once per owner per capability type, even under concurrent first access.
//!
//! # Usage
//!
//! ```rust,no_run
//! use osc_core::capability::PodLogs;
//! use osc_core::Client;
//!
//! # async fn demo(client: Client) -> osc_core::Result<()> {
//! let pod = client.get("Pod", "web-1", Some("demo")).await?;
//! if let Some(logs) = pod.capability::<PodLogs>().await {
//!     println!("{}", logs.fetch(None).await?);
//! }
//! # Ok(())
//! # }
//! ```

mod build_cancel;
mod pod_logs;
mod project_request;
mod scale;

pub use build_cancel::{BuildCancel, BuildCancelProvider};
pub use pod_logs::{PodLogs, PodLogsProvider};
pub use project_request::{ProjectRequest, ProjectRequestProvider};
pub use scale::{Scalable, ScalableProvider};

use crate::client::Client;
use crate::exec::PodExecProvider;
use crate::resource::ResourceObject;
use async_trait::async_trait;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;
use tracing::debug;

/// Marker for capability implementations.
pub trait Capability: Any + Send + Sync {
    /// Human-readable name used in logs
    const NAME: &'static str;
}

/// Decides support for, and builds, one capability for owners of type `O`.
#[async_trait]
pub trait CapabilityProvider<O: Sync>: Send + Sync + 'static {
    type Capability: Capability;

    /// Whether `owner` supports the capability. May query the server.
    async fn supports(&self, owner: &O) -> bool;

    /// Build the implementation. Only called after `supports` returned true.
    fn build(&self, owner: &O) -> Self::Capability;
}

type Instance = Arc<dyn Any + Send + Sync>;

#[async_trait]
trait ErasedProvider<O>: Send + Sync {
    fn name(&self) -> &'static str;
    async fn supports(&self, owner: &O) -> bool;
    fn build(&self, owner: &O) -> Instance;
}

#[async_trait]
impl<O, P> ErasedProvider<O> for P
where
    O: Sync,
    P: CapabilityProvider<O>,
{
    fn name(&self) -> &'static str {
        <P::Capability as Capability>::NAME
    }

    async fn supports(&self, owner: &O) -> bool {
        CapabilityProvider::supports(self, owner).await
    }

    fn build(&self, owner: &O) -> Instance {
        Arc::new(CapabilityProvider::build(self, owner))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Providers keyed by capability type.
pub struct CapabilityRegistry<O> {
    providers: HashMap<TypeId, Arc<dyn ErasedProvider<O>>>,
}

impl<O: Sync + 'static> CapabilityRegistry<O> {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider, replacing any earlier one for the same capability.
    pub fn register<P>(&mut self, provider: P) -> &mut Self
    where
        P: CapabilityProvider<O>,
    {
        let id = TypeId::of::<P::Capability>();
        if self.providers.insert(id, Arc::new(provider)).is_some() {
            debug!(
                "Replaced provider for capability {}",
                <P::Capability as Capability>::NAME
            );
        }
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<P>(mut self, provider: P) -> Self
    where
        P: CapabilityProvider<O>,
    {
        self.register(provider);
        self
    }

    pub fn contains<C: Capability>(&self) -> bool {
        self.providers.contains_key(&TypeId::of::<C>())
    }

    /// Names of the registered capabilities
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.providers.values().map(|p| p.name()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl<O: Sync + 'static> Default for CapabilityRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> fmt::Debug for CapabilityRegistry<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.providers.values().map(|p| p.name()).collect();
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &names)
            .finish()
    }
}

/// Capabilities every resource gets.
pub fn default_resource_capabilities() -> CapabilityRegistry<ResourceObject> {
    CapabilityRegistry::new()
        .with(PodExecProvider)
        .with(PodLogsProvider)
        .with(ScalableProvider)
        .with(BuildCancelProvider)
}

/// Capabilities the client itself offers.
pub fn default_client_capabilities() -> CapabilityRegistry<Client> {
    CapabilityRegistry::new().with(ProjectRequestProvider)
}

// ─────────────────────────────────────────────────────────────────────────────
// Per-owner cache
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Slot {
    supported: OnceCell<bool>,
    instance: OnceLock<Instance>,
}

/// Per-owner memo of support answers and built capabilities.
pub struct Capabilities<O> {
    registry: Arc<CapabilityRegistry<O>>,
    slots: OnceLock<HashMap<TypeId, Slot>>,
}

impl<O: Sync + 'static> Capabilities<O> {
    pub fn new(registry: Arc<CapabilityRegistry<O>>) -> Self {
        Self {
            registry,
            slots: OnceLock::new(),
        }
    }

    fn slots(&self) -> &HashMap<TypeId, Slot> {
        self.slots.get_or_init(|| {
            self.registry
                .providers
                .keys()
                .map(|id| (*id, Slot::default()))
                .collect()
        })
    }

    fn entry<C: Capability>(&self) -> Option<(&Arc<dyn ErasedProvider<O>>, &Slot)> {
        let id = TypeId::of::<C>();
        let provider = self.registry.providers.get(&id)?;
        let slot = self.slots().get(&id)?;
        Some((provider, slot))
    }

    /// Whether `owner` supports `C`. Probes once, then answers from cache.
    pub async fn supports<C: Capability>(&self, owner: &O) -> bool {
        let Some((provider, slot)) = self.entry::<C>() else {
            return false;
        };
        *slot
            .supported
            .get_or_init(|| async {
                let supported = provider.supports(owner).await;
                debug!("Capability {} supported: {}", C::NAME, supported);
                supported
            })
            .await
    }

    /// The implementation of `C` for `owner`, built on first use.
    pub async fn get<C: Capability>(&self, owner: &O) -> Option<Arc<C>> {
        if !self.supports::<C>(owner).await {
            return None;
        }
        let (provider, slot) = self.entry::<C>()?;
        let instance = slot.instance.get_or_init(|| provider.build(owner));
        Arc::clone(instance).downcast::<C>().ok()
    }

    /// Invoke `visitor` with `C` when supported; `None` otherwise.
    pub async fn accept<C, R, F>(&self, owner: &O, visitor: F) -> Option<R>
    where
        C: Capability,
        F: FnOnce(&C) -> R,
    {
        let capability = self.get::<C>(owner).await?;
        Some(visitor(&capability))
    }

    pub async fn accept_or<C, R, F>(&self, owner: &O, default: R, visitor: F) -> R
    where
        C: Capability,
        F: FnOnce(&C) -> R,
    {
        self.accept::<C, R, F>(owner, visitor)
            .await
            .unwrap_or(default)
    }
}

impl<O> fmt::Debug for Capabilities<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("initialized", &self.slots.get().is_some())
            .finish()
    }
}
