//! osc-core - Version-tolerant client for OpenShift-style control planes
//!
//! Resources are read and written through symbolic property names that the
//! [`registry`] maps onto version-specific JSON paths, so the same code works
//! against servers speaking different API versions.
//!
//! - **value**: JSON tree with absent/null/defined reads
//! - **registry**: per-version property maps and version negotiation
//! - **resource**: resource objects, kind facades and the factory
//! - **client**: negotiated REST client and discovery
//! - **capability**: optional per-resource features, probed lazily
//! - **exec**: remote command execution over channel-multiplexed streams
//! - **transport**: HTTP and WebSocket collaborators

pub mod capability;
pub mod client;
pub mod error;
pub mod exec;
pub mod registry;
pub mod resource;
pub mod transport;
pub mod value;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use capability::{Capability, CapabilityProvider, CapabilityRegistry};
pub use client::{Client, ClientBuilder, ClientHandle};
pub use error::{Error, Result, TransportError};
pub use exec::{ExecHandle, ExecListener, ExecOptions, ExecState, ExecStatus, PodExec};
pub use registry::{ApiVersion, PropertyPathMap, PropertyRegistry};
pub use resource::{ApiGroup, Facade, Resource, ResourceFactory, ResourceId, ResourceObject};
pub use transport::ChannelProtocol;
pub use value::{PropertyPath, Slot, ValueTree};
