//! Streaming transport interface.

use super::{ChannelProtocol, Frame};
use crate::error::TransportError;
use reqwest::header::HeaderMap;
use std::sync::Arc;

/// Parameters for opening a stream.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// `ws://` or `wss://` URL
    pub url: String,
    /// Headers for the upgrade request, already decorated with credentials
    pub headers: HeaderMap,
    pub protocol: ChannelProtocol,
}

/// Receives stream lifecycle events.
///
/// Called from a transport-owned task. Implementations must return quickly.
pub trait StreamSink: Send + Sync {
    /// Handshake completed.
    fn on_open(&self);

    /// A frame arrived. Frames on one channel arrive in order.
    fn on_frame(&self, frame: Frame);

    /// The connection closed normally or was closed by the peer.
    fn on_closed(&self, code: u16, reason: String);

    /// The connection could not be established or broke.
    fn on_failure(&self, error: TransportError);
}

/// Caller-side control over an open stream.
pub trait StreamControl: Send + Sync {
    /// Request the connection to close. Safe to call repeatedly.
    fn close(&self);
}

/// Opens frame-tagged streams.
pub trait StreamTransport: Send + Sync {
    /// Start opening a stream and return immediately.
    ///
    /// Every outcome, including connection failure, is reported to `sink`.
    fn open(&self, request: StreamRequest, sink: Arc<dyn StreamSink>) -> Box<dyn StreamControl>;
}
