//! Remote command execution in a pod.
//!
//! [`PodExec`] opens a multiplexed stream to the pod's `exec` subresource
//! and feeds stdout, stderr and the exec status channel to an
//! [`ExecListener`]. Everything after [`PodExec::start`] is asynchronous:
//! failures are delivered through the listener, never returned.
//!
//! ```text
//! Init ──start──▶ Connecting ──handshake──▶ Open ──▶ Closed
//!                      │                      │
//!                      └──────── error ───────┴────▶ Failed
//! ```
//!
//! Exactly one of [`ExecListener::on_close`] and [`ExecListener::on_failure`]
//! is called per session.

mod session;

pub use session::ExecState;

use crate::capability::{Capability, CapabilityProvider};
use crate::client::ClientHandle;
use crate::error::{Error, Result};
use crate::resource::{ApiGroup, Facade, Pod, ResourceId, ResourceObject};
use crate::transport::StreamRequest;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Url;
use serde::Deserialize;
use session::ExecSession;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Receives the events of one exec session.
///
/// Callbacks run on the transport's task. They must return quickly and may
/// race with [`ExecHandle::stop`] called from elsewhere.
pub trait ExecListener: Send + Sync {
    /// Stream established. Called at most once.
    fn on_open(&self) {}

    fn on_stdout(&self, data: &[u8]);

    fn on_stderr(&self, data: &[u8]);

    /// Message on the exec status channel. The server also reports a
    /// successful exit here.
    fn on_exec_error(&self, status: &ExecStatus);

    /// Session closed by the caller, the server or the peer.
    fn on_close(&self, code: u16, reason: &str);

    /// Session could not be established or broke.
    fn on_failure(&self, error: &Error);
}

/// What to run and which channels to stream back.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Target container; the server picks one when the pod has a single container
    pub container: Option<String>,
    pub stdout: bool,
    pub stderr: bool,
    pub tty: bool,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            container: None,
            stdout: true,
            stderr: true,
            tty: false,
        }
    }
}

impl ExecOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    pub fn stdout(mut self, enabled: bool) -> Self {
        self.stdout = enabled;
        self
    }

    pub fn stderr(mut self, enabled: bool) -> Self {
        self.stderr = enabled;
        self
    }

    pub fn tty(mut self, enabled: bool) -> Self {
        self.tty = enabled;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exec status
// ─────────────────────────────────────────────────────────────────────────────

/// Parsed `Status` document from the exec status channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecStatus {
    pub success: bool,
    pub message: String,
    /// Machine-readable reason, e.g. `NonZeroExitCode`
    pub reason: String,
    pub exit_code: Option<i32>,
}

#[derive(Deserialize)]
struct StatusDocument {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    details: Option<StatusDetails>,
}

#[derive(Deserialize)]
struct StatusDetails {
    #[serde(default)]
    causes: Vec<StatusCause>,
}

#[derive(Deserialize)]
struct StatusCause {
    #[serde(default)]
    reason: String,
    #[serde(default)]
    message: String,
}

impl ExecStatus {
    /// Interpret a status channel payload. Text that isn't a `Status`
    /// document is reported as a failure carrying that text.
    pub fn parse(payload: &[u8]) -> Self {
        let text = String::from_utf8_lossy(payload);
        match serde_json::from_str::<StatusDocument>(&text) {
            Ok(doc) => {
                let success = doc.status == "Success";
                let exit_code = if success {
                    Some(0)
                } else {
                    doc.details
                        .iter()
                        .flat_map(|d| d.causes.iter())
                        .find(|c| c.reason == "ExitCode")
                        .and_then(|c| c.message.trim().parse().ok())
                };
                Self {
                    success,
                    message: doc.message,
                    reason: doc.reason,
                    exit_code,
                }
            }
            Err(_) => Self {
                success: false,
                message: text.trim().to_string(),
                reason: String::new(),
                exit_code: None,
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handle
// ─────────────────────────────────────────────────────────────────────────────

/// Caller's handle on a running exec session.
#[derive(Clone)]
pub struct ExecHandle {
    session: Arc<ExecSession>,
}

impl ExecHandle {
    /// Stop the session. Safe to call at any time and from any thread; only
    /// the first call on a live session delivers `on_close`.
    pub fn stop(&self) {
        self.session.stop();
    }

    pub fn state(&self) -> ExecState {
        self.session.state()
    }

    pub fn is_terminated(&self) -> bool {
        self.state().is_terminal()
    }

    /// Session id used in log events
    pub fn id(&self) -> Uuid {
        self.session.id()
    }
}

impl std::fmt::Debug for ExecHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecHandle")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Capability
// ─────────────────────────────────────────────────────────────────────────────

/// Runs commands inside a pod.
#[derive(Debug, Clone)]
pub struct PodExec {
    pod: ResourceId,
    client: ClientHandle,
}

impl Capability for PodExec {
    const NAME: &'static str = "pod-exec";
}

impl PodExec {
    /// Start `command` and stream its output to `listener`.
    ///
    /// Returns immediately. Connection problems arrive as
    /// [`ExecListener::on_failure`].
    pub fn start(
        &self,
        listener: Arc<dyn ExecListener>,
        options: &ExecOptions,
        command: &[&str],
    ) -> ExecHandle {
        let session = ExecSession::new(self.pod.to_string(), listener);
        let handle = ExecHandle {
            session: Arc::clone(&session),
        };
        session.begin();

        match self.stream_request(options, command) {
            Ok((request, transport)) => {
                let control = transport.open(request, session.clone());
                session.attach(control);
            }
            Err(e) => {
                session.fail(e);
            }
        }
        handle
    }

    fn stream_request(
        &self,
        options: &ExecOptions,
        command: &[&str],
    ) -> Result<(StreamRequest, Arc<dyn crate::transport::StreamTransport>)> {
        if command.is_empty() {
            return Err(Error::Other("exec requires a command".to_string()));
        }
        let client = self.client.client()?;
        let url = exec_url(
            client.subresource_url(Pod::KIND, Some(&self.pod.namespace), &self.pod.name, "exec")?,
            options,
            command,
        )?;

        let mut headers = HeaderMap::new();
        client.authorize(&mut headers);
        let request = StreamRequest {
            url: url.to_string(),
            headers,
            protocol: client.exec_protocol(),
        };
        Ok((request, client.stream_transport()))
    }
}

/// Add the exec query and switch the scheme to WebSocket.
fn exec_url(mut url: Url, options: &ExecOptions, command: &[&str]) -> Result<Url> {
    {
        let mut query = url.query_pairs_mut();
        for arg in command {
            query.append_pair("command", arg);
        }
        if let Some(container) = &options.container {
            query.append_pair("container", container);
        }
        query
            .append_pair("stdin", "false")
            .append_pair("stdout", bool_param(options.stdout))
            .append_pair("stderr", bool_param(options.stderr))
            .append_pair("tty", bool_param(options.tty));
    }

    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        _ => "ws",
    };
    url.set_scheme(scheme)
        .map_err(|_| Error::InvalidUrl(format!("cannot use {} for exec", url)))?;
    Ok(url)
}

fn bool_param(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Supported for pods when the server serves `pods/exec`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PodExecProvider;

#[async_trait]
impl CapabilityProvider<ResourceObject> for PodExecProvider {
    type Capability = PodExec;

    async fn supports(&self, owner: &ResourceObject) -> bool {
        if owner.kind() != Pod::KIND {
            return false;
        }
        let Ok(client) = owner.client() else {
            return false;
        };
        client
            .has_api_resource(ApiGroup::Kubernetes, "pods/exec")
            .await
            .unwrap_or_else(|e| {
                warn!("Could not probe pods/exec for {}: {}", owner.identity(), e);
                false
            })
    }

    fn build(&self, owner: &ResourceObject) -> PodExec {
        PodExec {
            pod: owner.identity(),
            client: owner.client_handle().clone(),
        }
    }
}
