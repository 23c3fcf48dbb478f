//! Error types for osc-core.

use serde_json::Value;
use thiserror::Error;

/// Result type alias using osc-core Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for osc operations
#[derive(Error, Debug)]
pub enum Error {
    // Registry / factory errors
    #[error("Unsupported API version: {version} ({detail})")]
    UnsupportedVersion { version: String, detail: String },

    #[error("Kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: String, found: String },

    #[error("Unregistered resource kind: {0}")]
    UnregisteredKind(String),

    #[error("Property '{property}' is not mapped for {kind} {version}")]
    UnmappedProperty {
        property: String,
        kind: String,
        version: String,
    },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    // Value tree errors
    #[error("Type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    // Client errors
    #[error("Client is no longer available")]
    ClientDropped,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// No property map is registered for `kind` at `version`.
    pub fn unsupported_version(version: impl Into<String>, kind: &str) -> Self {
        Self::UnsupportedVersion {
            version: version.into(),
            detail: format!("no property map registered for kind {}", kind),
        }
    }

    /// Create a kind mismatch error
    pub fn kind_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::KindMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a malformed payload error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload(message.into())
    }

    /// Check if this error is an unsupported version error
    pub fn is_unsupported_version(&self) -> bool {
        matches!(self, Self::UnsupportedVersion { .. })
    }

    /// Check if this error is a type mismatch
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }

    /// Check if this error is a transport timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }

    /// Check if this error is a transport not-found
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_not_found())
    }
}

/// Categorized failures raised by the HTTP and streaming transports.
///
/// Every variant carries the URL of the failing call and, when the server
/// answered with a structured `Status` document, that payload.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    #[error("Not found: {url}{}", describe(.status))]
    NotFound { url: String, status: Option<Value> },

    #[error("Unauthorized: {url}{}", describe(.status))]
    Unauthorized { url: String, status: Option<Value> },

    #[error("Bad request: {url}{}", describe(.status))]
    BadRequest { url: String, status: Option<Value> },

    #[error("Server error {code}: {url}{}", describe(.status))]
    ServerError {
        url: String,
        code: u16,
        status: Option<Value>,
    },

    #[error("Request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Request to {url} failed: {message}")]
    Other {
        url: String,
        message: String,
        status: Option<Value>,
    },
}

impl TransportError {
    /// Classify a non-success HTTP status code.
    pub fn from_status(code: u16, url: impl Into<String>, body: &str) -> Self {
        let url = url.into();
        let status = serde_json::from_str::<Value>(body).ok();
        match code {
            404 => Self::NotFound { url, status },
            401 | 403 => Self::Unauthorized { url, status },
            400 | 422 => Self::BadRequest { url, status },
            500..=599 => Self::ServerError { url, code, status },
            _ => Self::Other {
                url,
                message: format!("unexpected status {}", code),
                status,
            },
        }
    }

    /// Create a generic transport error
    pub fn other(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Other {
            url: url.into(),
            message: message.into(),
            status: None,
        }
    }

    /// URL of the failing call
    pub fn url(&self) -> &str {
        match self {
            Self::NotFound { url, .. }
            | Self::Unauthorized { url, .. }
            | Self::BadRequest { url, .. }
            | Self::ServerError { url, .. }
            | Self::Timeout { url, .. }
            | Self::Other { url, .. } => url,
        }
    }

    /// Structured status payload returned by the server, if any
    pub fn status(&self) -> Option<&Value> {
        match self {
            Self::NotFound { status, .. }
            | Self::Unauthorized { status, .. }
            | Self::BadRequest { status, .. }
            | Self::ServerError { status, .. }
            | Self::Other { status, .. } => status.as_ref(),
            Self::Timeout { .. } => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

fn describe(status: &Option<Value>) -> String {
    status
        .as_ref()
        .and_then(|s| s.get("message"))
        .and_then(Value::as_str)
        .map(|m| format!(" ({})", m))
        .unwrap_or_default()
}
