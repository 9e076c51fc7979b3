//! Unified error type for the usagemon workspace.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The upstream call an [`UpstreamError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// `GET /api/organizations`
    Organizations,
    /// `GET /api/organizations/{id}/usage`
    Usage,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Organizations => "organizations",
            Self::Usage => "usage",
        })
    }
}

/// Failure of a single call to the upstream service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The upstream rejected the session cookie (401 or 403).
    #[error("session rejected by upstream (status {status})")]
    SessionInvalid { status: u16 },

    /// The upstream answered with an unexpected status.
    #[error("upstream returned status {status}")]
    Status { status: u16, body: String },

    /// The organizations list was not an array, or was empty.
    #[error("no organizations in upstream response")]
    NoOrganizations { body: serde_json::Value },

    /// A 200 response whose body could not be parsed.
    #[error("malformed upstream response: {0}")]
    Malformed(String),

    /// Transport-level failure reaching the upstream.
    #[error("network error: {0}")]
    Network(String),

    /// The call did not complete within its timeout.
    #[error("upstream request timed out")]
    Timeout,
}

impl UpstreamError {
    /// Attaches the stage that produced this error.
    #[must_use]
    pub fn at(self, stage: Stage) -> MonitorError {
        MonitorError::Upstream {
            stage,
            source: self,
        }
    }
}

/// Enumerates every failure the server can surface to a local caller.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// No session credential is configured.
    #[error("no session cookie configured")]
    NotConfigured,

    /// An upstream call failed.
    #[error("{stage} request failed: {source}")]
    Upstream {
        stage: Stage,
        #[source]
        source: UpstreamError,
    },

    /// A static asset could not be read.
    #[error("file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// A request path resolved outside the asset root.
    #[error("path escapes asset root: {0}")]
    Forbidden(String),

    /// An inbound request body was not valid JSON.
    #[error("invalid JSON body: {0}")]
    InvalidJson(String),

    /// An inbound session key was missing, empty, or could not be stored.
    #[error("invalid session key")]
    InvalidSessionKey,

    /// JSON serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persisted credential record access failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration loading or validation error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl MonitorError {
    /// Coarse category used in log records.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            Self::NotConfigured | Self::Config(_) => "configuration",
            Self::Upstream { source, .. } => match source {
                UpstreamError::SessionInvalid { .. } => "upstream_auth",
                UpstreamError::Status { .. } => "upstream_status",
                UpstreamError::NoOrganizations { .. } | UpstreamError::Malformed(_) => {
                    "upstream_data"
                }
                UpstreamError::Network(_) => "upstream_network",
                UpstreamError::Timeout => "upstream_timeout",
            },
            Self::FileNotFound { .. } | Self::Forbidden(_) | Self::Storage(_) => "local_io",
            Self::InvalidJson(_) | Self::InvalidSessionKey => "input_validation",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, MonitorError>;
