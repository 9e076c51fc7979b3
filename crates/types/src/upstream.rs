//! Identifiers and payloads exchanged with the upstream service.

use bytes::Bytes;
use std::fmt;

/// Opaque organization identifier (`uuid` of an upstream organization).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationId(String);

impl OrganizationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Usage document returned by the upstream, kept as the exact bytes received.
///
/// Only constructed after the bytes were checked to be well-formed JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsagePayload(Bytes);

impl UsagePayload {
    /// Wrap bytes that have already been validated as JSON.
    #[must_use]
    pub fn from_validated(bytes: Bytes) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}
