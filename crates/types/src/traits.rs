//! Async traits shared across all usagemon crates.
//!
//! Every cross-crate abstraction is defined here so that higher layers depend
//! only on `usagemon-types`, not on each other.

use crate::{OrganizationId, UpstreamError, UsagePayload, error::Result};
use async_trait::async_trait;
use secrecy::SecretString;

/// Persistent record holding the single session credential.
///
/// An empty string stands for "no credential".
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the persisted session key, `None` if nothing is stored.
    async fn load(&self) -> Result<Option<String>>;
    /// Replace the persisted session key.
    async fn save(&self, session_key: &str) -> Result<()>;
    /// Remove the persisted session key.
    async fn clear(&self) -> Result<()> {
        self.save("").await
    }
}

/// The two chained upstream calls behind `GET /api/usage`.
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Resolve the organization the session belongs to.
    async fn list_organizations(
        &self,
        session_key: &SecretString,
    ) -> std::result::Result<OrganizationId, UpstreamError>;

    /// Fetch the usage document for `org`.
    async fn fetch_usage(
        &self,
        session_key: &SecretString,
        org: &OrganizationId,
    ) -> std::result::Result<UsagePayload, UpstreamError>;
}
