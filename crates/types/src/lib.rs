//! Core types and traits for the usagemon workspace.
//!
//! This crate defines the shared abstractions used across all layers of the
//! usage monitor: the error taxonomy, the session credential and its redacted
//! status view, upstream identifiers, and the async traits implemented by the
//! storage and upstream layers.

pub mod error;
pub mod session;
pub mod traits;
pub mod upstream;

pub use error::{MonitorError, Stage, UpstreamError};
pub use session::{CredentialStatus, SessionCredential};
pub use traits::{SessionStore, UsageSource};
pub use upstream::{OrganizationId, UsagePayload};
