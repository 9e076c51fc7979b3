//! Client for the claude.ai web API.
//!
//! Implements [`UsageSource`]: the organization lookup and the
//! organization-scoped usage fetch, both authenticated with the `sessionKey`
//! cookie and bounded by a per-request timeout.
//!
//! [`UsageSource`]: usagemon_types::UsageSource

pub mod claude;
pub mod http_util;

pub use claude::ClaudeWebClient;
pub use http_util::{RawResponse, UpstreamHttp};
