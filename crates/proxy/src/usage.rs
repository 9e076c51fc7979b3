//! `GET /api/usage`: the two-stage authenticated proxy.
//!
//! Organization lookup, then the organization-scoped usage fetch, strictly in
//! that order. The usage document is forwarded byte for byte.

use axum::{
    extract::State,
    http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use usagemon_types::{MonitorError, Stage};

use crate::{AppState, error::ApiError};

/// Handles `GET /api/usage`.
///
/// # Errors
///
/// Returns [`MonitorError::NotConfigured`] without contacting the upstream
/// when no session cookie is set, otherwise the first upstream failure tagged
/// with the stage it came from.
pub async fn usage(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    // Snapshot: a concurrent session change does not affect this request.
    let credential = state.session.current();
    let session_key = credential.secret().ok_or(MonitorError::NotConfigured)?;

    let org = state
        .upstream
        .list_organizations(session_key)
        .await
        .map_err(|e| e.at(Stage::Organizations))?;

    let payload = state
        .upstream
        .fetch_usage(session_key, &org)
        .await
        .map_err(|e| e.at(Stage::Usage))?;

    tracing::info!(org = %org, bytes = payload.as_bytes().len(), "usage proxied");
    Ok((
        [
            (CONTENT_TYPE, "application/json"),
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        payload.into_bytes(),
    )
        .into_response())
}
