//! `/api/session`: set, inspect and clear the session cookie.

use axum::{Json, extract::State};
use bytes::Bytes;
use serde_json::{Value, json};
use std::sync::Arc;
use usagemon_types::{CredentialStatus, MonitorError};

use crate::{AppState, error::ApiError};

/// Handles `GET /api/session`: configured flag and a truncated preview.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<CredentialStatus> {
    Json(state.session.status())
}

/// Handles `POST /api/session` with a `{"sessionKey": "..."}` body.
///
/// # Errors
///
/// [`MonitorError::InvalidJson`] for an unparsable body;
/// [`MonitorError::InvalidSessionKey`] for a missing, empty or unusable key,
/// or when it cannot be persisted.
pub async fn set(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<Value>, ApiError> {
    let parsed: Value =
        serde_json::from_slice(&body).map_err(|e| MonitorError::InvalidJson(e.to_string()))?;
    let session_key = parsed
        .get("sessionKey")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|k| is_cookie_safe(k))
        .ok_or(MonitorError::InvalidSessionKey)?;

    if !state.session.save(session_key).await {
        return Err(MonitorError::InvalidSessionKey.into());
    }
    Ok(Json(json!({ "success": true })))
}

/// Handles `DELETE /api/session`; succeeds whether or not a key was set.
pub async fn clear(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.session.clear().await;
    Json(json!({ "success": true }))
}

/// Non-empty and free of characters that would break the `Cookie` header.
fn is_cookie_safe(key: &str) -> bool {
    !key.is_empty()
        && !key
            .chars()
            .any(|c| c.is_control() || c.is_whitespace() || matches!(c, ';' | ',' | '"'))
}
