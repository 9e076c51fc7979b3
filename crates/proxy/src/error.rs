//! API error type that maps [`MonitorError`] variants to HTTP responses.
//!
//! Every failure leaves the server as `{"error": <message>, "details": ...}`
//! with a status reflecting its category. Static 404s use
//! `{"error": "File not found", "path": ...}` instead.

use axum::{
    Json,
    http::{StatusCode, header::ACCESS_CONTROL_ALLOW_ORIGIN},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use usagemon_types::{MonitorError, Stage, UpstreamError};

/// Guidance returned when the upstream rejects the session cookie.
pub const SESSION_GUIDANCE: &str = "Please update your sessionKey cookie";

/// Guidance returned when no session cookie is configured.
pub const SETUP_GUIDANCE: &str = "Set sessionCookie in settings.local.json, the CLAUDE_SESSION_COOKIE env var, or POST /api/session";

/// Longest upstream body excerpt written to the log.
const LOG_SNIPPET_CHARS: usize = 200;

/// Wrapper around [`MonitorError`] that implements [`IntoResponse`].
#[derive(Debug)]
pub struct ApiError(pub MonitorError);

impl ApiError {
    /// Returns `(status, message, details)` for the wrapped error.
    fn classify(&self) -> (StatusCode, &'static str, Value) {
        match &self.0 {
            MonitorError::NotConfigured => (
                StatusCode::UNAUTHORIZED,
                "No session cookie configured",
                json!(SETUP_GUIDANCE),
            ),
            MonitorError::Upstream { stage, source } => classify_upstream(*stage, source),
            MonitorError::FileNotFound { .. } => {
                (StatusCode::NOT_FOUND, "File not found", Value::Null)
            }
            MonitorError::Forbidden(_) => (StatusCode::FORBIDDEN, "Forbidden", Value::Null),
            MonitorError::InvalidJson(_) => (StatusCode::BAD_REQUEST, "Invalid JSON", Value::Null),
            MonitorError::InvalidSessionKey => {
                (StatusCode::BAD_REQUEST, "Invalid session key", Value::Null)
            }
            e @ (MonitorError::Serialization(_)
            | MonitorError::Storage(_)
            | MonitorError::Config(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                json!(e.to_string()),
            ),
        }
    }
}

fn classify_upstream(stage: Stage, err: &UpstreamError) -> (StatusCode, &'static str, Value) {
    match (stage, err) {
        (_, UpstreamError::SessionInvalid { .. }) => (
            StatusCode::UNAUTHORIZED,
            "Session expired or invalid",
            json!(SESSION_GUIDANCE),
        ),
        (Stage::Organizations, UpstreamError::Status { status, body }) => {
            (passthrough(*status), "Claude API error", json!(body))
        }
        (Stage::Usage, UpstreamError::Status { status, body }) => {
            (passthrough(*status), "Failed to fetch usage data", json!(body))
        }
        (_, UpstreamError::NoOrganizations { body }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "No organizations found",
            body.clone(),
        ),
        (Stage::Organizations, UpstreamError::Malformed(msg)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to parse organization data",
            json!(msg),
        ),
        (Stage::Usage, UpstreamError::Malformed(msg)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Invalid JSON from Claude.ai",
            json!(msg),
        ),
        (Stage::Organizations, UpstreamError::Network(msg)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Network error connecting to Claude.ai",
            json!(msg),
        ),
        (Stage::Usage, UpstreamError::Network(msg)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Network error fetching usage",
            json!(msg),
        ),
        (Stage::Organizations, UpstreamError::Timeout) => (
            StatusCode::GATEWAY_TIMEOUT,
            "Request to Claude.ai timed out",
            Value::Null,
        ),
        (Stage::Usage, UpstreamError::Timeout) => (
            StatusCode::GATEWAY_TIMEOUT,
            "Usage request timed out",
            Value::Null,
        ),
    }
}

/// The upstream's own status, unless it cannot be represented as an error reply.
///
/// Unlike a literal passthrough, a non-200 2xx (e.g. `201`) or an out-of-range
/// code becomes `502`, so an error body never goes out with a success status.
fn passthrough(status: u16) -> StatusCode {
    StatusCode::from_u16(status)
        .ok()
        .filter(|s| s.as_u16() >= 300)
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

fn log_snippet(details: &Value) -> String {
    let text = match details {
        Value::Null => return String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() <= LOG_SNIPPET_CHARS {
        return text;
    }
    let mut cut: String = text.chars().take(LOG_SNIPPET_CHARS).collect();
    cut.push('…');
    cut
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, details) = self.classify();
        let snippet = log_snippet(&details);
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), category = self.0.category(), error = %self.0, details = %snippet, "{message}");
        } else {
            tracing::warn!(status = status.as_u16(), category = self.0.category(), error = %self.0, details = %snippet, "{message}");
        }

        let body = match &self.0 {
            MonitorError::FileNotFound { path } => json!({
                "error": message,
                "path": path.display().to_string(),
            }),
            _ => json!({
                "error": message,
                "details": details,
            }),
        };
        (status, [(ACCESS_CONTROL_ALLOW_ORIGIN, "*")], Json(body)).into_response()
    }
}

impl From<MonitorError> for ApiError {
    fn from(e: MonitorError) -> Self {
        Self(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt as _;
    use std::path::PathBuf;

    async fn extract_error_body(err: impl Into<ApiError>) -> (StatusCode, Value) {
        let resp = err.into().into_response();
        let status = resp.status();
        assert_eq!(
            resp.headers()
                .get(ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn test_not_configured() {
        let (status, body) = extract_error_body(MonitorError::NotConfigured).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "No session cookie configured");
        assert_eq!(body["details"], SETUP_GUIDANCE);
    }

    #[tokio::test]
    async fn test_session_invalid_either_stage() {
        for stage in [Stage::Organizations, Stage::Usage] {
            let (status, body) =
                extract_error_body(UpstreamError::SessionInvalid { status: 403 }.at(stage)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(
                body,
                json!({"error": "Session expired or invalid", "details": SESSION_GUIDANCE})
            );
        }
    }

    #[tokio::test]
    async fn test_upstream_status_passthrough() {
        let err = UpstreamError::Status {
            status: 429,
            body: "rate limited".into(),
        };
        let (status, body) = extract_error_body(err.at(Stage::Organizations)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Claude API error");
        assert_eq!(body["details"], "rate limited");

        let err = UpstreamError::Status {
            status: 404,
            body: "not found".into(),
        };
        let (status, body) = extract_error_body(err.at(Stage::Usage)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Failed to fetch usage data");
    }

    #[tokio::test]
    async fn test_upstream_success_status_is_not_passed_through() {
        let err = UpstreamError::Status {
            status: 204,
            body: String::new(),
        };
        let (status, _) = extract_error_body(err.at(Stage::Usage)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let err = UpstreamError::Status {
            status: 201,
            body: "created".into(),
        };
        let (status, body) = extract_error_body(err.at(Stage::Organizations)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Claude API error");
    }

    #[tokio::test]
    async fn test_no_organizations_carries_upstream_json() {
        let err = UpstreamError::NoOrganizations { body: json!([]) };
        let (status, body) = extract_error_body(err.at(Stage::Organizations)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "No organizations found");
        assert_eq!(body["details"], json!([]));
    }

    #[tokio::test]
    async fn test_malformed_by_stage() {
        let (status, body) =
            extract_error_body(UpstreamError::Malformed("eof".into()).at(Stage::Organizations))
                .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to parse organization data");

        let (status, body) =
            extract_error_body(UpstreamError::Malformed("eof".into()).at(Stage::Usage)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Invalid JSON from Claude.ai");
        assert_eq!(body["details"], "eof");
    }

    #[tokio::test]
    async fn test_network_by_stage() {
        let (status, body) = extract_error_body(
            UpstreamError::Network("connection refused".into()).at(Stage::Organizations),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Network error connecting to Claude.ai");
        assert_eq!(body["details"], "connection refused");

        let (_, body) =
            extract_error_body(UpstreamError::Network("reset".into()).at(Stage::Usage)).await;
        assert_eq!(body["error"], "Network error fetching usage");
    }

    #[tokio::test]
    async fn test_timeout_by_stage() {
        let (status, body) =
            extract_error_body(UpstreamError::Timeout.at(Stage::Organizations)).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            body,
            json!({"error": "Request to Claude.ai timed out", "details": null})
        );

        let (status, body) = extract_error_body(UpstreamError::Timeout.at(Stage::Usage)).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"], "Usage request timed out");
    }

    #[tokio::test]
    async fn test_file_not_found_body() {
        let (status, body) = extract_error_body(MonitorError::FileNotFound {
            path: PathBuf::from("web/nope.html"),
        })
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "File not found", "path": "web/nope.html"}));
    }

    #[tokio::test]
    async fn test_input_validation() {
        let (status, body) = extract_error_body(MonitorError::InvalidJson("eof".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON");

        let (status, body) = extract_error_body(MonitorError::InvalidSessionKey).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid session key");
    }

    #[tokio::test]
    async fn test_forbidden() {
        let (status, body) = extract_error_body(MonitorError::Forbidden("/../x".into())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden");
    }

    #[tokio::test]
    async fn test_internal_error() {
        let (status, body) = extract_error_body(MonitorError::Storage("disk full".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn test_log_snippet_is_bounded() {
        let long = "x".repeat(1000);
        let snippet = log_snippet(&json!(long));
        assert_eq!(snippet.chars().count(), LOG_SNIPPET_CHARS + 1);
        assert_eq!(log_snippet(&Value::Null), "");
        assert_eq!(log_snippet(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
