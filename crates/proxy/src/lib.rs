//! HTTP layer: axum router, route handlers and error mapping.
//!
//! Serves the dashboard pages, the session management API, and the
//! `/api/usage` proxy to claude.ai.

pub mod assets;
mod cors;
mod error;
mod health;
mod session;
pub mod usage;

pub use error::{ApiError, SESSION_GUIDANCE, SETUP_GUIDANCE};

use axum::{
    Router, middleware,
    routing::get,
};
use std::{path::PathBuf, sync::Arc};
use tower_http::trace::TraceLayer;
use usagemon_auth::SessionManager;
use usagemon_types::UsageSource;

/// Shared application state passed to all route handlers.
pub struct AppState {
    /// Owner of the session cookie.
    pub session: Arc<SessionManager>,
    /// claude.ai client (or a stand-in in tests).
    pub upstream: Arc<dyn UsageSource>,
    /// Directory the dashboard pages are served from.
    pub assets_dir: PathBuf,
}

impl AppState {
    /// Creates a new shared application state wrapped in an `Arc`.
    pub fn new(
        session: Arc<SessionManager>,
        upstream: Arc<dyn UsageSource>,
        assets_dir: PathBuf,
    ) -> Arc<Self> {
        Arc::new(Self {
            session,
            upstream,
            assets_dir,
        })
    }
}

/// Build the full axum router.
///
/// Routes:
/// - OPTIONS {*path}        CORS preflight
/// - GET    /api/usage      proxied claude.ai usage
/// - GET    /api/health
/// - GET    /api/session    redacted credential status
/// - POST   /api/session    set credential
/// - DELETE /api/session    clear credential
/// - ANY    {*path}         static dashboard files
///
/// A known path with any other method is resolved as a static file too.
pub fn make_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/usage", get(usage::usage))
        .route("/api/health", get(health::health))
        .route(
            "/api/session",
            get(session::status)
                .post(session::set)
                .delete(session::clear),
        )
        .fallback(assets::static_file)
        .method_not_allowed_fallback(assets::static_file)
        .with_state(state)
        .layer(middleware::from_fn(cors::preflight))
        .layer(TraceLayer::new_for_http())
}


#[cfg(test)]
mod tests {
    use super::test_support::{body_json, get, make_app, send};
    use axum::http::{Method, StatusCode, header::ACCESS_CONTROL_ALLOW_ORIGIN};
    use usagemon_types::SessionStore as _;

    #[tokio::test]
    async fn test_unknown_api_path_falls_through_to_static() {
        let (app, _) = make_app(None).await;
        let resp = get(app, "/api/unknown").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["error"], "File not found");
    }

    #[tokio::test]
    async fn test_wrong_method_on_api_route_falls_through_to_static() {
        for (method, path) in [
            (Method::POST, "/api/usage"),
            (Method::POST, "/api/health"),
            (Method::PUT, "/api/session"),
        ] {
            let (app, _) = make_app(None).await;
            let resp = send(app, method.clone(), path, String::new()).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{method} {path}");
            assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            let body = body_json(resp).await;
            assert_eq!(body["error"], "File not found");
            let resolved = body["path"].as_str().unwrap();
            assert!(resolved.ends_with(path.trim_start_matches('/')), "{resolved}");
        }
    }

    #[tokio::test]
    async fn test_put_session_leaves_credential_untouched() {
        let (app, store) = make_app(Some("sk-ant-keep")).await;
        let resp = send(
            app,
            Method::PUT,
            "/api/session",
            r#"{"sessionKey":"sk-ant-other"}"#.to_string(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(store.load().await.unwrap().as_deref(), Some("sk-ant-keep"));
    }
}
