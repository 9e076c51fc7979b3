//! Static dashboard pages.
//!
//! Request paths are mapped through a small alias table, resolved lexically
//! against the asset root, and refused if they would leave it. Nothing is read
//! from disk for a refused path.

use axum::{
    extract::State,
    http::{Uri, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use usagemon_types::MonitorError;

use crate::{AppState, error::ApiError};

/// Request paths served by a named page instead of a file of the same name.
const ALIASES: &[(&str, &str)] = &[
    ("/", "claude_usage_monitor.html"),
    ("/index.html", "claude_usage_monitor.html"),
    ("/settings", "settings.html"),
];

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type for a file, by extension.
#[must_use]
pub fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("html") => "text/html",
        Some("js") => "application/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("svg") => "image/svg+xml",
        Some("txt") => "text/plain",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Map a request path to a file under `root`.
///
/// # Errors
///
/// Returns [`MonitorError::Forbidden`] if the path climbs above `root` or
/// contains a segment that is not a plain file name.
pub fn resolve(root: &Path, request_path: &str) -> Result<PathBuf, MonitorError> {
    let relative = ALIASES
        .iter()
        .find(|(alias, _)| *alias == request_path)
        .map_or(request_path, |(_, file)| *file);

    let mut resolved = root.to_path_buf();
    let mut depth = 0usize;
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if depth == 0 {
                    return Err(MonitorError::Forbidden(request_path.to_string()));
                }
                resolved.pop();
                depth -= 1;
            }
            name if is_plain_name(name) => {
                resolved.push(name);
                depth += 1;
            }
            _ => return Err(MonitorError::Forbidden(request_path.to_string())),
        }
    }
    Ok(resolved)
}

/// A single normal path component, with no separators or drive prefixes.
fn is_plain_name(segment: &str) -> bool {
    if segment.contains(['\\', '\0']) {
        return false;
    }
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Read `path` and answer with its bytes.
///
/// # Errors
///
/// Returns [`MonitorError::FileNotFound`] if the file cannot be read for any
/// reason.
pub async fn serve(path: &Path) -> Result<Response, ApiError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(([(CONTENT_TYPE, content_type(path))], bytes).into_response()),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "static file read failed");
            Err(MonitorError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into())
        }
    }
}

/// Router fallback: every path that is not an API route.
///
/// # Errors
///
/// See [`resolve`] and [`serve`].
pub async fn static_file(State(state): State<Arc<AppState>>, uri: Uri) -> Result<Response, ApiError> {
    let path = resolve(&state.assets_dir, uri.path())?;
    serve(&path).await
}
