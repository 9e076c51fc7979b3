//! Session store persisted in a JSON settings file.
//!
//! The credential lives under the `sessionCookie` key; any other keys in the
//! file are kept when the credential is rewritten.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use usagemon_types::{MonitorError, SessionStore, error::Result};

const SESSION_FIELD: &str = "sessionCookie";

/// A [`SessionStore`] backed by a small JSON file such as `settings.local.json`.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the settings object; `None` when the file does not exist.
    async fn read_settings(&self) -> Result<Option<Map<String, Value>>> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(MonitorError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };
        match serde_json::from_slice::<Value>(&raw)? {
            Value::Object(map) => Ok(Some(map)),
            other => Err(MonitorError::Storage(format!(
                "{} must contain a JSON object, found {}",
                self.path.display(),
                json_kind(&other)
            ))),
        }
    }

    /// Writes to a sibling temp file and renames it over the record, so a
    /// reader sees either the old or the new content.
    async fn write_settings(&self, settings: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("create directory for", &self.path, &e))?;
        }
        let bytes = serde_json::to_vec_pretty(settings)?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| io_error("write", &tmp, &e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                tracing::warn!(path = %tmp.display(), error = %cleanup, "failed to remove temp settings file");
            }
            return Err(io_error("replace", &self.path, &e));
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

fn io_error(action: &str, path: &Path, e: &std::io::Error) -> MonitorError {
    MonitorError::Storage(format!("failed to {action} {}: {e}", path.display()))
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<String>> {
        let Some(settings) = self.read_settings().await? else {
            return Ok(None);
        };
        Ok(settings
            .get(SESSION_FIELD)
            .and_then(Value::as_str)
            .filter(|k| !k.is_empty())
            .map(str::to_string))
    }

    async fn save(&self, session_key: &str) -> Result<()> {
        let mut settings = match self.read_settings().await {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding unreadable settings file");
                Map::new()
            }
        };
        settings.insert(SESSION_FIELD.to_string(), Value::String(session_key.to_string()));
        self.write_settings(&settings).await?;
        tracing::debug!(path = %self.path.display(), "session cookie persisted");
        Ok(())
    }
}
