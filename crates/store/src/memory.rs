//! In-memory session store backed by a `String` behind a `Mutex`.

use async_trait::async_trait;
use std::sync::Mutex;
use usagemon_types::{MonitorError, SessionStore, error::Result};

/// An in-memory [`SessionStore`] implementation for testing and ephemeral use.
#[derive(Default)]
pub struct InMemorySessionStore {
    data: Mutex<Option<String>>,
}

impl InMemorySessionStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `session_key`.
    pub fn with_key(session_key: impl Into<String>) -> Self {
        Self {
            data: Mutex::new(Some(session_key.into())),
        }
    }
}

fn poisoned<T>(_: T) -> MonitorError {
    MonitorError::Storage("in-memory session store lock poisoned".into())
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self) -> Result<Option<String>> {
        let data = self.data.lock().map_err(poisoned)?;
        Ok(data.clone().filter(|k| !k.is_empty()))
    }

    async fn save(&self, session_key: &str) -> Result<()> {
        *self.data.lock().map_err(poisoned)? = Some(session_key.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_load() {
        let store = InMemorySessionStore::new();
        store.save("sk-ant-test").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("sk-ant-test"));
    }

    #[tokio::test]
    async fn test_load_missing() {
        let store = InMemorySessionStore::new();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let store = InMemorySessionStore::with_key("sk-ant-test");
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overwrite() {
        let store = InMemorySessionStore::new();
        store.save("first").await.unwrap();
        store.save("second").await.unwrap();
        assert_eq!(store.load().await.unwrap().as_deref(), Some("second"));
    }
}
