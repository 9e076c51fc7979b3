//! Owner of the process-wide session credential.
//!
//! Responsibilities:
//! - Load the credential at startup, preferring a bootstrap value over the
//!   persisted record and never failing.
//! - Persist replacements and clears through a [`SessionStore`].
//! - Swap the in-memory value as a whole so readers never see a partial update.
use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::Mutex;
use usagemon_types::{CredentialStatus, SessionCredential, SessionStore};

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    current: ArcSwap<SessionCredential>,
    /// Serialises persist-then-swap so memory and disk agree on the last writer.
    write_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, credential: SessionCredential) -> Self {
        Self {
            store,
            current: ArcSwap::from_pointee(credential),
            write_lock: Mutex::new(()),
        }
    }

    /// Build a manager with the startup credential.
    ///
    /// A non-empty `bootstrap` (environment or config) wins; otherwise the
    /// persisted record is used. Read errors are logged and yield an empty
    /// credential.
    pub async fn load(store: Arc<dyn SessionStore>, bootstrap: Option<&str>) -> Self {
        let credential = load_credential(store.as_ref(), bootstrap).await;
        Self::new(store, credential)
    }

    /// Snapshot of the current credential.
    #[must_use]
    pub fn current(&self) -> Arc<SessionCredential> {
        self.current.load_full()
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.current.load().is_configured()
    }

    /// Redacted view of the current credential; never touches storage.
    #[must_use]
    pub fn status(&self) -> CredentialStatus {
        self.current.load().status()
    }

    /// Persist `candidate` and make it current.
    ///
    /// Returns `false` if it could not be persisted, in which case the
    /// in-memory value is left unchanged. The empty string is accepted and
    /// means "no credential".
    pub async fn save(&self, candidate: &str) -> bool {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.store.save(candidate).await {
            tracing::warn!(error = %e, category = e.category(), "failed to persist session cookie");
            return false;
        }
        self.current
            .store(Arc::new(SessionCredential::new(candidate)));
        tracing::info!(configured = !candidate.is_empty(), "session cookie updated");
        true
    }

    /// Forget the credential.
    ///
    /// The in-memory value is always cleared; the return value reports
    /// whether the persisted record was cleared too.
    pub async fn clear(&self) -> bool {
        let _guard = self.write_lock.lock().await;
        let persisted = match self.store.clear().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, category = e.category(), "failed to clear persisted session cookie");
                false
            }
        };
        self.current.store(Arc::new(SessionCredential::empty()));
        tracing::info!("session cookie cleared");
        persisted
    }
}

async fn load_credential(store: &dyn SessionStore, bootstrap: Option<&str>) -> SessionCredential {
    if let Some(key) = bootstrap.map(str::trim).filter(|k| !k.is_empty()) {
        tracing::info!("using session cookie from environment/config");
        return SessionCredential::new(key);
    }
    match store.load().await {
        Ok(Some(key)) => {
            tracing::info!("loaded persisted session cookie");
            SessionCredential::new(key)
        }
        Ok(None) => SessionCredential::empty(),
        Err(e) => {
            tracing::warn!(error = %e, category = e.category(), "could not read persisted session cookie");
            SessionCredential::empty()
        }
    }
}
