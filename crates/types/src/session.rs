//! Session credential representation and its redacted status view.

use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};

/// Number of leading characters shown in a credential preview.
pub const PREVIEW_CHARS: usize = 20;

/// Marker appended to a credential preview.
pub const PREVIEW_ELLIPSIS: &str = "...";

/// The claude.ai `sessionKey` cookie value.
///
/// An empty value means "no credential". The secret is never printed by
/// `Debug` and never leaves the process except inside the upstream cookie.
#[derive(Debug, Default)]
pub struct SessionCredential {
    key: Option<SecretString>,
}

impl SessionCredential {
    /// Wrap a raw session key; the empty string yields an unconfigured credential.
    pub fn new(session_key: impl Into<String>) -> Self {
        let session_key = session_key.into();
        if session_key.is_empty() {
            return Self::empty();
        }
        Self {
            key: Some(SecretString::from(session_key)),
        }
    }

    /// An unconfigured credential.
    #[must_use]
    pub fn empty() -> Self {
        Self { key: None }
    }

    /// Return `true` if a non-empty session key is present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    /// The secret session key, if configured.
    #[must_use]
    pub fn secret(&self) -> Option<&SecretString> {
        self.key.as_ref()
    }

    /// Project the credential into its redacted, serializable status.
    #[must_use]
    pub fn status(&self) -> CredentialStatus {
        CredentialStatus {
            configured: self.is_configured(),
            preview: self.key.as_ref().map(|k| preview(k.expose_secret())),
        }
    }
}

/// Read-only view of the credential returned by `GET /api/session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialStatus {
    pub configured: bool,
    pub preview: Option<String>,
}

fn preview(session_key: &str) -> String {
    let mut out: String = session_key.chars().take(PREVIEW_CHARS).collect();
    out.push_str(PREVIEW_ELLIPSIS);
    out
}
