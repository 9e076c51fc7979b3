//! Shared HTTP plumbing for upstream calls.
//!
//! Every call is a cookie-authenticated GET whose send and body read together
//! must finish within one timeout; transport failures are folded into
//! [`UpstreamError`].

use bytes::Bytes;
use reqwest::{
    Client, StatusCode, Url,
    header::{ACCEPT, COOKIE, HeaderValue, USER_AGENT},
};
use secrecy::{ExposeSecret as _, SecretString};
use std::time::Duration;
use usagemon_types::UpstreamError;

/// A fully buffered upstream response.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl RawResponse {
    /// Body decoded lossily as UTF-8, for error reporting.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP helper holding the client, the browser signature and the timeout.
#[derive(Clone)]
pub struct UpstreamHttp {
    http: Client,
    user_agent: HeaderValue,
    timeout: Duration,
}

impl UpstreamHttp {
    /// Creates a helper; an unusable `user_agent` falls back to none being sent.
    pub fn new(http: Client, user_agent: &str, timeout: Duration) -> Self {
        let user_agent = HeaderValue::from_str(user_agent).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid user agent, sending an empty one");
            HeaderValue::from_static("")
        });
        Self {
            http,
            user_agent,
            timeout,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends `GET url` with the session cookie and reads the whole body.
    ///
    /// When the timeout elapses the in-flight future is dropped, which closes
    /// the connection.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Timeout`] if the exchange does not finish in
    /// time and [`UpstreamError::Network`] on any transport failure. Non-2xx
    /// statuses are not errors at this layer.
    pub async fn get(&self, url: Url, session_key: &SecretString) -> Result<RawResponse, UpstreamError> {
        let mut cookie = HeaderValue::from_str(&format!("sessionKey={}", session_key.expose_secret()))
            .map_err(|_| UpstreamError::Network("session cookie is not a valid header value".into()))?;
        cookie.set_sensitive(true);

        let request = self
            .http
            .get(url)
            .header(COOKIE, cookie)
            .header(USER_AGENT, self.user_agent.clone())
            .header(ACCEPT, "application/json");

        let exchange = async {
            let resp = request.send().await?;
            let status = resp.status();
            let body = resp.bytes().await?;
            Ok::<_, reqwest::Error>(RawResponse { status, body })
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(e)) if e.is_timeout() => Err(UpstreamError::Timeout),
            Ok(Err(e)) => Err(UpstreamError::Network(e.to_string())),
            Err(_) => Err(UpstreamError::Timeout),
        }
    }
}
