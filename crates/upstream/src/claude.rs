//! claude.ai web API client: organization lookup and usage fetch.
//!
//! Auth: `Cookie: sessionKey=<value>` plus a desktop browser `User-Agent`.
//! Format: the organizations list is parsed; the usage document is only
//! validated and forwarded as received.
use crate::http_util::{RawResponse, UpstreamHttp};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use secrecy::SecretString;
use serde_json::Value;
use usagemon_config::UpstreamConfig;
use usagemon_types::{MonitorError, OrganizationId, UpstreamError, UsagePayload, UsageSource};

/// Client for the two claude.ai endpoints behind the usage dashboard.
pub struct ClaudeWebClient {
    http: UpstreamHttp,
    base_url: Url,
}

impl ClaudeWebClient {
    /// Creates a client for `config.base_url` using the given HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Config`] if the base URL cannot be parsed or
    /// cannot carry a path.
    pub fn new(http: Client, config: &UpstreamConfig) -> Result<Self, MonitorError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| MonitorError::Config(format!("invalid upstream base_url: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(MonitorError::Config(format!(
                "upstream base_url cannot carry a path: {base_url}"
            )));
        }
        Ok(Self {
            http: UpstreamHttp::new(http, &config.user_agent, config.timeout()),
            base_url,
        })
    }

    /// Creates a client with its own connection pool, honouring `proxy_url`.
    ///
    /// # Errors
    ///
    /// See [`ClaudeWebClient::new`].
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, MonitorError> {
        Self::new(build_http_client(config.proxy_url.as_deref()), config)
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Build an HTTP client, optionally configured with a proxy URL.
fn build_http_client(proxy_url: Option<&str>) -> Client {
    if let Some(url) = proxy_url {
        match reqwest::Proxy::all(url) {
            Ok(proxy) => {
                return Client::builder()
                    .proxy(proxy)
                    .build()
                    .unwrap_or_else(|_| Client::new());
            }
            Err(e) => {
                tracing::warn!(url = url, error = %e, "invalid proxy_url, using direct connection");
            }
        }
    }
    Client::new()
}

#[async_trait]
impl UsageSource for ClaudeWebClient {
    async fn list_organizations(
        &self,
        session_key: &SecretString,
    ) -> Result<OrganizationId, UpstreamError> {
        tracing::debug!("fetching organizations");
        let resp = self
            .http
            .get(self.endpoint(&["api", "organizations"]), session_key)
            .await?;
        tracing::debug!(status = resp.status.as_u16(), "organizations response");
        let org = parse_organizations(&resp)?;
        tracing::debug!(org = %org, "using organization");
        Ok(org)
    }

    async fn fetch_usage(
        &self,
        session_key: &SecretString,
        org: &OrganizationId,
    ) -> Result<UsagePayload, UpstreamError> {
        tracing::debug!(org = %org, "fetching usage");
        let resp = self
            .http
            .get(
                self.endpoint(&["api", "organizations", org.as_str(), "usage"]),
                session_key,
            )
            .await?;
        tracing::debug!(status = resp.status.as_u16(), "usage response");
        parse_usage(resp)
    }
}

/// Picks the first organization; one organization per session is assumed.
fn parse_organizations(resp: &RawResponse) -> Result<OrganizationId, UpstreamError> {
    match resp.status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return Err(UpstreamError::SessionInvalid {
                status: resp.status.as_u16(),
            });
        }
        StatusCode::OK => {}
        status => {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: resp.text(),
            });
        }
    }

    let orgs: Value =
        serde_json::from_slice(&resp.body).map_err(|e| UpstreamError::Malformed(e.to_string()))?;
    if orgs.as_array().is_none_or(Vec::is_empty) {
        return Err(UpstreamError::NoOrganizations { body: orgs });
    }
    orgs.get(0)
        .and_then(|org| org.get("uuid"))
        .and_then(Value::as_str)
        .map(OrganizationId::new)
        .ok_or_else(|| UpstreamError::Malformed("first organization has no uuid".into()))
}

fn parse_usage(resp: RawResponse) -> Result<UsagePayload, UpstreamError> {
    if resp.status != StatusCode::OK {
        return Err(UpstreamError::Status {
            status: resp.status.as_u16(),
            body: resp.text(),
        });
    }
    serde_json::from_slice::<serde::de::IgnoredAny>(&resp.body)
        .map_err(|e| UpstreamError::Malformed(e.to_string()))?;
    Ok(UsagePayload::from_validated(resp.body))
}
