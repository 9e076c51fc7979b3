use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Browser signature sent upstream; claude.ai rejects clients it does not recognise.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

fn default_port() -> u16 {
    3000
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_assets_dir() -> PathBuf {
    PathBuf::from("web")
}
fn default_settings_path() -> PathBuf {
    PathBuf::from("settings.local.json")
}
fn default_base_url() -> String {
    "https://claude.ai".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Outbound connection settings for the claude.ai client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Scheme and host of the upstream API (defaults to `https://claude.ai`).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (defaults to 10).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Optional HTTP/HTTPS/SOCKS proxy for outbound requests.
    #[serde(default)]
    pub proxy_url: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            proxy_url: None,
        }
    }
}

impl UpstreamConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON records instead of human-readable lines.
    #[serde(default)]
    pub json: bool,
    /// Also append logs to this file.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            file: None,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listen port (defaults to 3000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Listen address (defaults to `127.0.0.1`).
    #[serde(default = "default_host")]
    pub host: String,
    /// Directory the dashboard pages are served from.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    /// JSON settings file holding the persisted session cookie.
    #[serde(default = "default_settings_path")]
    pub settings_path: PathBuf,
    /// Bootstrap session cookie; wins over the persisted one when non-empty.
    #[serde(default)]
    pub session_cookie: Option<String>,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            assets_dir: default_assets_dir(),
            settings_path: default_settings_path(),
            session_cookie: None,
            upstream: UpstreamConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Parses configuration from a YAML string, merged with defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the YAML is invalid or extraction fails.
    #[allow(clippy::result_large_err)]
    pub fn from_yaml(yaml: &str) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Yaml::string(yaml))
            .extract()
    }

    /// Loads configuration from a file path, merged with defaults.
    ///
    /// Files ending in `.json` are read as JSON, everything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be read or parsed.
    #[allow(clippy::result_large_err)]
    pub fn from_file(path: &Path) -> Result<Self, figment::Error> {
        Self::figment(Some(path)).extract()
    }

    /// Loads defaults, the optional file, then the environment on top.
    ///
    /// `PORT` overrides `port` and `CLAUDE_SESSION_COOKIE` overrides
    /// `session_cookie`.
    ///
    /// # Errors
    ///
    /// Returns a [`figment::Error`] if the file cannot be read or a value
    /// has the wrong type.
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        Self::figment(path)
            .merge(Env::raw().only(&["PORT"]).map(|_| "port".into()))
            .merge(
                Env::raw()
                    .only(&["CLAUDE_SESSION_COOKIE"])
                    .map(|_| "session_cookie".into()),
            )
            .extract()
    }

    fn figment(path: Option<&Path>) -> Figment {
        let base = Figment::from(Serialized::defaults(Config::default()));
        match path {
            Some(p) if p.extension().is_some_and(|e| e.eq_ignore_ascii_case("json")) => {
                base.merge(Json::file(p))
            }
            Some(p) => base.merge(Yaml::file(p)),
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    const SAMPLE_YAML: &str = r#"
port: 9000
host: "0.0.0.0"
assets_dir: "/srv/usagemon"
upstream:
  base_url: "http://127.0.0.1:8080"
  timeout_secs: 3
log:
  level: debug
  json: true
"#;

    #[test]
    fn test_default_config() {
        let c = Config::default();
        assert_eq!(c.port, 3000);
        assert_eq!(c.host, "127.0.0.1");
        assert_eq!(c.assets_dir, PathBuf::from("web"));
        assert_eq!(c.settings_path, PathBuf::from("settings.local.json"));
        assert!(c.session_cookie.is_none());
        assert_eq!(c.upstream.base_url, "https://claude.ai");
        assert_eq!(c.upstream.timeout(), Duration::from_secs(10));
        assert_eq!(c.upstream.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_from_yaml_overrides() {
        let c = Config::from_yaml(SAMPLE_YAML).unwrap();
        assert_eq!(c.port, 9000);
        assert_eq!(c.host, "0.0.0.0");
        assert_eq!(c.assets_dir, PathBuf::from("/srv/usagemon"));
        assert_eq!(c.upstream.base_url, "http://127.0.0.1:8080");
        assert_eq!(c.upstream.timeout_secs, 3);
        assert_eq!(c.log.level, "debug");
        assert!(c.log.json);
    }

    #[test]
    fn test_from_yaml_defaults_applied() {
        let c = Config::from_yaml("port: 1234").unwrap();
        assert_eq!(c.port, 1234);
        assert_eq!(c.host, "127.0.0.1");
        assert_eq!(c.upstream.timeout_secs, 10);
        assert_eq!(c.log.level, "info");
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usagemon.json");
        std::fs::write(&path, r#"{"port": 4321, "session_cookie": "sk-ant-file"}"#).unwrap();
        let c = Config::from_file(&path).unwrap();
        assert_eq!(c.port, 4321);
        assert_eq!(c.session_cookie.as_deref(), Some("sk-ant-file"));
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usagemon.yaml");
        std::fs::write(&path, "port: 8181\n").unwrap();
        assert_eq!(Config::from_file(&path).unwrap().port, 8181);
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("usagemon.yaml", "port: 9000\nsession_cookie: from-file\n")?;
            jail.set_env("PORT", "3001");
            jail.set_env("CLAUDE_SESSION_COOKIE", "sk-ant-from-env");
            let c = Config::load(Some(Path::new("usagemon.yaml")))?;
            assert_eq!(c.port, 3001);
            assert_eq!(c.session_cookie.as_deref(), Some("sk-ant-from-env"));
            Ok(())
        });
    }

    #[test]
    fn test_unrelated_env_is_ignored() {
        Jail::expect_with(|jail| {
            jail.set_env("HOST", "0.0.0.0");
            let c = Config::load(None)?;
            assert_eq!(c.host, "127.0.0.1");
            Ok(())
        });
    }
}
