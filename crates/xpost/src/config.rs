//! Client configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{XpostError, XpostResult};

/// Directory override for the token file and dotenv file.
pub const HOME_ENV: &str = "XPOST_HOME";

/// Configuration for the X API client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL for API v2 paths (`/2/...`)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Base URL for the legacy v1.1 paths (`/1.1/...`)
    #[serde(default = "default_v1_url")]
    pub v1_url: String,

    /// OAuth 2.0 authorization endpoint
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    /// OAuth 2.0 token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Directory holding `tokens.json` and `.env`
    #[serde(default = "default_home")]
    pub home: PathBuf,

    /// Dotenv-style key file; `<home>/.env` when unset
    #[serde(default)]
    pub env_file: Option<PathBuf>,

    /// OpenClaw-style JSON config consulted for credentials
    #[serde(default = "default_openclaw_config")]
    pub openclaw_config: Option<PathBuf>,

    /// Total request timeout
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,

    /// TCP connect timeout
    #[serde(default = "default_connect_timeout", with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Stream consumption stops after this long without data
    #[serde(default = "default_stream_idle_timeout", with = "duration_secs")]
    pub stream_idle_timeout: Duration,

    /// Hard ceiling on pages fetched by one command
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_api_url() -> String {
    "https://api.x.com".into()
}

fn default_v1_url() -> String {
    "https://api.twitter.com".into()
}

fn default_authorize_url() -> String {
    "https://twitter.com/i/oauth2/authorize".into()
}

fn default_token_url() -> String {
    "https://api.x.com/2/oauth2/token".into()
}

fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".xpost")
}

fn default_openclaw_config() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".openclaw").join("openclaw.json"))
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_stream_idle_timeout() -> Duration {
    Duration::from_secs(90)
}

const fn default_max_pages() -> u32 {
    50
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound on any single delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Jitter factor (0.0-1.0)
    #[serde(default = "default_jitter")]
    pub jitter: f64,
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_delay_ms() -> u64 {
    1000
}

const fn default_max_delay_ms() -> u64 {
    60_000
}

const fn default_jitter() -> f64 {
    0.1
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_jitter(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            v1_url: default_v1_url(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            home: default_home(),
            env_file: None,
            openclaw_config: default_openclaw_config(),
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            stream_idle_timeout: default_stream_idle_timeout(),
            max_pages: default_max_pages(),
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `XPOST_*` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`XpostError::Config`] if a numeric override does not parse.
    pub fn from_env() -> XpostResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup.
    ///
    /// # Errors
    ///
    /// Returns [`XpostError::Config`] if a numeric override does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> XpostResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("XPOST_API_URL") {
            config.api_url = v;
        }
        if let Some(v) = get("XPOST_V1_URL") {
            config.v1_url = v;
        }
        if let Some(v) = get("XPOST_AUTHORIZE_URL") {
            config.authorize_url = v;
        }
        if let Some(v) = get("XPOST_TOKEN_URL") {
            config.token_url = v;
        }
        if let Some(v) = get(HOME_ENV) {
            config.home = PathBuf::from(v);
        }
        if let Some(v) = get("XPOST_ENV_FILE") {
            config.env_file = Some(PathBuf::from(v));
        }
        if let Some(v) = get("XPOST_OPENCLAW_CONFIG") {
            config.openclaw_config = Some(PathBuf::from(v));
        }
        if let Some(v) = get("XPOST_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_number("XPOST_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("XPOST_STREAM_IDLE_SECS") {
            config.stream_idle_timeout =
                Duration::from_secs(parse_number("XPOST_STREAM_IDLE_SECS", &v)?);
        }
        if let Some(v) = get("XPOST_MAX_ATTEMPTS") {
            config.retry.max_attempts = parse_number("XPOST_MAX_ATTEMPTS", &v)?;
        }
        if let Some(v) = get("XPOST_RETRY_DELAY_MS") {
            config.retry.initial_delay_ms = parse_number("XPOST_RETRY_DELAY_MS", &v)?;
        }

        Ok(config)
    }

    /// Location of the persisted OAuth 2.0 token.
    #[must_use]
    pub fn token_path(&self) -> PathBuf {
        self.home.join("tokens.json")
    }

    /// Location of the dotenv-style key file.
    #[must_use]
    pub fn env_file_path(&self) -> PathBuf {
        self.env_file
            .clone()
            .unwrap_or_else(|| self.home.join(".env"))
    }

    /// Trimmed v2 base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Trimmed v1.1 base URL.
    #[must_use]
    pub fn v1_base(&self) -> &str {
        self.v1_url.trim_end_matches('/')
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> XpostResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| XpostError::Config(format!("{key} must be a number, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_url, "https://api.x.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.stream_idle_timeout, Duration::from_secs(90));
        assert!(config.token_path().ends_with(".xpost/tokens.json"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("XPOST_API_URL", "http://127.0.0.1:9999/"),
            ("XPOST_HOME", "/tmp/xpost-test"),
            ("XPOST_MAX_ATTEMPTS", "5"),
            ("XPOST_TOKEN_URL", ""),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|k| env.get(k).map(ToString::to_string)).unwrap();

        assert_eq!(config.api_base(), "http://127.0.0.1:9999");
        assert_eq!(config.token_path(), PathBuf::from("/tmp/xpost-test/tokens.json"));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.token_url, "https://api.x.com/2/oauth2/token");
    }

    #[test]
    fn test_bad_number_is_config_error() {
        let result = ClientConfig::from_lookup(|k| {
            (k == "XPOST_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(XpostError::Config(_))));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ClientConfig = serde_json::from_str(r#"{"timeout": 5, "retry": {"max_attempts": 1}}"#).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_attempts, 1);
        assert_eq!(config.retry.initial_delay_ms, 1000);
    }
}
