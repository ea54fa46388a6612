//! Static credential loading.
//!
//! Keys are looked up through an ordered chain of sources; for each key the
//! first source with a non-empty value wins. The default chain is the
//! process environment, then `<home>/.env`, then the `env.vars` object of an
//! OpenClaw config file.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};
use xpost_oauth::OAuth1Credentials;

use crate::config::ClientConfig;
use crate::error::{XpostError, XpostResult};

pub const CONSUMER_KEY: &str = "X_CONSUMER_KEY";
pub const CONSUMER_SECRET: &str = "X_CONSUMER_SECRET";
pub const ACCESS_TOKEN: &str = "X_ACCESS_TOKEN";
pub const ACCESS_TOKEN_SECRET: &str = "X_ACCESS_TOKEN_SECRET";
pub const BEARER_TOKEN: &str = "X_BEARER_TOKEN";
pub const CLIENT_ID: &str = "X_CLIENT_ID";
pub const CLIENT_SECRET: &str = "X_CLIENT_SECRET";

/// A place credential values can come from.
pub trait CredentialSource: Send + Sync {
    /// Label used in logs.
    fn name(&self) -> &str;

    /// Raw value for `key`, if this source has one.
    fn get(&self, key: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Default)]
pub struct ProcessEnv;

impl CredentialSource for ProcessEnv {
    fn name(&self) -> &str {
        "environment"
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A fixed set of key/value pairs loaded from a file (or built in tests).
#[derive(Debug, Default)]
pub struct MapSource {
    name: String,
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new(name: impl Into<String>, values: HashMap<String, String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Load a dotenv-style file. A missing file yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`XpostError::Config`] if the file exists but does not parse.
    pub fn from_dotenv(path: &Path) -> XpostResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let iter = dotenvy::from_path_iter(path)
            .map_err(|e| XpostError::Config(format!("{}: {e}", path.display())))?;
        let values = iter
            .collect::<Result<HashMap<_, _>, _>>()
            .map_err(|e| XpostError::Config(format!("{}: {e}", path.display())))?;

        Ok(Some(Self::new(path.display().to_string(), values)))
    }

    /// Load the `env.vars` object of an OpenClaw JSON config. A missing file
    /// yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`XpostError::Config`] if the file exists but is not JSON.
    pub fn from_openclaw(path: &Path) -> XpostResult<Option<Self>> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let root: Value = serde_json::from_str(&raw)
            .map_err(|e| XpostError::Config(format!("{}: {e}", path.display())))?;

        let values = root
            .pointer("/env/vars")
            .and_then(Value::as_object)
            .map(|vars| {
                vars.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Some(Self::new(path.display().to_string(), values)))
    }
}

impl CredentialSource for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Ordered list of credential sources.
pub struct CredentialChain {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialChain {
    #[must_use]
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources }
    }

    /// Environment, then `<home>/.env`, then the OpenClaw config.
    ///
    /// Key files that fail to parse are skipped with a warning.
    #[must_use]
    pub fn standard(config: &ClientConfig) -> Self {
        let mut sources: Vec<Box<dyn CredentialSource>> = vec![Box::new(ProcessEnv)];

        match MapSource::from_dotenv(&config.env_file_path()) {
            Ok(Some(source)) => sources.push(Box::new(source)),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring unreadable key file"),
        }

        if let Some(path) = &config.openclaw_config {
            match MapSource::from_openclaw(path) {
                Ok(Some(source)) => sources.push(Box::new(source)),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Ignoring unreadable OpenClaw config"),
            }
        }

        Self::new(sources)
    }

    /// First non-empty value for `key`, trimmed.
    #[must_use]
    pub fn resolve(&self, key: &str) -> Option<String> {
        self.sources.iter().find_map(|source| {
            let value = source.get(key)?.trim().to_string();
            if value.is_empty() {
                return None;
            }
            debug!(key, source = source.name(), "Resolved credential");
            Some(value)
        })
    }
}

/// OAuth 2.0 client registration.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Static credentials resolved at startup. Each variant is present only if
/// all of its required fields are non-empty.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub oauth1: Option<OAuth1Credentials>,
    pub bearer: Option<String>,
    pub client: Option<ClientCredentials>,
}

impl Credentials {
    /// Resolve every variant through `chain`. Absence is never an error here.
    #[must_use]
    pub fn load(chain: &CredentialChain) -> Self {
        let oauth1 = match (
            chain.resolve(CONSUMER_KEY),
            chain.resolve(CONSUMER_SECRET),
            chain.resolve(ACCESS_TOKEN),
            chain.resolve(ACCESS_TOKEN_SECRET),
        ) {
            (Some(consumer_key), Some(consumer_secret), Some(access_token), Some(access_token_secret)) => {
                Some(OAuth1Credentials {
                    consumer_key,
                    consumer_secret,
                    access_token,
                    access_token_secret,
                })
            }
            _ => None,
        };

        let client = chain.resolve(CLIENT_ID).map(|client_id| ClientCredentials {
            client_id,
            client_secret: chain.resolve(CLIENT_SECRET),
        });

        let credentials = Self {
            oauth1,
            bearer: chain.resolve(BEARER_TOKEN),
            client,
        };

        debug!(
            oauth1 = credentials.oauth1.is_some(),
            bearer = credentials.bearer.is_some(),
            oauth2_client = credentials.client.is_some(),
            "Loaded static credentials"
        );

        credentials
    }
}
