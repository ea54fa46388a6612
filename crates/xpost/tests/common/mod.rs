//! Shared fixtures: a mock X API, an isolated home directory, and captured
//! output.

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;
use wiremock::{MockServer, Request, Respond, ResponseTemplate};
use xpost::config::RetryConfig;
use xpost::credentials::ClientCredentials;
use xpost::{ApiClient, ClientConfig, Context, Credentials, Output};
use xpost_oauth::OAuth1Credentials;

/// Cloneable in-memory writer.
#[derive(Clone, Default)]
pub struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    /// Every JSON document written so far, pretty or compact.
    pub fn documents(&self) -> Vec<Value> {
        serde_json::Deserializer::from_str(&self.text())
            .into_iter::<Value>()
            .map(Result::unwrap)
            .collect()
    }
}

pub struct Harness {
    pub server: MockServer,
    pub home: TempDir,
    pub stdout: Captured,
    pub stderr: Captured,
}

impl Harness {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            home: tempfile::tempdir().unwrap(),
            stdout: Captured::default(),
            stderr: Captured::default(),
        }
    }

    pub fn config(&self) -> ClientConfig {
        let uri = self.server.uri();
        ClientConfig {
            api_url: uri.clone(),
            v1_url: uri.clone(),
            authorize_url: format!("{uri}/i/oauth2/authorize"),
            token_url: format!("{uri}/2/oauth2/token"),
            home: self.home.path().to_path_buf(),
            env_file: None,
            openclaw_config: None,
            stream_idle_timeout: Duration::from_secs(2),
            retry: RetryConfig {
                max_attempts: 3,
                initial_delay_ms: 5,
                max_delay_ms: 20,
                jitter: 0.0,
            },
            ..ClientConfig::default()
        }
    }

    pub fn context(&self, credentials: Credentials) -> Context {
        let client = ApiClient::new(self.config(), credentials).unwrap();
        let output = Output::new(Box::new(self.stdout.clone()), Box::new(self.stderr.clone()));
        Context::new(client, output)
    }

    pub fn token_path(&self) -> std::path::PathBuf {
        self.config().token_path()
    }
}

pub fn oauth1() -> Credentials {
    Credentials {
        oauth1: Some(OAuth1Credentials {
            consumer_key: "consumer-key".into(),
            consumer_secret: "consumer-secret".into(),
            access_token: "access-token".into(),
            access_token_secret: "access-secret".into(),
        }),
        ..Credentials::default()
    }
}

pub fn bearer() -> Credentials {
    Credentials {
        bearer: Some("app-token".into()),
        ..Credentials::default()
    }
}

pub fn oauth2_client() -> Credentials {
    Credentials {
        client: Some(ClientCredentials {
            client_id: "client-123".into(),
            client_secret: None,
        }),
        ..Credentials::default()
    }
}

/// Serves `statuses` in order, repeating the last one, and counts calls.
pub struct Sequence {
    pub calls: Arc<AtomicUsize>,
    pub statuses: Vec<u16>,
    pub body: Value,
}

impl Sequence {
    pub fn new(statuses: &[u16], body: Value) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: calls.clone(),
                statuses: statuses.to_vec(),
                body,
            },
            calls,
        )
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let status = self
            .statuses
            .get(n)
            .or_else(|| self.statuses.last())
            .copied()
            .unwrap_or(200);
        if status == 200 {
            ResponseTemplate::new(200).set_body_json(self.body.clone())
        } else {
            ResponseTemplate::new(status).set_body_json(serde_json::json!({
                "title": "Service Unavailable",
                "detail": "try again later"
            }))
        }
    }
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}
