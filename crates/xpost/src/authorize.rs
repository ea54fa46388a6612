//! Interactive OAuth 2.0 authorization code flow with PKCE.
//!
//! The user approves access in a browser; X redirects to a loopback listener
//! with the code, which is exchanged for a token pair and persisted.

use std::process::Command;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info, instrument, warn};
use xpost_oauth::{AuthorizationCallback, OAuth2Client, OAuth2Config, StoredToken};

use crate::config::ClientConfig;
use crate::credentials::ClientCredentials;
use crate::error::{XpostError, XpostResult};
use crate::token_store::TokenStore;

/// Scopes requested when none are given.
pub const DEFAULT_SCOPES: &[&str] = &[
    "tweet.read",
    "users.read",
    "bookmark.read",
    "bookmark.write",
    "offline.access",
];

/// How long to wait for the browser round trip.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

const CALLBACK_PATH: &str = "/callback";

const SUCCESS_HTML: &str = "<html><body><h2>xpost is authorized</h2><p>You can close this tab and return to the terminal.</p></body></html>";
const FAILURE_HTML: &str =
    "<html><body><h2>Authorization failed</h2><p>Check the terminal for details.</p></body></html>";

/// Delivers the redirect back from the authorization server.
#[async_trait]
pub trait CallbackReceiver: Send {
    /// Redirect URI registered with the authorization request.
    fn redirect_uri(&self) -> String;

    /// Block until the redirect arrives for the flow started at
    /// `authorization_url`, or `timeout` elapses.
    async fn wait_for_callback(
        &mut self,
        authorization_url: &str,
        timeout: Duration,
    ) -> XpostResult<AuthorizationCallback>;
}

/// One-shot HTTP listener on 127.0.0.1.
#[derive(Debug)]
pub struct LoopbackReceiver {
    listener: TcpListener,
    port: u16,
}

impl LoopbackReceiver {
    /// Bind to `port`, or an ephemeral port when `None`.
    ///
    /// # Errors
    ///
    /// [`XpostError::Io`] if the port is taken.
    pub async fn bind(port: Option<u16>) -> XpostResult<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port.unwrap_or(0))).await?;
        let port = listener.local_addr()?.port();
        debug!(port, "Callback listener bound");
        Ok(Self { listener, port })
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    async fn accept_callback(&self) -> XpostResult<AuthorizationCallback> {
        loop {
            let (mut socket, peer) = self.listener.accept().await?;

            let mut buffer = vec![0_u8; 8192];
            let size = socket.read(&mut buffer).await?;
            let request = String::from_utf8_lossy(&buffer[..size]);

            let target = request
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or_default();
            let (path, query) = target.split_once('?').unwrap_or((target, ""));

            if path != CALLBACK_PATH {
                debug!(%peer, path, "Ignoring request to callback listener");
                respond(&mut socket, "404 Not Found", "").await;
                continue;
            }

            let callback = AuthorizationCallback::from_query(query)?;
            let (status, body) = if callback.code.is_some() && callback.error.is_none() {
                ("200 OK", SUCCESS_HTML)
            } else {
                ("400 Bad Request", FAILURE_HTML)
            };
            respond(&mut socket, status, body).await;

            return Ok(callback);
        }
    }
}

async fn respond(socket: &mut tokio::net::TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    // The browser may already be gone; the callback itself is what matters.
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

#[async_trait]
impl CallbackReceiver for LoopbackReceiver {
    fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}{CALLBACK_PATH}", self.port)
    }

    async fn wait_for_callback(
        &mut self,
        _authorization_url: &str,
        timeout: Duration,
    ) -> XpostResult<AuthorizationCallback> {
        tokio::time::timeout(timeout, self.accept_callback())
            .await
            .map_err(|_| XpostError::CallbackTimeout(timeout))?
    }
}

/// Runs the authorization flow and stores the resulting token.
#[derive(Debug)]
pub struct PkceAuthorizer {
    client: ClientCredentials,
    authorize_url: String,
    token_url: String,
    http: Client,
    store: TokenStore,
    scopes: Vec<String>,
    open_browser: bool,
    timeout: Duration,
}

impl PkceAuthorizer {
    #[must_use]
    pub fn new(client: ClientCredentials, config: &ClientConfig, http: Client) -> Self {
        Self {
            client,
            authorize_url: config.authorize_url.clone(),
            token_url: config.token_url.clone(),
            http,
            store: TokenStore::new(config.token_path()),
            scopes: DEFAULT_SCOPES.iter().map(|s| (*s).to_string()).collect(),
            open_browser: true,
            timeout: DEFAULT_CALLBACK_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        if !scopes.is_empty() {
            self.scopes = scopes;
        }
        self
    }

    /// Run the flow once. Nothing is retried; a failure leaves any existing
    /// token file untouched.
    ///
    /// # Errors
    ///
    /// [`XpostError::CallbackTimeout`], [`XpostError::StateMismatch`],
    /// [`XpostError::AuthorizationDenied`], or the token endpoint's error.
    #[instrument(skip_all, fields(client_id = %self.client.client_id))]
    pub async fn authorize<R>(&self, receiver: &mut R) -> XpostResult<StoredToken>
    where
        R: CallbackReceiver + ?Sized,
    {
        let redirect_uri = receiver.redirect_uri();
        let config = OAuth2Config::public_client(
            self.client.client_id.clone(),
            &self.authorize_url,
            &self.token_url,
        )
        .with_client_secret(self.client.client_secret.clone())
        .with_redirect_uri(&redirect_uri);
        let oauth = OAuth2Client::new(config, self.http.clone());

        let scopes: Vec<&str> = self.scopes.iter().map(String::as_str).collect();
        let request = oauth.authorization_request(&scopes)?;

        eprintln!("Open this URL to authorize xpost:\n\n  {}\n", request.url);
        if self.open_browser {
            open_in_browser(&request.url);
        }
        info!(%redirect_uri, timeout_secs = self.timeout.as_secs(), "Waiting for authorization callback");

        let callback = receiver.wait_for_callback(&request.url, self.timeout).await?;
        let code = callback.validate(&request.state)?;

        let response = oauth.exchange_code(&code, &request.pkce).await?;
        let token = StoredToken::from_response(
            response,
            Some(self.client.client_id.clone()),
            Utc::now(),
        );
        self.store.save(&token)?;

        info!(
            path = %self.store.path().display(),
            expires_at = token.expires_at,
            "Stored OAuth 2.0 token"
        );
        Ok(token)
    }
}

/// Best effort; the URL is always printed as well.
fn open_in_browser(url: &str) {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        let mut command = Command::new("rundll32.exe");
        command.arg("url.dll,FileProtocolHandler");
        command
    } else {
        Command::new("xdg-open")
    };

    if let Err(e) = command.arg(url).spawn() {
        warn!(error = %e, "Could not open a browser");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string_contains, method, path},
    };

    /// Plays the browser: echoes the state from the authorization URL.
    struct FakeBrowser {
        redirect_uri: String,
        code: Option<String>,
        error: Option<String>,
        tamper_state: bool,
    }

    impl FakeBrowser {
        fn approving(code: &str) -> Self {
            Self {
                redirect_uri: "http://127.0.0.1:8017/callback".into(),
                code: Some(code.into()),
                error: None,
                tamper_state: false,
            }
        }
    }

    #[async_trait]
    impl CallbackReceiver for FakeBrowser {
        fn redirect_uri(&self) -> String {
            self.redirect_uri.clone()
        }

        async fn wait_for_callback(
            &mut self,
            authorization_url: &str,
            _timeout: Duration,
        ) -> XpostResult<AuthorizationCallback> {
            let url = url::Url::parse(authorization_url).unwrap();
            let state = url
                .query_pairs()
                .find(|(k, _)| k == "state")
                .map(|(_, v)| v.into_owned())
                .unwrap();
            Ok(AuthorizationCallback {
                code: self.code.clone(),
                state: Some(if self.tamper_state { format!("{state}x") } else { state }),
                error: self.error.clone(),
                error_description: None,
            })
        }
    }

    fn authorizer(server: &MockServer, home: &std::path::Path) -> PkceAuthorizer {
        let config = ClientConfig {
            home: home.to_path_buf(),
            authorize_url: format!("{}/i/oauth2/authorize", server.uri()),
            token_url: format!("{}/2/oauth2/token", server.uri()),
            ..ClientConfig::default()
        };
        let client = ClientCredentials {
            client_id: "client123".into(),
            client_secret: None,
        };
        PkceAuthorizer::new(client, &config, Client::new()).with_browser(false)
    }

    #[tokio::test]
    async fn test_successful_flow_persists_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/oauth2/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc"))
            .and(body_string_contains("code_verifier="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "bearer",
                "access_token": "at1",
                "refresh_token": "rt1",
                "expires_in": 7200,
                "scope": "tweet.read users.read"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let authorizer = authorizer(&server, dir.path());
        let token = authorizer
            .authorize(&mut FakeBrowser::approving("abc"))
            .await
            .unwrap();

        assert_eq!(token.access_token, "at1");
        assert_eq!(token.client_id.as_deref(), Some("client123"));
        let stored = TokenStore::new(dir.path().join("tokens.json")).load().unwrap().unwrap();
        assert_eq!(stored, token);
    }

    #[tokio::test]
    async fn test_state_mismatch_never_exchanges() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut browser = FakeBrowser::approving("abc");
        browser.tamper_state = true;

        let err = authorizer(&server, dir.path())
            .authorize(&mut browser)
            .await
            .unwrap_err();
        assert!(matches!(err, XpostError::StateMismatch));
        assert!(!dir.path().join("tokens.json").exists());
    }

    #[tokio::test]
    async fn test_denied_authorization() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let mut browser = FakeBrowser::approving("abc");
        browser.code = None;
        browser.error = Some("access_denied".into());

        let err = authorizer(&server, dir.path())
            .authorize(&mut browser)
            .await
            .unwrap_err();
        assert!(matches!(err, XpostError::AuthorizationDenied(ref e) if e == "access_denied"));
    }

    #[tokio::test]
    async fn test_loopback_receiver_parses_callback() {
        let mut receiver = LoopbackReceiver::bind(None).await.unwrap();
        let port = receiver.port();
        assert_eq!(receiver.redirect_uri(), format!("http://127.0.0.1:{port}/callback"));

        let browser = tokio::spawn(async move {
            let http = Client::new();
            let _ = http.get(format!("http://127.0.0.1:{port}/favicon.ico")).send().await;
            http.get(format!("http://127.0.0.1:{port}/callback?code=c1&state=s1"))
                .send()
                .await
                .unwrap()
                .status()
        });

        let callback = receiver
            .wait_for_callback("", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(callback.code.as_deref(), Some("c1"));
        assert_eq!(callback.state.as_deref(), Some("s1"));
        assert_eq!(browser.await.unwrap(), reqwest::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_loopback_receiver_times_out() {
        let mut receiver = LoopbackReceiver::bind(None).await.unwrap();
        let err = receiver
            .wait_for_callback("", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, XpostError::CallbackTimeout(_)));
    }
}
