//! Produces the `Authorization` header for a request descriptor.

use reqwest::Client;
use tracing::debug;
use xpost_oauth::{OAuth1Signer, OAuth2Client, OAuth2Config, StoredToken};

use crate::config::ClientConfig;
use crate::credentials::{ClientCredentials, Credentials};
use crate::error::{XpostError, XpostResult};
use crate::refresh::TokenRefresher;
use crate::request::{AuthScheme, RequestDescriptor};
use crate::token_store::TokenStore;

/// The OAuth 2.0 token currently in use and the means to renew it.
#[derive(Debug)]
pub struct OAuth2Session {
    pub token: StoredToken,
    pub refresher: TokenRefresher,
}

impl OAuth2Session {
    /// Header value for a valid (possibly just refreshed) access token.
    ///
    /// # Errors
    ///
    /// Propagates refresh failures.
    pub async fn authorization(&mut self) -> XpostResult<String> {
        self.refresher.ensure_valid(&mut self.token).await?;
        Ok(self.token.authorization_header())
    }
}

/// Credential state owned by one invocation.
#[derive(Debug)]
pub struct AuthContext {
    oauth1: Option<OAuth1Signer>,
    bearer: Option<String>,
    client: Option<ClientCredentials>,
    store: TokenStore,
    authorize_url: String,
    token_url: String,
    http: Client,
    session: Option<OAuth2Session>,
}

impl AuthContext {
    #[must_use]
    pub fn new(credentials: Credentials, config: &ClientConfig, http: Client) -> Self {
        Self {
            oauth1: credentials.oauth1.map(OAuth1Signer::new),
            bearer: credentials.bearer,
            client: credentials.client,
            store: TokenStore::new(config.token_path()),
            authorize_url: config.authorize_url.clone(),
            token_url: config.token_url.clone(),
            http,
            session: None,
        }
    }

    /// Configured OAuth 2.0 client registration, if any.
    #[must_use]
    pub const fn client_credentials(&self) -> Option<&ClientCredentials> {
        self.client.as_ref()
    }

    #[must_use]
    pub const fn token_store(&self) -> &TokenStore {
        &self.store
    }

    /// Fail fast if `scheme` cannot be used. Loads the OAuth 2.0 token on
    /// first use, so a malformed token file surfaces here.
    ///
    /// # Errors
    ///
    /// [`XpostError::AuthUnavailable`] naming the missing variant, or
    /// [`XpostError::MalformedTokenFile`].
    pub fn require(&mut self, scheme: AuthScheme) -> XpostResult<()> {
        match scheme {
            AuthScheme::OAuth1 if self.oauth1.is_none() => Err(XpostError::AuthUnavailable {
                variant: scheme.as_str(),
                hint: "set X_CONSUMER_KEY, X_CONSUMER_SECRET, X_ACCESS_TOKEN and X_ACCESS_TOKEN_SECRET".into(),
            }),
            AuthScheme::Bearer if self.bearer.is_none() => Err(XpostError::AuthUnavailable {
                variant: scheme.as_str(),
                hint: "set X_BEARER_TOKEN".into(),
            }),
            AuthScheme::OAuth2 if self.session.is_none() => {
                self.session = Some(self.open_session()?);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn open_session(&self) -> XpostResult<OAuth2Session> {
        let token = self.store.load()?.ok_or_else(|| XpostError::AuthUnavailable {
            variant: AuthScheme::OAuth2.as_str(),
            hint: format!(
                "no token at {}; run `xpost auth` first",
                self.store.path().display()
            ),
        })?;

        let (client_id, client_secret) = match (&self.client, &token.client_id) {
            (Some(client), _) => (client.client_id.clone(), client.client_secret.clone()),
            (None, Some(stored)) => (stored.clone(), None),
            (None, None) => {
                return Err(XpostError::AuthUnavailable {
                    variant: AuthScheme::OAuth2.as_str(),
                    hint: "set X_CLIENT_ID so the token can be refreshed".into(),
                });
            }
        };

        let config = OAuth2Config::public_client(client_id, &self.authorize_url, &self.token_url)
            .with_client_secret(client_secret);
        let refresher = TokenRefresher::new(
            OAuth2Client::new(config, self.http.clone()),
            self.store.clone(),
        );

        Ok(OAuth2Session { token, refresher })
    }

    /// `Authorization` header for `request`, whose unsigned URL is `base_url`.
    ///
    /// # Errors
    ///
    /// Missing credentials, signing failures, refresh failures.
    pub async fn authorization(
        &mut self,
        request: &RequestDescriptor,
        base_url: &str,
    ) -> XpostResult<String> {
        self.require(request.auth)?;

        match request.auth {
            AuthScheme::OAuth1 => {
                let signer = self.oauth1.as_ref().ok_or(XpostError::AuthUnavailable {
                    variant: "oauth1",
                    hint: String::new(),
                })?;
                debug!(method = %request.method, url = base_url, "Signing with OAuth 1.0a");
                Ok(signer.sign(request.method.as_str(), base_url, &request.signing_params())?)
            }
            AuthScheme::Bearer => self
                .bearer
                .as_ref()
                .map(|token| format!("Bearer {token}"))
                .ok_or(XpostError::AuthUnavailable {
                    variant: "bearer",
                    hint: String::new(),
                }),
            AuthScheme::OAuth2 => match self.session.as_mut() {
                Some(session) => session.authorization().await,
                None => Err(XpostError::AuthUnavailable {
                    variant: "oauth2",
                    hint: String::new(),
                }),
            },
        }
    }
}
