//! OAuth 2.0 authorization code flow with PKCE, plus refresh.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use crate::{GrantType, OAuthError, OAuthResult, PKCE_METHOD, Pkce, TokenResponse};

/// OAuth 2.0 client configuration.
#[derive(Clone)]
pub struct OAuth2Config {
    /// Client ID.
    pub client_id: String,
    /// Client secret; confidential clients authenticate token calls with it.
    pub client_secret: Option<String>,
    /// Authorization endpoint URL.
    pub authorization_url: String,
    /// Token endpoint URL.
    pub token_url: String,
    /// Redirect URI registered for this client.
    pub redirect_uri: Option<String>,
    /// Scopes requested in addition to any passed per call.
    pub default_scopes: Vec<String>,
}

impl OAuth2Config {
    /// Configuration for a public client (no secret).
    #[must_use]
    pub fn public_client(
        client_id: impl Into<String>,
        authorization_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            authorization_url: authorization_url.into(),
            token_url: token_url.into(),
            redirect_uri: None,
            default_scopes: Vec::new(),
        }
    }

    /// Set or clear the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: Option<String>) -> Self {
        self.client_secret = secret.filter(|s| !s.is_empty());
        self
    }

    /// Set the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Set default scopes.
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }
}

impl std::fmt::Debug for OAuth2Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("authorization_url", &self.authorization_url)
            .field("token_url", &self.token_url)
            .field("redirect_uri", &self.redirect_uri)
            .field("default_scopes", &self.default_scopes)
            .finish()
    }
}

/// A prepared authorization request: the URL to visit plus the secrets the
/// caller must hold on to until the callback arrives.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// URL the user opens in a browser.
    pub url: String,
    /// CSRF binding echoed back in the callback.
    pub state: String,
    /// Verifier/challenge pair; the verifier goes to the token endpoint.
    pub pkce: Pkce,
}

/// OAuth 2.0 client.
#[derive(Debug, Clone)]
pub struct OAuth2Client {
    config: OAuth2Config,
    http_client: Client,
}

impl OAuth2Client {
    /// Create a client that issues token calls through `http_client`.
    #[must_use]
    pub const fn new(config: OAuth2Config, http_client: Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    /// Generate a fresh state and PKCE pair and build the authorization URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization URL is invalid.
    pub fn authorization_request(&self, scopes: &[&str]) -> OAuthResult<AuthorizationRequest> {
        let state = generate_state();
        let pkce = Pkce::new();
        let url = self.authorization_url(scopes, &state, &pkce)?;
        Ok(AuthorizationRequest { url, state, pkce })
    }

    /// Build the authorization URL for a given state and PKCE pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured authorization URL is invalid.
    pub fn authorization_url(&self, scopes: &[&str], state: &str, pkce: &Pkce) -> OAuthResult<String> {
        let mut url = Url::parse(&self.config.authorization_url)?;

        {
            let mut params = url.query_pairs_mut();

            params.append_pair("response_type", "code");
            params.append_pair("client_id", &self.config.client_id);

            if let Some(redirect_uri) = &self.config.redirect_uri {
                params.append_pair("redirect_uri", redirect_uri);
            }

            let all_scopes: Vec<&str> = self
                .config
                .default_scopes
                .iter()
                .map(String::as_str)
                .chain(scopes.iter().copied())
                .collect();

            if !all_scopes.is_empty() {
                params.append_pair("scope", &all_scopes.join(" "));
            }

            params.append_pair("state", state);
            params.append_pair("code_challenge", pkce.challenge());
            params.append_pair("code_challenge_method", PKCE_METHOD);
        }

        Ok(url.to_string())
    }

    /// Exchange an authorization code, proving possession of the verifier.
    ///
    /// # Errors
    ///
    /// [`OAuthError::TokenRequestFailed`] on a non-success status,
    /// [`OAuthError::HttpError`] on transport failure.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str, pkce: &Pkce) -> OAuthResult<TokenResponse> {
        let redirect_uri = self.config.redirect_uri.clone().ok_or_else(|| {
            OAuthError::InvalidConfig("redirect_uri is required for code exchange".into())
        })?;

        let form = vec![
            ("grant_type", GrantType::AuthorizationCode.to_string()),
            ("code", code.to_string()),
            ("redirect_uri", redirect_uri),
            ("code_verifier", pkce.verifier().to_string()),
            ("client_id", self.config.client_id.clone()),
        ];

        self.token_request(form).await
    }

    /// Trade a refresh token for a new access token.
    ///
    /// # Errors
    ///
    /// [`OAuthError::NoRefreshToken`] for an empty token,
    /// [`OAuthError::TokenRequestFailed`] on a non-success status,
    /// [`OAuthError::HttpError`] on transport failure.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> OAuthResult<TokenResponse> {
        if refresh_token.is_empty() {
            return Err(OAuthError::NoRefreshToken);
        }

        let form = vec![
            ("grant_type", GrantType::RefreshToken.to_string()),
            ("refresh_token", refresh_token.to_string()),
            ("client_id", self.config.client_id.clone()),
        ];

        self.token_request(form).await
    }

    async fn token_request(&self, form: Vec<(&str, String)>) -> OAuthResult<TokenResponse> {
        debug!(token_url = %self.config.token_url, grant_type = %form[0].1, "Requesting token");

        let mut request = self.http_client.post(&self.config.token_url).form(&form);
        if let Some(secret) = &self.config.client_secret {
            request = request.basic_auth(&self.config.client_id, Some(secret));
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<TokenErrorResponse>(&bytes).map_or_else(
                |_| String::from_utf8_lossy(&bytes).into_owned(),
                |e| match e.error_description {
                    Some(description) => format!("{}: {description}", e.error),
                    None => e.error,
                },
            );

            return Err(OAuthError::TokenRequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| OAuthError::InvalidTokenResponse(e.to_string()))
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &OAuth2Config {
        &self.config
    }
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Query parameters delivered to the redirect URI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationCallback {
    /// Authorization code.
    pub code: Option<String>,
    /// State parameter.
    pub state: Option<String>,
    /// Error code.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

impl AuthorizationCallback {
    /// Parse callback from a query string.
    ///
    /// # Errors
    ///
    /// Returns an error if the query string is not form-encoded.
    pub fn from_query(query: &str) -> OAuthResult<Self> {
        serde_urlencoded::from_str(query)
            .map_err(|e| OAuthError::InvalidTokenResponse(e.to_string()))
    }

    /// Check the state binding, then the provider error, then return the code.
    ///
    /// # Errors
    ///
    /// [`OAuthError::StateMismatch`] if `state` differs from `expected_state`,
    /// [`OAuthError::AuthorizationError`] if the provider reported one,
    /// [`OAuthError::InvalidTokenResponse`] if `code` is missing.
    pub fn validate(&self, expected_state: &str) -> OAuthResult<String> {
        let state = self.state.as_deref().unwrap_or_default();
        if state != expected_state {
            return Err(OAuthError::StateMismatch {
                expected: expected_state.to_string(),
                actual: state.to_string(),
            });
        }

        if let Some(error) = &self.error {
            return Err(OAuthError::AuthorizationError {
                error: error.clone(),
                description: self.error_description.clone().unwrap_or_default(),
            });
        }

        self.code
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| OAuthError::InvalidTokenResponse("Missing authorization code".into()))
    }
}

/// 32 random bytes, base64url without padding.
fn generate_state() -> String {
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use rand::RngCore;

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_string_contains, header, header_exists, method, path},
    };

    fn test_config(token_url: &str) -> OAuth2Config {
        OAuth2Config::public_client(
            "test_client_id",
            "https://twitter.com/i/oauth2/authorize",
            token_url,
        )
        .with_redirect_uri("http://127.0.0.1:8017/callback")
    }

    fn callback(code: Option<&str>, state: Option<&str>, error: Option<&str>) -> AuthorizationCallback {
        AuthorizationCallback {
            code: code.map(String::from),
            state: state.map(String::from),
            error: error.map(String::from),
            error_description: error.map(|_| "User denied access".to_string()),
        }
    }

    #[test]
    fn test_authorization_url_carries_pkce_and_state() {
        let client = OAuth2Client::new(
            test_config("https://api.x.com/2/oauth2/token")
                .with_scopes(vec!["tweet.read".into(), "offline.access".into()]),
            Client::new(),
        );

        let request = client.authorization_request(&["bookmark.read"]).unwrap();
        let url = Url::parse(&request.url).unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["client_id"], "test_client_id");
        assert_eq!(pairs["redirect_uri"], "http://127.0.0.1:8017/callback");
        assert_eq!(pairs["scope"], "tweet.read offline.access bookmark.read");
        assert_eq!(pairs["state"], request.state);
        assert_eq!(pairs["code_challenge"], request.pkce.challenge());
        assert_eq!(pairs["code_challenge_method"], "S256");
    }

    #[test]
    fn test_states_are_random() {
        assert_ne!(generate_state(), generate_state());
        assert_eq!(generate_state().len(), 43);
    }

    #[test]
    fn test_callback_validation() {
        let code = callback(Some("auth_code_123"), Some("expected"), None)
            .validate("expected")
            .unwrap();
        assert_eq!(code, "auth_code_123");
    }

    #[test]
    fn test_callback_state_mismatch() {
        let result = callback(Some("code"), Some("wrong"), None).validate("expected");
        assert!(matches!(result, Err(OAuthError::StateMismatch { .. })));

        let result = callback(Some("code"), None, None).validate("expected");
        assert!(matches!(result, Err(OAuthError::StateMismatch { .. })));
    }

    #[test]
    fn test_callback_error() {
        let result = callback(None, Some("state"), Some("access_denied")).validate("state");
        assert!(matches!(result, Err(OAuthError::AuthorizationError { .. })));
    }

    #[test]
    fn test_callback_error_with_wrong_state_is_a_state_mismatch() {
        let result = callback(None, Some("forged"), Some("access_denied")).validate("expected");
        assert!(matches!(result, Err(OAuthError::StateMismatch { .. })));

        let result = callback(None, None, Some("access_denied")).validate("expected");
        assert!(matches!(result, Err(OAuthError::StateMismatch { .. })));
    }

    #[test]
    fn test_callback_from_query() {
        let parsed = AuthorizationCallback::from_query("code=abc&state=xyz%3D").unwrap();
        assert_eq!(parsed.code.as_deref(), Some("abc"));
        assert_eq!(parsed.state.as_deref(), Some("xyz="));
    }

    #[tokio::test]
    async fn test_exchange_code_posts_verifier() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/oauth2/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=the_code"))
            .and(body_string_contains("code_verifier="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token_type": "bearer",
                "expires_in": 7200,
                "access_token": "new_access",
                "refresh_token": "new_refresh",
                "scope": "tweet.read offline.access"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OAuth2Client::new(
            test_config(&format!("{}/2/oauth2/token", server.uri())),
            Client::new(),
        );
        let token = client.exchange_code("the_code", &Pkce::new()).await.unwrap();

        assert_eq!(token.access_token, "new_access");
        assert_eq!(token.refresh_token.as_deref(), Some("new_refresh"));
    }

    #[tokio::test]
    async fn test_refresh_uses_basic_auth_for_confidential_clients() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2/oauth2/token"))
            .and(header_exists("authorization"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "refreshed"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = test_config(&format!("{}/2/oauth2/token", server.uri()))
            .with_client_secret(Some("secret".into()));
        let client = OAuth2Client::new(config, Client::new());

        let token = client.refresh("old_refresh").await.unwrap();
        assert_eq!(token.access_token, "refreshed");
        assert!(token.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_token_error_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_request",
                "error_description": "Value passed for the token was invalid."
            })))
            .mount(&server)
            .await;

        let client = OAuth2Client::new(test_config(&server.uri()), Client::new());
        let err = client.refresh("revoked").await.unwrap_err();

        match err {
            OAuthError::TokenRequestFailed { status, message } => {
                assert_eq!(status, 400);
                assert!(message.starts_with("invalid_request"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_refresh_token_is_rejected_locally() {
        let client = OAuth2Client::new(test_config("http://127.0.0.1:9/token"), Client::new());
        assert!(matches!(
            client.refresh("").await,
            Err(OAuthError::NoRefreshToken)
        ));
    }
}
