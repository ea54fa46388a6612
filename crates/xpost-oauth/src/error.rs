//! OAuth error types.

/// OAuth errors.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Invalid client configuration.
    #[error("Invalid OAuth configuration: {0}")]
    InvalidConfig(String),

    /// The callback `state` did not match the one we issued.
    #[error("OAuth state mismatch: expected {expected}, got {actual}")]
    StateMismatch {
        /// Expected state value.
        expected: String,
        /// Received state value.
        actual: String,
    },

    /// The provider redirected back with an `error` parameter.
    #[error("Authorization error: {error} - {description}")]
    AuthorizationError {
        /// Error code from provider.
        error: String,
        /// Human-readable description.
        description: String,
    },

    /// The token endpoint answered with a non-success status.
    #[error("Token request failed ({status}): {message}")]
    TokenRequestFailed {
        /// HTTP status returned by the token endpoint.
        status: u16,
        /// Provider error code and description.
        message: String,
    },

    /// No refresh token available.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Token endpoint or callback returned something we could not use.
    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    /// HTTP request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// URL parsing failed.
    #[error("URL parsing failed: {0}")]
    UrlError(#[from] url::ParseError),

    /// OAuth 1.0a signature error.
    #[error("OAuth 1.0a signature error: {0}")]
    SignatureError(String),

    /// PKCE error.
    #[error("PKCE error: {0}")]
    PkceError(String),
}

/// Result type for OAuth operations.
pub type OAuthResult<T> = Result<T, OAuthError>;
