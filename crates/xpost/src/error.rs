//! Error taxonomy for xpost.
//!
//! Every failure a command can hit maps onto one of these variants, and each
//! variant maps onto a stable `kind` string and process exit code.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;
use xpost_oauth::OAuthError;

/// xpost errors.
#[derive(Error, Debug)]
pub enum XpostError {
    /// Arguments rejected before any request was made
    #[error("{0}")]
    Validation(String),

    /// The command needs a credential variant that is not configured
    #[error("{variant} credentials are not configured: {hint}")]
    AuthUnavailable { variant: &'static str, hint: String },

    /// 401 from the API
    #[error("Authentication rejected: {message}")]
    Auth { message: String },

    /// 403 from the API
    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
        hint: Option<String>,
    },

    /// 404 from the API
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// 409 from the API
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// 429 from the API
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<u64>,
    },

    /// 5xx or a network failure
    #[error("Transient failure: {message}")]
    Transient {
        status: Option<u16>,
        message: String,
    },

    /// Any other non-success status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// PKCE callback carried a state we did not issue
    #[error("OAuth state mismatch; the authorization callback was not ours")]
    StateMismatch,

    /// The user or provider refused the authorization
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// No callback reached the loopback listener in time
    #[error("Timed out after {}s waiting for the authorization callback", .0.as_secs())]
    CallbackTimeout(Duration),

    /// The stored refresh token no longer works
    #[error("Re-authorization required: {0}")]
    ReauthorizationRequired(String),

    /// 2xx with a body we could not use
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Token file exists but cannot be parsed
    #[error("Malformed token file {}: {message}", path.display())]
    MalformedTokenFile { path: PathBuf, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem or socket error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl XpostError {
    /// Classify a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: u16, message: String, retry_after: Option<u64>) -> Self {
        match status {
            401 => Self::Auth { message },
            403 => Self::Forbidden {
                message,
                hint: None,
            },
            404 => Self::NotFound { message },
            409 => Self::Conflict { message },
            429 => Self::RateLimited {
                message,
                retry_after,
            },
            500..=599 => Self::Transient {
                status: Some(status),
                message,
            },
            _ => Self::Api { status, message },
        }
    }

    /// Check if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::RateLimited { .. })
    }

    /// Get the server's suggested retry delay.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => retry_after.map(Duration::from_secs),
            _ => None,
        }
    }

    /// Stable machine-readable name of the error class.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::AuthUnavailable { .. } => "auth_unavailable",
            Self::Auth { .. } => "auth",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::RateLimited { .. } => "rate_limited",
            Self::Transient { .. } => "transient",
            Self::Api { .. } => "api",
            Self::StateMismatch => "state_mismatch",
            Self::AuthorizationDenied(_) => "authorization_denied",
            Self::CallbackTimeout(_) => "callback_timeout",
            Self::ReauthorizationRequired(_) => "reauthorization_required",
            Self::MalformedResponse(_) => "malformed_response",
            Self::MalformedTokenFile { .. } => "malformed_token_file",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
        }
    }

    /// HTTP status behind the error, when there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::Conflict { .. } => Some(409),
            Self::RateLimited { .. } => Some(429),
            Self::Transient { status, .. } => *status,
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Process exit code for this error class.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Config(_) => 2,
            Self::AuthUnavailable { .. }
            | Self::Auth { .. }
            | Self::StateMismatch
            | Self::AuthorizationDenied(_)
            | Self::CallbackTimeout(_)
            | Self::ReauthorizationRequired(_)
            | Self::MalformedTokenFile { .. } => 3,
            Self::Forbidden { .. } => 4,
            Self::NotFound { .. } => 5,
            Self::Conflict { .. } => 6,
            Self::RateLimited { .. } => 7,
            Self::Transient { .. }
            | Self::Api { .. }
            | Self::MalformedResponse(_)
            | Self::Io(_)
            | Self::Json(_) => 8,
        }
    }

    /// Attach a human hint to a 403.
    #[must_use]
    pub fn with_forbidden_hint(self, text: &str) -> Self {
        match self {
            Self::Forbidden { message, .. } => Self::Forbidden {
                message,
                hint: Some(text.to_string()),
            },
            other => other,
        }
    }

    /// The structured form written to stderr.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut error = json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        if let Some(status) = self.status() {
            error["status"] = json!(status);
        }
        if let Some(retry_after) = self.retry_after() {
            error["retry_after"] = json!(retry_after.as_secs());
        }
        match self {
            Self::Forbidden {
                hint: Some(hint), ..
            } => error["hint"] = json!(hint),
            Self::AuthUnavailable { hint, .. } => error["hint"] = json!(hint),
            _ => {}
        }
        json!({ "error": error })
    }
}

impl From<reqwest::Error> for XpostError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Self::Config(e.to_string())
        } else {
            Self::Transient {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            }
        }
    }
}

impl From<OAuthError> for XpostError {
    fn from(e: OAuthError) -> Self {
        match e {
            OAuthError::StateMismatch { .. } => Self::StateMismatch,
            OAuthError::AuthorizationError { error, description } => {
                Self::AuthorizationDenied(if description.is_empty() {
                    error
                } else {
                    format!("{error}: {description}")
                })
            }
            OAuthError::TokenRequestFailed { status, message } => {
                Self::from_status(status, message, None)
            }
            OAuthError::HttpError(e) => e.into(),
            OAuthError::InvalidConfig(msg) => Self::Config(msg),
            OAuthError::NoRefreshToken => {
                Self::ReauthorizationRequired("no refresh token stored".into())
            }
            other => Self::Auth {
                message: other.to_string(),
            },
        }
    }
}

/// Result type for xpost operations.
pub type XpostResult<T> = Result<T, XpostError>;
