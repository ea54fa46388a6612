//! Silent renewal of the OAuth 2.0 access token.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use xpost_oauth::{DEFAULT_REFRESH_MARGIN, OAuth2Client, OAuthError, StoredToken};

use crate::error::{XpostError, XpostResult};
use crate::token_store::TokenStore;

/// Refreshes a token shortly before it expires and persists the result.
#[derive(Debug, Clone)]
pub struct TokenRefresher {
    oauth: OAuth2Client,
    store: TokenStore,
    margin: Duration,
}

impl TokenRefresher {
    #[must_use]
    pub const fn new(oauth: OAuth2Client, store: TokenStore) -> Self {
        Self {
            oauth,
            store,
            margin: DEFAULT_REFRESH_MARGIN,
        }
    }

    #[must_use]
    pub const fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// Refresh `token` in place if it is within the safety margin of expiry.
    ///
    /// Returns whether a refresh happened.
    ///
    /// # Errors
    ///
    /// [`XpostError::ReauthorizationRequired`] when the token endpoint rejects
    /// the refresh token or none is stored, [`XpostError::Transient`] when the
    /// endpoint cannot be reached.
    pub async fn ensure_valid(&self, token: &mut StoredToken) -> XpostResult<bool> {
        self.ensure_valid_at(token, Utc::now()).await
    }

    #[instrument(skip_all, fields(expires_at = token.expires_at))]
    pub async fn ensure_valid_at(
        &self,
        token: &mut StoredToken,
        now: DateTime<Utc>,
    ) -> XpostResult<bool> {
        if !token.needs_refresh_at(now, self.margin) {
            return Ok(false);
        }

        let refresh_token = token
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                XpostError::ReauthorizationRequired(
                    "access token expired and no refresh token is stored; run `xpost auth`".into(),
                )
            })?;

        let response = self
            .oauth
            .refresh(&refresh_token)
            .await
            .map_err(|e| match e {
                OAuthError::HttpError(e) => XpostError::from(e),
                OAuthError::InvalidTokenResponse(msg) => XpostError::MalformedResponse(msg),
                other => XpostError::ReauthorizationRequired(format!("{other}; run `xpost auth`")),
            })?;

        token.apply_refresh(response, Utc::now());
        self.store.save(token)?;
        info!(expires_at = token.expires_at, "Refreshed OAuth 2.0 access token");

        Ok(true)
    }
}
