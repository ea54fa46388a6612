//! OAuth 2.0 token types.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::DEFAULT_TOKEN_LIFETIME;

/// Token endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token.
    pub access_token: String,

    /// Token type (X always answers "bearer").
    #[serde(default)]
    pub token_type: Option<String>,

    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// Refresh token, present when `offline.access` was granted.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Granted scopes (space-separated).
    #[serde(default)]
    pub scope: Option<String>,
}

/// The OAuth 2.0 token pair as persisted between invocations.
///
/// `expires_at` is the wall-clock instant (Unix seconds) after which
/// `access_token` must not be used without refreshing first.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredToken {
    /// Bearer access token.
    pub access_token: String,

    /// Refresh token, if the grant included `offline.access`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Expiry as Unix seconds.
    #[serde(with = "epoch_secs")]
    pub expires_at: i64,

    /// Client the token was issued to; used for refresh when no client id
    /// is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Granted scopes (space-separated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl StoredToken {
    /// Build a token from a code-exchange response received at `now`.
    #[must_use]
    pub fn from_response(
        response: TokenResponse,
        client_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: expiry_from(now, response.expires_in),
            client_id,
            scope: response.scope,
        }
    }

    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.expires_at, 0)
    }

    /// True when `now` is within `margin` of expiry (or past it).
    #[must_use]
    pub fn needs_refresh_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        let margin = TimeDelta::from_std(margin).unwrap_or(TimeDelta::MAX);
        self.expires_at()
            .and_then(|expiry| expiry.checked_sub_signed(margin))
            .is_none_or(|deadline| now >= deadline)
    }

    /// Replace the access token after a refresh at `now`.
    ///
    /// The previous refresh token is kept when the response carries none.
    pub fn apply_refresh(&mut self, response: TokenResponse, now: DateTime<Utc>) {
        self.access_token = response.access_token;
        self.expires_at = expiry_from(now, response.expires_in);

        if let Some(rt) = response.refresh_token {
            self.refresh_token = Some(rt);
        }
        if let Some(scope) = response.scope {
            self.scope = Some(scope);
        }
    }

    /// `Authorization` header value for this token.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

impl std::fmt::Debug for StoredToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredToken")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .field("client_id", &self.client_id)
            .field("scope", &self.scope)
            .finish()
    }
}

fn expiry_from(now: DateTime<Utc>, expires_in: Option<u64>) -> i64 {
    let lifetime = expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME.as_secs());
    now.timestamp()
        .saturating_add(i64::try_from(lifetime).unwrap_or(i64::MAX))
}

/// Unix seconds; fractional values written by older tools are truncated.
mod epoch_secs {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(secs: &i64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(*secs)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn deserialize<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() {
            return Err(serde::de::Error::custom("expires_at must be finite"));
        }
        Ok(secs.trunc() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn response(refresh: Option<&str>, expires_in: Option<u64>) -> TokenResponse {
        TokenResponse {
            access_token: "access".into(),
            token_type: Some("bearer".into()),
            expires_in,
            refresh_token: refresh.map(String::from),
            scope: Some("tweet.read offline.access".into()),
        }
    }

    #[test]
    fn test_from_response_computes_expiry() {
        let token = StoredToken::from_response(response(Some("r1"), Some(3600)), None, at(1_000));
        assert_eq!(token.expires_at, 4_600);
        assert_eq!(token.refresh_token.as_deref(), Some("r1"));
    }

    #[test]
    fn test_missing_expires_in_defaults_to_two_hours() {
        let token = StoredToken::from_response(response(None, None), None, at(0));
        assert_eq!(token.expires_at, 7_200);
    }

    #[test]
    fn test_needs_refresh_boundary() {
        let token = StoredToken::from_response(response(Some("r"), Some(600)), None, at(0));
        let margin = Duration::from_secs(60);

        assert!(!token.needs_refresh_at(at(539), margin));
        assert!(token.needs_refresh_at(at(540), margin));
        assert!(token.needs_refresh_at(at(10_000), margin));
    }

    #[test]
    fn test_apply_refresh_keeps_old_refresh_token() {
        let mut token = StoredToken::from_response(response(Some("old"), Some(60)), None, at(0));
        token.apply_refresh(response(None, Some(7200)), at(100));

        assert_eq!(token.refresh_token.as_deref(), Some("old"));
        assert_eq!(token.expires_at, 7_300);

        token.apply_refresh(response(Some("new"), None), at(200));
        assert_eq!(token.refresh_token.as_deref(), Some("new"));
    }

    #[test]
    fn test_accepts_fractional_expiry() {
        let token: StoredToken = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","expires_at":1700000000.75}"#,
        )
        .unwrap();
        assert_eq!(token.expires_at, 1_700_000_000);
    }

    #[test]
    fn test_serialization_shape() {
        let token = StoredToken::from_response(
            response(Some("r"), Some(10)),
            Some("client".into()),
            at(5),
        );
        let value = serde_json::to_value(&token).unwrap();

        assert_eq!(value["expires_at"], 15);
        assert_eq!(value["client_id"], "client");
        assert_eq!(value["access_token"], "access");
    }
}
