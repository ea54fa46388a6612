//! xpost OAuth - credential primitives for the X API
//!
//! This crate covers the three ways `xpost` authenticates against X:
//!
//! - **OAuth 1.0a**: HMAC-SHA1 request signing for user-context calls
//! - **OAuth 2.0 + PKCE**: authorization URL, code exchange and refresh
//! - **Token state**: the persisted token shape and its expiry arithmetic
//!
//! Nothing here touches the filesystem; persistence lives in the `xpost`
//! crate.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use xpost_oauth::{OAuth2Client, OAuth2Config};
//!
//! let config = OAuth2Config::public_client(
//!     "client_id",
//!     "https://twitter.com/i/oauth2/authorize",
//!     "https://api.x.com/2/oauth2/token",
//! )
//! .with_redirect_uri("http://127.0.0.1:8017/callback");
//!
//! let client = OAuth2Client::new(config, reqwest::Client::new());
//! let request = client.authorization_request(&["tweet.read", "offline.access"])?;
//!
//! // After the user approves, the callback carries `code` and `state`.
//! let token = client.exchange_code(&code, &request.pkce).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod oauth1;
mod oauth2;
mod pkce;
mod token;

pub use error::*;
pub use oauth1::*;
pub use oauth2::*;
pub use pkce::*;
pub use token::*;

use std::time::Duration;

/// Refresh an access token when less than this much lifetime remains.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(7200);

/// OAuth 2.0 grant types used against the X token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantType {
    /// Authorization code grant (end of the PKCE flow).
    AuthorizationCode,
    /// Refresh token grant.
    RefreshToken,
}

impl GrantType {
    /// Wire value for the `grant_type` form field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::RefreshToken => "refresh_token",
        }
    }
}

impl std::fmt::Display for GrantType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
