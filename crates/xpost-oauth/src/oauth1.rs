//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1).
//!
//! X still requires OAuth 1.0a signatures for most user-context calls.
//! Only query parameters and `application/x-www-form-urlencoded` body
//! parameters take part in the signature; JSON bodies never do.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::RngCore;
use sha1::Sha1;

use crate::{OAuthError, OAuthResult};

/// Everything except the RFC 3986 unreserved set (`ALPHA DIGIT - . _ ~`).
pub const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// The OAuth 1.0a user-context quadruple.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuth1Credentials {
    /// Consumer key (API key).
    pub consumer_key: String,
    /// Consumer secret (API secret).
    pub consumer_secret: String,
    /// User access token.
    pub access_token: String,
    /// User access token secret.
    pub access_token_secret: String,
}

impl std::fmt::Debug for OAuth1Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// OAuth 1.0a signer for X API requests.
#[derive(Debug, Clone)]
pub struct OAuth1Signer {
    credentials: OAuth1Credentials,
}

impl OAuth1Signer {
    /// Create a signer over a credential quadruple.
    #[must_use]
    pub const fn new(credentials: OAuth1Credentials) -> Self {
        Self { credentials }
    }

    /// Produce the `Authorization` header value with a fresh nonce and the
    /// current Unix time.
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, etc.)
    /// * `url` - Base URL, without query string
    /// * `params` - Query parameters plus form body parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the system clock is before the Unix epoch.
    pub fn sign(&self, method: &str, url: &str, params: &[(String, String)]) -> OAuthResult<String> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| OAuthError::SignatureError(format!("Failed to get timestamp: {e}")))?
            .as_secs();

        self.sign_with(method, url, params, &generate_nonce(), timestamp)
    }

    /// Deterministic variant of [`sign`](Self::sign): identical inputs give
    /// a byte-identical header.
    ///
    /// # Errors
    ///
    /// Returns an error if the HMAC key cannot be constructed.
    pub fn sign_with(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        nonce: &str,
        timestamp: u64,
    ) -> OAuthResult<String> {
        let oauth_params = [
            ("oauth_consumer_key", self.credentials.consumer_key.clone()),
            ("oauth_nonce", nonce.to_string()),
            ("oauth_signature_method", "HMAC-SHA1".to_string()),
            ("oauth_timestamp", timestamp.to_string()),
            ("oauth_token", self.credentials.access_token.clone()),
            ("oauth_version", "1.0".to_string()),
        ];

        // Sorting happens on the encoded pairs.
        let mut encoded: Vec<(String, String)> = oauth_params
            .iter()
            .map(|(k, v)| (percent_encode(k), percent_encode(v)))
            .chain(
                params
                    .iter()
                    .map(|(k, v)| (percent_encode(k), percent_encode(v))),
            )
            .collect();
        encoded.sort();

        let param_string = encoded
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let base_string = format!(
            "{}&{}&{}",
            method.to_ascii_uppercase(),
            percent_encode(url),
            percent_encode(&param_string)
        );

        let signing_key = format!(
            "{}&{}",
            percent_encode(&self.credentials.consumer_secret),
            percent_encode(&self.credentials.access_token_secret)
        );

        let signature = hmac_sha1(&signing_key, &base_string)?;

        let mut header_params: Vec<(&str, String)> = oauth_params.to_vec();
        header_params.push(("oauth_signature", signature));
        header_params.sort_by(|a, b| a.0.cmp(b.0));

        let header = header_params
            .iter()
            .map(|(k, v)| format!("{k}=\"{}\"", percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {header}"))
    }
}

/// Percent-encode a string according to RFC 3986.
#[must_use]
pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// Encode `key=value` pairs joined with `&`, using the signing encoding.
///
/// Used for both query strings and form bodies so that what goes on the
/// wire is exactly what was signed.
#[must_use]
pub fn encode_pairs(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// 16 random bytes rendered as 32 hex characters.
fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hmac_sha1(key: &str, data: &str) -> OAuthResult<String> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|e| OAuthError::SignatureError(e.to_string()))?;
    mac.update(data.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published_example_signer() -> OAuth1Signer {
        OAuth1Signer::new(OAuth1Credentials {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog".into(),
            consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".into(),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".into(),
            access_token_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".into(),
        })
    }

    fn status_params() -> Vec<(String, String)> {
        vec![
            ("include_entities".into(), "true".into()),
            (
                "status".into(),
                "Hello Ladies + Gentlemen, a signed OAuth request!".into(),
            ),
        ]
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("hello world"), "hello%20world");
        assert_eq!(percent_encode("foo=bar&baz"), "foo%3Dbar%26baz");
        assert_eq!(percent_encode("test-value_123.txt"), "test-value_123.txt");
        assert_eq!(percent_encode("~tilde"), "~tilde");
        assert_eq!(percent_encode("a+b*c"), "a%2Bb%2Ac");
        assert_eq!(percent_encode("☃"), "%E2%98%83");
    }

    #[test]
    fn test_generate_nonce() {
        let nonce1 = generate_nonce();
        let nonce2 = generate_nonce();

        assert_ne!(nonce1, nonce2);
        assert_eq!(nonce1.len(), 32);
        assert!(nonce1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_published_signature_vector() {
        let header = published_example_signer()
            .sign_with(
                "post",
                "https://api.twitter.com/1.1/statuses/update.json",
                &status_params(),
                "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg",
                1_318_622_958,
            )
            .unwrap();

        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\", "));
        assert!(header.ends_with("oauth_version=\"1.0\""));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let signer = published_example_signer();
        let sign = || {
            signer
                .sign_with(
                    "GET",
                    "https://api.x.com/2/users/me",
                    &[("user.fields".into(), "username,name".into())],
                    "abc123",
                    1_700_000_000,
                )
                .unwrap()
        };

        assert_eq!(sign(), sign());
    }

    #[test]
    fn test_params_change_signature() {
        let signer = published_example_signer();
        let url = "https://api.x.com/2/tweets/search/recent";
        let a = signer
            .sign_with("GET", url, &[("query".into(), "rust".into())], "n", 1)
            .unwrap();
        let b = signer
            .sign_with("GET", url, &[("query".into(), "rust lang".into())], "n", 1)
            .unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_sign_uses_fresh_nonce() {
        let signer = published_example_signer();
        let a = signer.sign("GET", "https://api.x.com/2/users/me", &[]).unwrap();
        let b = signer.sign("GET", "https://api.x.com/2/users/me", &[]).unwrap();

        assert!(a.starts_with("OAuth "));
        assert!(a.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert_ne!(a, b);
    }

    #[test]
    fn test_encode_pairs_matches_signing_encoding() {
        let encoded = encode_pairs(&[
            ("query".into(), "from:jack #rust".into()),
            ("max_results".into(), "10".into()),
        ]);
        assert_eq!(encoded, "query=from%3Ajack%20%23rust&max_results=10");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", published_example_signer());
        assert!(rendered.contains("xvz1evFS4wEEPTGEFPHBog"));
        assert!(!rendered.contains("kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw"));
    }
}
