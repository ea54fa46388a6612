//! PKCE (Proof Key for Code Exchange, RFC 7636).
//!
//! X only accepts the `S256` challenge method for confidential and public
//! clients alike, so that is the only method offered here.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::{OAuthError, OAuthResult};

/// Challenge method sent alongside `code_challenge`.
pub const PKCE_METHOD: &str = "S256";

const VERIFIER_BYTES: usize = 32;

/// PKCE verifier and S256 challenge pair.
#[derive(Clone)]
pub struct Pkce {
    verifier: String,
    challenge: String,
}

impl Pkce {
    /// Generate a fresh pair from 32 random bytes (43-character verifier).
    #[must_use]
    pub fn new() -> Self {
        let mut bytes = [0u8; VERIFIER_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let verifier = URL_SAFE_NO_PAD.encode(bytes);
        let challenge = challenge_for(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    /// Rebuild a pair from an existing verifier.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::PkceError`] if the verifier is not 43-128
    /// unreserved characters.
    pub fn from_verifier(verifier: &str) -> OAuthResult<Self> {
        if !(43..=128).contains(&verifier.len()) {
            return Err(OAuthError::PkceError(format!(
                "Verifier must be 43-128 characters, got {}",
                verifier.len()
            )));
        }

        if !verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
        {
            return Err(OAuthError::PkceError(
                "Verifier contains invalid characters".to_string(),
            ));
        }

        Ok(Self {
            verifier: verifier.to_string(),
            challenge: challenge_for(verifier),
        })
    }

    /// The secret half, sent only to the token endpoint.
    #[must_use]
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// The public half, sent in the authorization URL.
    #[must_use]
    pub fn challenge(&self) -> &str {
        &self.challenge
    }
}

impl Default for Pkce {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Pkce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pkce")
            .field("verifier", &"<redacted>")
            .field("challenge", &self.challenge)
            .finish()
    }
}

fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkce_generation() {
        let pkce = Pkce::new();

        assert_eq!(pkce.verifier().len(), 43);
        assert_eq!(pkce.challenge().len(), 43);
        assert_ne!(pkce.verifier(), pkce.challenge());
        assert!(Pkce::from_verifier(pkce.verifier()).is_ok());
    }

    #[test]
    fn test_pkce_pairs_are_unique() {
        assert_ne!(Pkce::new().verifier(), Pkce::new().verifier());
    }

    #[test]
    fn test_rfc7636_appendix_b_vector() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let pkce = Pkce::from_verifier(verifier).unwrap();

        assert_eq!(pkce.verifier(), verifier);
        assert_eq!(pkce.challenge(), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn test_invalid_verifiers() {
        assert!(Pkce::from_verifier("short").is_err());
        assert!(Pkce::from_verifier(&"a".repeat(129)).is_err());
        assert!(Pkce::from_verifier(&" ".repeat(50)).is_err());
        assert!(Pkce::from_verifier(&"a".repeat(128)).is_ok());
    }

    #[test]
    fn test_debug_hides_verifier() {
        let pkce = Pkce::new();
        assert!(!format!("{pkce:?}").contains(pkce.verifier()));
    }
}
