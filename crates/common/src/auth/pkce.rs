//! PKCE (Proof Key for Code Exchange) implementation for OAuth 2.0
//!
//! Implements RFC 7636 S256 challenges. A fresh pair is generated for every
//! authentication attempt and lives only for the duration of that flow.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Challenge method sent in the authorization request
pub const CODE_CHALLENGE_METHOD: &str = "S256";

/// Bytes of entropy behind each verifier
const VERIFIER_ENTROPY_BYTES: usize = 32;

/// Generate a cryptographically secure code verifier
///
/// Returns a URL-safe, unpadded base64 encoding of 32 random bytes
/// (43 characters), drawn from the thread-local CSPRNG.
#[must_use]
pub fn generate_code_verifier() -> String {
    let mut random_bytes = [0u8; VERIFIER_ENTROPY_BYTES];
    rand::thread_rng().fill_bytes(&mut random_bytes);
    URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Derive the code challenge from a verifier
///
/// Per RFC 7636, the challenge is BASE64URL(SHA256(ASCII(code_verifier))).
/// Pure: the same verifier always yields the same challenge.
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Single-use PKCE pair for one authorization attempt
///
/// The verifier stays in memory until the token exchange; only the
/// challenge leaves the process in the authorization request.
#[derive(Clone)]
pub struct PKCEChallenge {
    /// Random string (43 chars, base64url encoded)
    pub code_verifier: String,

    /// SHA256 hash of `code_verifier` (base64url encoded)
    pub code_challenge: String,
}

impl PKCEChallenge {
    /// Generate a fresh verifier and its derived challenge
    ///
    /// # Examples
    /// ```
    /// use rxauth_common::auth::pkce::PKCEChallenge;
    ///
    /// let challenge = PKCEChallenge::generate();
    /// assert!(challenge.code_verifier.len() >= 43);
    /// assert_ne!(challenge.code_verifier, challenge.code_challenge);
    /// ```
    #[must_use]
    pub fn generate() -> Self {
        let code_verifier = generate_code_verifier();
        let code_challenge = generate_code_challenge(&code_verifier);

        Self { code_verifier, code_challenge }
    }

    /// Get the challenge method (always "S256")
    #[must_use]
    pub fn challenge_method(&self) -> &'static str {
        CODE_CHALLENGE_METHOD
    }
}

impl std::fmt::Debug for PKCEChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PKCEChallenge")
            .field("code_verifier", &"<redacted>")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}
