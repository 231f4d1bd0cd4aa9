//! # Cryptographic Utilities
//!
//! Secure token generation and constant-time comparison. Every capability in
//! the system (anonymous session keys, admin secrets, invite tokens, session
//! cookies) comes out of [`generate_token`].

use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Generate a cryptographically secure random token
///
/// Returns a 256-bit (32-byte) random value as URL-safe base64.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a token for storage using SHA-256
///
/// Session cookie ids are stored hashed; the raw token only lives in the
/// client's cookie.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let result = hasher.finalize();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(result)
}

/// Constant-time comparison of two byte slices
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Constant-time comparison of two strings
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generation() {
        let token1 = generate_token();
        let token2 = generate_token();

        // Tokens should be unique
        assert_ne!(token1, token2);

        // Tokens should be reasonable length (base64 of 32 bytes)
        assert!(token1.len() >= 32);
    }

    #[test]
    fn test_token_hashing() {
        let token = generate_token();
        let hash = hash_token(&token);

        // Hash should be different from token
        assert_ne!(token, hash);

        // Same token should produce same hash
        assert_eq!(hash, hash_token(&token));
    }

    #[test]
    fn test_constant_time_comparison() {
        assert!(constant_time_str_eq("hello", "hello"));
        assert!(!constant_time_str_eq("hello", "world"));
        assert!(!constant_time_str_eq("hello", "hello!"));
    }
}
