//! Token generation module
//!
//! Produces URL-safe API bearer tokens from the OS-seeded thread RNG.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine};
use rand::RngCore;

use crate::traits::TokenGenerator;

const TOKEN_BYTES: usize = 32; // 43 chars once encoded

/// Generate a new random API bearer token
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    BASE64_URL.encode(bytes)
}

/// Default `TokenGenerator` backed by `generate_secure_token`
#[derive(Debug, Default, Clone, Copy)]
pub struct SecureTokenGenerator;

impl TokenGenerator for SecureTokenGenerator {
    fn generate(&self) -> String {
        generate_secure_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenPolicy;

    #[test]
    fn token_has_expected_length_and_alphabet() {
        let token = generate_secure_token();
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn tokens_differ() {
        assert_ne!(generate_secure_token(), generate_secure_token());
    }

    #[test]
    fn generated_token_passes_default_policy() {
        let policy = TokenPolicy::default();
        for _ in 0..32 {
            assert!(policy.is_secure(&SecureTokenGenerator.generate()));
        }
    }
}
