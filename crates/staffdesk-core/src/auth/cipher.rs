//! Symmetric encryption for the stored session token.
//!
//! Tokens are sealed with XChaCha20-Poly1305. The 256-bit key is derived
//! once from the configured secret with Argon2id under a fixed salt, so any
//! process holding the same secret can decrypt what another one wrote.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};

use super::error::CipherError;
use crate::config::SecretKey;

/// Prefix marking a value produced by [`TokenCipher::encrypt`].
const CIPHERTEXT_PREFIX: &str = "xc1:";

/// XChaCha20 nonce length in bytes.
const NONCE_SIZE: usize = 24;

/// Poly1305 tag length in bytes.
const TAG_SIZE: usize = 16;

/// Fixed salt for key derivation. Must never change, or every stored
/// credential becomes undecryptable.
const KDF_SALT: &[u8] = b"staffdesk.credential.v1";

/// Argon2id cost: 8 MiB, 2 passes, single lane.
const KDF_MEMORY_KIB: u32 = 8 * 1024;
const KDF_ITERATIONS: u32 = 2;
const KDF_PARALLELISM: u32 = 1;

#[derive(Clone)]
pub struct TokenCipher {
    cipher: XChaCha20Poly1305,
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher").finish_non_exhaustive()
    }
}

impl TokenCipher {
    /// Derive the encryption key from a secret.
    pub fn new(secret: &SecretKey) -> Result<Self, CipherError> {
        let params = Params::new(KDF_MEMORY_KIB, KDF_ITERATIONS, KDF_PARALLELISM, Some(32))
            .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = [0u8; 32];
        argon2
            .hash_password_into(secret.expose().as_bytes(), KDF_SALT, &mut key)
            .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;

        let cipher = XChaCha20Poly1305::new_from_slice(&key)
            .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Encrypt a token, returning the prefixed base64 text form.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        // Format: xc1:<base64(nonce + ciphertext)>
        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);

        let encoded = base64::engine::general_purpose::STANDARD.encode(&combined);
        Ok(format!("{CIPHERTEXT_PREFIX}{encoded}"))
    }

    /// Decrypt the text form back to the token.
    pub fn decrypt(&self, encrypted: &str) -> Result<String, CipherError> {
        let encoded = encrypted
            .strip_prefix(CIPHERTEXT_PREFIX)
            .ok_or(CipherError::MissingPrefix)?;

        let combined = base64::engine::general_purpose::STANDARD.decode(encoded.trim())?;
        if combined.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CipherError::Truncated(combined.len()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(XNonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CipherError::Decrypt)?;

        Ok(String::from_utf8(plaintext)?)
    }

    /// Check whether a value looks like output of [`encrypt`](Self::encrypt).
    pub fn is_encrypted(value: &str) -> bool {
        value.starts_with(CIPHERTEXT_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher(secret: &str) -> TokenCipher {
        TokenCipher::new(&SecretKey::new(secret)).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt() {
        let c = cipher("correct horse battery staple");
        let encrypted = c.encrypt("tok_abc123").unwrap();

        assert!(TokenCipher::is_encrypted(&encrypted));
        assert!(!encrypted.contains("tok_abc123"));
        assert_eq!(c.decrypt(&encrypted).unwrap(), "tok_abc123");
    }

    #[test]
    fn test_empty_plaintext_decrypts_to_empty() {
        let c = cipher("secret");
        let encrypted = c.encrypt("").unwrap();
        assert_eq!(c.decrypt(&encrypted).unwrap(), "");
    }

    #[test]
    fn test_nonce_is_fresh_per_call() {
        let c = cipher("secret");
        assert_ne!(c.encrypt("same").unwrap(), c.encrypt("same").unwrap());
    }

    #[test]
    fn test_same_secret_derives_same_key() {
        let encrypted = cipher("shared").encrypt("tok").unwrap();
        assert_eq!(cipher("shared").decrypt(&encrypted).unwrap(), "tok");
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = cipher("one").encrypt("tok").unwrap();
        assert!(matches!(
            cipher("two").decrypt(&encrypted),
            Err(CipherError::Decrypt)
        ));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let c = cipher("secret");
        assert!(matches!(c.decrypt("not a token"), Err(CipherError::MissingPrefix)));
        assert!(matches!(c.decrypt("xc1:!!!"), Err(CipherError::Encoding(_))));
        assert!(matches!(c.decrypt("xc1:AAAA"), Err(CipherError::Truncated(3))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let c = cipher("secret");
        let encrypted = c.encrypt("tok_abc123").unwrap();

        let encoded = encrypted.strip_prefix(CIPHERTEXT_PREFIX).unwrap();
        let mut bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = format!(
            "{CIPHERTEXT_PREFIX}{}",
            base64::engine::general_purpose::STANDARD.encode(&bytes)
        );

        assert!(matches!(c.decrypt(&tampered), Err(CipherError::Decrypt)));
    }
}
