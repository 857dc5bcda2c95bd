use thiserror::Error;

/// Failures from [`TokenCipher`](super::TokenCipher).
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption failed")]
    Encrypt,

    #[error("Ciphertext is missing the expected prefix")]
    MissingPrefix,

    #[error("Ciphertext is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Ciphertext too short ({0} bytes)")]
    Truncated(usize),

    #[error("Decryption failed - wrong key or corrupted ciphertext")]
    Decrypt,

    #[error("Decrypted token is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("No secret key configured")]
    NoSecretKey,
}

/// Failures from a [`CredentialStore`](super::CredentialStore) write.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Credential file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential file is malformed: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Credential store lock poisoned")]
    Poisoned,
}

/// Failures from the sign-in / sign-out flow.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session token is empty")]
    EmptyToken,

    #[error("No secret key configured - set STAFFDESK_SECRET_KEY")]
    MissingSecretKey,

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
