use tracing::info;

use super::cipher::TokenCipher;
use super::credentials::CredentialStore;
use super::error::SessionError;
use super::guard::AUTH_TOKEN_KEY;

/// Sign-in / sign-out flow: the only writer of the stored auth token.
pub struct SessionManager<S> {
    store: S,
    cipher: Option<TokenCipher>,
}

impl<S: CredentialStore> SessionManager<S> {
    pub fn new(store: S, cipher: Option<TokenCipher>) -> Self {
        Self { store, cipher }
    }

    /// Encrypt `token` and persist it, replacing any previous session.
    pub fn sign_in(&self, token: &str) -> Result<(), SessionError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }
        let cipher = self.cipher.as_ref().ok_or(SessionError::MissingSecretKey)?;

        let sealed = cipher.encrypt(token)?;
        self.store.set(AUTH_TOKEN_KEY, &sealed)?;
        info!("Session token stored");
        Ok(())
    }

    /// Forget the stored session. Signing out twice is fine.
    pub fn sign_out(&self) -> Result<(), SessionError> {
        self.store.remove(AUTH_TOKEN_KEY)?;
        info!("Session token removed");
        Ok(())
    }

    /// Whether anything is stored, without attempting decryption.
    pub fn has_stored_credential(&self) -> bool {
        self.store.get(AUTH_TOKEN_KEY).is_some()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
