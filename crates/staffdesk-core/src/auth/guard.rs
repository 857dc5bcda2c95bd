//! Route access guard.
//!
//! Decides, for every navigation, whether the protected view renders or the
//! user is sent to the login page. The decision is recomputed from the
//! credential store each time; nothing is cached between navigations.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::cipher::TokenCipher;
use super::credentials::CredentialStore;
use super::error::CipherError;
use crate::router::{Decision, NavigationRequest, Navigator, Route};

/// Store key holding the encrypted session token
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// Paths reachable without a session token
pub const PUBLIC_PATHS: [&str; 2] = ["/login", "/forgot-password"];

/// Exact, case-sensitive membership in [`PUBLIC_PATHS`].
pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

pub struct RouteGuard<S> {
    store: S,
    cipher: Option<TokenCipher>,
}

impl<S: CredentialStore> RouteGuard<S> {
    /// `cipher` is `None` when no secret key is configured; every stored
    /// credential then counts as undecryptable.
    pub fn new(store: S, cipher: Option<TokenCipher>) -> Self {
        Self { store, cipher }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decide whether a navigation to `location` may render.
    pub fn evaluate(&self, location: &str) -> Decision {
        let request = NavigationRequest::parse(location);
        let path = request.path();

        if is_public_path(path) {
            debug!(path, "Public path, access granted");
            return Decision::Render;
        }

        match self.auth_state() {
            AuthState::Authenticated => {
                debug!(path, "Session token present, access granted");
                Decision::Render
            }
            AuthState::Unauthenticated => {
                debug!(path, redirect = Route::Login.path(), "No session token, redirecting");
                Decision::redirect_to_login()
            }
        }
    }

    /// Authentication state of the protected region, derived fresh.
    pub fn auth_state(&self) -> AuthState {
        match self.session_token() {
            Some(token) if !token.is_empty() => AuthState::Authenticated,
            _ => AuthState::Unauthenticated,
        }
    }

    /// Read the current router location, decide, and act on the decision.
    pub fn guard<N: Navigator>(&self, navigator: &mut N) -> Decision {
        let decision = self.evaluate(&navigator.current_path());
        match &decision {
            Decision::Render => navigator.render(),
            Decision::Redirect { to, replace } => navigator.redirect(to, *replace),
        }
        decision
    }

    /// Decrypted token candidate. Decryption failures are logged and
    /// reported as no token.
    fn session_token(&self) -> Option<String> {
        let stored = self.store.get(AUTH_TOKEN_KEY)?;
        match self.decrypt(&stored) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, "Failed to decrypt stored auth token");
                None
            }
        }
    }

    fn decrypt(&self, stored: &str) -> Result<String, CipherError> {
        let cipher = self.cipher.as_ref().ok_or(CipherError::NoSecretKey)?;
        cipher.decrypt(stored)
    }
}
