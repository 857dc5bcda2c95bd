//! Authentication module guarding the dashboard's protected views.
//!
//! This module provides:
//! - `RouteGuard`: per-navigation render/redirect decision
//! - `TokenCipher`: XChaCha20-Poly1305 sealing of the session token
//! - `CredentialStore`: persistent storage (memory, JSON file, OS keychain)
//! - `SessionManager`: sign-in / sign-out, the only writer of the token
//!
//! The stored token is always ciphertext. Anything that fails to decrypt,
//! or decrypts to an empty string, counts as signed out.

pub mod cipher;
pub mod credentials;
pub mod error;
pub mod guard;
pub mod session;

pub use cipher::TokenCipher;
pub use credentials::{CredentialStore, FileStore, KeyringStore, MemoryStore};
pub use error::{CipherError, SessionError, StoreError};
pub use guard::{is_public_path, AuthState, RouteGuard, AUTH_TOKEN_KEY, PUBLIC_PATHS};
pub use session::SessionManager;
