//! Core library for staffdesk, an HR administration dashboard.
//!
//! Holds the route access guard that gates every protected view, together
//! with the pieces it is built from: the token cipher, credential stores,
//! the router model, and configuration.

pub mod auth;
pub mod config;
pub mod router;

pub use auth::{AuthState, CredentialStore, RouteGuard, SessionManager, TokenCipher};
pub use config::{Config, SecretKey, StoreBackend};
pub use router::{Decision, MemoryHistory, NavigationRequest, Navigator, Route};
