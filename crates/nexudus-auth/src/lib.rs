//! Nexudus OAuth credential lifecycle
//!
//! Token acquisition, refresh, and encrypted storage for a single Nexudus
//! tenant. This crate is a standalone library with no dependency on any
//! host binary: the host supplies a settings store and a token slot and
//! gets a managed connection back.
//!
//! Credential flow:
//! 1. Host calls `TokenManager::connect()` with tenant credentials
//! 2. `OAuthClient::authenticate()` runs the password grant and normalizes
//! 3. `TokenStore::save()` encrypts the set and writes the host's slot
//! 4. API calls read the token via `TokenManager::get_access_token()`
//! 5. On upstream 401/403 the API client calls `refresh_tokens()`
//! 6. A rejected refresh disconnects, forcing explicit re-authentication

pub mod constants;
pub mod crypto;
pub mod error;
pub mod manager;
pub mod oauth;
pub mod store;
pub mod tokens;

pub use constants::*;
pub use crypto::{Algorithm, Crypto};
pub use error::{Error, Result};
pub use manager::TokenManager;
pub use oauth::OAuthClient;
pub use store::TokenStore;
pub use tokens::{ConnectionStatus, TokenSet};
