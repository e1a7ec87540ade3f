//! Connection lifecycle management
//!
//! The manager owns the stored token set: connect persists a fresh set,
//! disconnect clears it, and refresh rotates it under a single-flight lock
//! so concurrent callers converge on one network refresh and one write.
//!
//! Reading the access token never refreshes. An expired token is returned
//! verbatim; rotation happens reactively (the API client's 401/403 retry)
//! or explicitly via [`TokenManager::refresh_tokens`].

use tokio::sync::Mutex;
use tracing::{info, warn};

use common::Secret;

use crate::error::{Error, Result};
use crate::oauth::OAuthClient;
use crate::store::TokenStore;
use crate::tokens::{ConnectionStatus, TokenSet};

/// Sole mutator of the stored token set.
pub struct TokenManager {
    store: TokenStore,
    oauth: OAuthClient,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(store: TokenStore, oauth: OAuthClient) -> Self {
        Self {
            store,
            oauth,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Authenticate with tenant credentials and persist the token set.
    ///
    /// Authentication success with a failed write is `TokenSaveFailed`:
    /// the connection is only established once the tokens are stored.
    pub async fn connect(&self, username: &str, password: &Secret<String>) -> Result<TokenSet> {
        let tokens = self.oauth.authenticate(username, password).await?;
        if !self.store.save(&tokens) {
            return Err(Error::TokenSaveFailed);
        }
        info!(expires_at = tokens.expires_at, "connected");
        Ok(tokens)
    }

    /// Clear the stored token set. Idempotent.
    pub fn disconnect(&self) {
        self.store.clear();
        info!("disconnected");
    }

    /// The stored access token, verbatim.
    ///
    /// Expiry is deliberately not checked here; an expired token is
    /// returned unchanged and the upstream 401 drives the refresh.
    pub fn get_access_token(&self) -> Result<String> {
        let tokens = self.store.get();
        if !tokens.is_connected() {
            return Err(Error::NotConnected);
        }
        Ok(tokens.access_token)
    }

    /// Rotate the stored token set via the refresh grant.
    ///
    /// Runs under a single-flight lock: a caller that waited while another
    /// flight refreshed gets the freshly stored set without a second
    /// network call. A failed refresh always disconnects, forcing explicit
    /// re-authentication. A successful refresh whose write fails keeps the
    /// connection (the token is valid, only storage is degraded) and
    /// reports `TokenSaveFailed`.
    pub async fn refresh_tokens(&self) -> Result<TokenSet> {
        let snapshot = self.store.get();
        let _guard = self.refresh_lock.lock().await;

        let current = self.store.get();
        if current.is_connected() && current.access_token != snapshot.access_token {
            // Another flight already rotated while we waited for the lock
            return Ok(current);
        }

        if current.refresh_token.is_empty() {
            self.store.clear();
            warn!("refresh requested with no refresh token on record");
            return Err(Error::MissingRefreshToken);
        }

        let mut refreshed = match self.oauth.refresh(&current.refresh_token).await {
            Ok(t) => t,
            Err(e) => {
                self.store.clear();
                warn!(error = %e, "token refresh failed, disconnecting");
                return Err(Error::RefreshFailed(e.to_string()));
            }
        };

        // Endpoints that don't rotate refresh tokens omit the field;
        // carry the prior one forward so the next refresh still works
        if refreshed.refresh_token.is_empty() {
            refreshed.refresh_token = current.refresh_token;
        }

        if !self.store.save(&refreshed) {
            warn!("refreshed tokens could not be persisted");
            return Err(Error::TokenSaveFailed);
        }

        info!(expires_at = refreshed.expires_at, "tokens refreshed");
        Ok(refreshed)
    }

    /// Connection state derived from the stored set. Never fails.
    pub fn get_status(&self) -> ConnectionStatus {
        let tokens = self.store.get();
        ConnectionStatus {
            connected: tokens.is_connected(),
            expires_at: tokens.expires_at,
            last_refresh_at: tokens.last_refresh_at,
        }
    }
}
