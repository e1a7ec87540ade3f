//! Authenticated tenant API client
//!
//! Thin GET client over the tenant base URL. Every request carries the
//! stored bearer token; a 401 or 403 triggers exactly one token refresh
//! followed by exactly one retry, and a second rejection surfaces as a
//! plain HTTP error.

use std::sync::Arc;

use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, warn};

use common::SettingsStore;
use nexudus_auth::TokenManager;

use crate::endpoints::{normalize_base_url, BASE_URL_SETTING, DEFAULT_TEST_PATH, HTTP_TIMEOUT, TEST_PATH_SETTING};
use crate::error::{Error, Result};

/// Bearer-authenticated GET client for one tenant.
pub struct ApiClient {
    client: reqwest::Client,
    settings: Arc<dyn SettingsStore>,
    tokens: Arc<TokenManager>,
}

impl ApiClient {
    pub fn new(
        client: reqwest::Client,
        settings: Arc<dyn SettingsStore>,
        tokens: Arc<TokenManager>,
    ) -> Self {
        Self {
            client,
            settings,
            tokens,
        }
    }

    /// GET `path` under the tenant base URL and return the parsed body.
    ///
    /// The body must be a JSON object or array; anything else is
    /// `InvalidJson`. On 401/403 the token set is refreshed once and the
    /// request re-sent once with the new token. A refresh failure
    /// propagates the auth error, which has already disconnected the
    /// token store.
    pub async fn request(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let base = self.base_url()?;
        let url = format!("{}/{}", base, path.trim_start_matches('/'));

        let token = self.tokens.get_access_token()?;
        let response = self.send(&url, query, &token).await?;

        let response = if matches!(response.status().as_u16(), 401 | 403) {
            let status = response.status().as_u16();
            debug!(status, url = %url, "token rejected, refreshing");
            let refreshed = self.tokens.refresh_tokens().await?;
            self.send(&url, query, &refreshed.access_token).await?
        } else {
            response
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %url, "upstream request failed");
            return Err(Error::Http {
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await.map_err(|_| Error::InvalidJson)?;
        match body {
            Value::Object(_) | Value::Array(_) => Ok(body),
            _ => Err(Error::InvalidJson),
        }
    }

    /// Probe the tenant API with an authenticated GET against the
    /// configured test path. Success means the connection is usable.
    pub async fn test_connection(&self) -> Result<()> {
        let path = self
            .settings
            .get(TEST_PATH_SETTING)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_TEST_PATH.to_string());
        self.request(&path, &[]).await.map(|_| ())
    }

    fn base_url(&self) -> Result<String> {
        let raw = self.settings.get(BASE_URL_SETTING).unwrap_or_default();
        let base = normalize_base_url(&raw);
        if base.is_empty() {
            return Err(Error::MissingBaseUrl);
        }
        Ok(base)
    }

    async fn send(
        &self,
        url: &str,
        query: &[(&str, String)],
        token: &str,
    ) -> Result<reqwest::Response> {
        self.client
            .get(url)
            .query(query)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .timeout(HTTP_TIMEOUT)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))
    }
}
