//! OAuth token acquisition and refresh
//!
//! Handles the two token endpoint interactions:
//! 1. Password grant (initial connect with tenant credentials)
//! 2. Refresh grant (rotating an expiring access token)
//!
//! Both POST form-urlencoded to the configured token endpoint and normalize
//! the response into a [`TokenSet`]. The endpoint and the optional
//! `client_id` header come from the host's settings store; expiry math uses
//! the injected clock so tests can pin time.

use std::sync::Arc;

use tracing::{debug, warn};

use common::{Clock, Secret, SettingsStore};

use crate::constants::{CLIENT_ID_SETTING, DEFAULT_TOKEN_ENDPOINT, HTTP_TIMEOUT, TOKEN_URL_SETTING};
use crate::error::{Error, Result};
use crate::tokens::TokenSet;

/// Client for the tenant's OAuth token endpoint.
pub struct OAuthClient {
    client: reqwest::Client,
    settings: Arc<dyn SettingsStore>,
    clock: Arc<dyn Clock>,
}

impl OAuthClient {
    pub fn new(
        client: reqwest::Client,
        settings: Arc<dyn SettingsStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            settings,
            clock,
        }
    }

    /// Exchange tenant credentials for a token set (password grant).
    pub async fn authenticate(&self, username: &str, password: &Secret<String>) -> Result<TokenSet> {
        debug!(username, "requesting tokens via password grant");
        self.token_request(&[
            ("grant_type", "password"),
            ("username", username),
            ("password", password.expose()),
        ])
        .await
    }

    /// Rotate tokens using a refresh token (refresh grant).
    ///
    /// Fails with `MissingClientId` before any network call: the refresh
    /// grant is rejected upstream without the client id header, so there is
    /// no point issuing the request.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet> {
        if self.client_id().is_none() {
            return Err(Error::MissingClientId);
        }
        debug!("requesting tokens via refresh grant");
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    /// POST a grant to the token endpoint and normalize the response.
    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenSet> {
        let url = self
            .settings
            .get(TOKEN_URL_SETTING)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_ENDPOINT.to_string());

        let mut request = self
            .client
            .post(&url)
            .timeout(HTTP_TIMEOUT)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(form);
        if let Some(client_id) = self.client_id() {
            request = request.header("client_id", client_id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::OAuthFailed(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            warn!(status = status.as_u16(), "token endpoint returned an error");
            return Err(Error::OAuthFailed(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::OAuthFailed(format!("invalid token response: {e}")))?;

        self.normalize(body)
    }

    /// Normalize a raw token endpoint body into a [`TokenSet`].
    ///
    /// `access_token` is required. `expires_at` is computed here, exactly
    /// once: `now + expires_in` when the delta is positive, otherwise 0.
    fn normalize(&self, body: serde_json::Value) -> Result<TokenSet> {
        let obj = body
            .as_object()
            .ok_or_else(|| Error::OAuthFailed("token endpoint returned a non-object body".into()))?;

        let access_token = str_field(obj, "access_token");
        if access_token.is_empty() {
            return Err(Error::OAuthMissingToken);
        }

        let now = self.clock.now();
        let expires_in = obj.get("expires_in").and_then(|v| v.as_u64()).unwrap_or(0);
        let expires_at = if expires_in > 0 { now + expires_in } else { 0 };

        let token_type = {
            let t = str_field(obj, "token_type");
            if t.is_empty() { "bearer".to_string() } else { t }
        };

        Ok(TokenSet {
            access_token,
            refresh_token: str_field(obj, "refresh_token"),
            token_type,
            expires_in,
            expires_at,
            scope: str_field(obj, "scope"),
            last_refresh_at: now,
        })
    }

    /// Configured `client_id` header value, if non-empty.
    fn client_id(&self) -> Option<String> {
        self.settings
            .get(CLIENT_ID_SETTING)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

fn str_field(obj: &serde_json::Map<String, serde_json::Value>, key: &str) -> String {
    obj.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::MemorySettings;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FixedClock(u64);

    impl Clock for FixedClock {
        fn now(&self) -> u64 {
            self.0
        }
    }

    fn client_for(server: &MockServer, client_id: Option<&str>, now: u64) -> OAuthClient {
        let mut settings =
            MemorySettings::new().with(TOKEN_URL_SETTING, &format!("{}/api/token", server.uri()));
        if let Some(id) = client_id {
            settings = settings.with(CLIENT_ID_SETTING, id);
        }
        OAuthClient::new(
            reqwest::Client::new(),
            Arc::new(settings),
            Arc::new(FixedClock(now)),
        )
    }

    #[tokio::test]
    async fn authenticate_normalizes_minimal_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(body_string_contains("grant_type=password"))
            .and(body_string_contains("username=admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "abc",
                "expires_in": 60,
            })))
            .mount(&server)
            .await;

        let oauth = client_for(&server, None, 1_000_000);
        let tokens = oauth
            .authenticate("admin", &Secret::new("pw".into()))
            .await
            .unwrap();

        assert_eq!(tokens.access_token, "abc");
        assert_eq!(tokens.expires_in, 60);
        assert_eq!(tokens.expires_at, 1_000_060);
        assert_eq!(tokens.refresh_token, "");
        assert_eq!(tokens.token_type, "bearer");
        assert_eq!(tokens.scope, "");
        assert_eq!(tokens.last_refresh_at, 1_000_000);
    }

    #[tokio::test]
    async fn zero_expires_in_yields_no_expiry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "abc",
            })))
            .mount(&server)
            .await;

        let oauth = client_for(&server, None, 1_000_000);
        let tokens = oauth
            .authenticate("admin", &Secret::new("pw".into()))
            .await
            .unwrap();
        assert_eq!(tokens.expires_in, 0);
        assert_eq!(tokens.expires_at, 0);
    }

    #[tokio::test]
    async fn server_token_type_and_scope_are_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "abc",
                "refresh_token": "rt",
                "token_type": "Bearer",
                "scope": "spaces.read",
                "expires_in": 3600,
            })))
            .mount(&server)
            .await;

        let oauth = client_for(&server, None, 500);
        let tokens = oauth
            .authenticate("admin", &Secret::new("pw".into()))
            .await
            .unwrap();
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.scope, "spaces.read");
        assert_eq!(tokens.refresh_token, "rt");
    }

    #[tokio::test]
    async fn non_success_status_is_oauth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": "invalid_grant"})),
            )
            .mount(&server)
            .await;

        let oauth = client_for(&server, None, 0);
        let err = oauth
            .authenticate("admin", &Secret::new("bad".into()))
            .await
            .unwrap_err();
        match err {
            Error::OAuthFailed(detail) => {
                assert!(detail.contains("400"), "detail should carry status: {detail}")
            }
            other => panic!("expected OAuthFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_access_token_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "refresh_token": "rt_only",
            })))
            .mount(&server)
            .await;

        let oauth = client_for(&server, None, 0);
        let err = oauth
            .authenticate("admin", &Secret::new("pw".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OAuthMissingToken));
    }

    #[tokio::test]
    async fn non_object_body_is_oauth_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(["nope"])))
            .mount(&server)
            .await;

        let oauth = client_for(&server, None, 0);
        let err = oauth
            .authenticate("admin", &Secret::new("pw".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OAuthFailed(_)));
    }

    #[tokio::test]
    async fn refresh_without_client_id_fails_before_network() {
        // No server at all: the check must short-circuit before any request
        let settings = MemorySettings::new().with(TOKEN_URL_SETTING, "http://127.0.0.1:1");
        let oauth = OAuthClient::new(
            reqwest::Client::new(),
            Arc::new(settings),
            Arc::new(FixedClock(0)),
        );
        let err = oauth.refresh("rt").await.unwrap_err();
        assert!(matches!(err, Error::MissingClientId));
    }

    #[tokio::test]
    async fn refresh_sends_client_id_header_and_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .and(header("client_id", "tenant-client"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=rt_old"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at_new",
                "refresh_token": "rt_new",
                "expires_in": 1800,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let oauth = client_for(&server, Some("tenant-client"), 2_000);
        let tokens = oauth.refresh("rt_old").await.unwrap();
        assert_eq!(tokens.access_token, "at_new");
        assert_eq!(tokens.refresh_token, "rt_new");
        assert_eq!(tokens.expires_at, 3_800);
    }

    #[tokio::test]
    async fn blank_token_url_setting_falls_back_to_default() {
        // A whitespace-only override must not shadow the platform default
        let settings = MemorySettings::new().with(TOKEN_URL_SETTING, "   ");
        let oauth = OAuthClient::new(
            reqwest::Client::new(),
            Arc::new(settings),
            Arc::new(FixedClock(0)),
        );
        // The default endpoint is unreachable from tests; just assert the
        // request is attempted (transport error, not a config panic).
        let err = oauth
            .authenticate("admin", &Secret::new("pw".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::OAuthFailed(_)));
    }
}
