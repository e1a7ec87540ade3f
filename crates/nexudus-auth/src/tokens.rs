//! Token set and connection status types

use serde::{Deserialize, Serialize};

/// A normalized OAuth token set.
///
/// `expires_in` is the delta in seconds as reported by the token endpoint;
/// `expires_at` is the absolute unix timestamp computed exactly once at
/// normalization time (0 when no expiry is known). The default value is the
/// "empty" sentinel: an empty `access_token` means not connected.
///
/// Every field carries a serde default so a partial stored blob from an
/// earlier version still deserializes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSet {
    pub access_token: String,
    /// Empty is allowed; absence blocks the refresh grant
    pub refresh_token: String,
    pub token_type: String,
    /// Seconds until expiry as reported by the server (delta, not absolute)
    pub expires_in: u64,
    /// Absolute unix timestamp in seconds, 0 = no expiry known
    pub expires_at: u64,
    pub scope: String,
    /// Unix timestamp of the last successful authenticate or refresh
    pub last_refresh_at: u64,
}

impl TokenSet {
    /// Whether this set represents an established connection.
    pub fn is_connected(&self) -> bool {
        !self.access_token.is_empty()
    }
}

/// Connection state derived from the stored token set. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub expires_at: u64,
    pub last_refresh_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_connected() {
        let tokens = TokenSet::default();
        assert!(!tokens.is_connected());
        assert_eq!(tokens.token_type, "");
        assert_eq!(tokens.expires_at, 0);
    }

    #[test]
    fn partial_blob_deserializes_with_defaults() {
        let json = r#"{"access_token":"at_abc","refresh_token":"rt_def"}"#;
        let tokens: TokenSet = serde_json::from_str(json).unwrap();
        assert_eq!(tokens.access_token, "at_abc");
        assert_eq!(tokens.refresh_token, "rt_def");
        assert_eq!(tokens.expires_in, 0);
        assert_eq!(tokens.last_refresh_at, 0);
        assert!(tokens.is_connected());
    }

    #[test]
    fn serializes_all_fields() {
        let tokens = TokenSet {
            access_token: "at_test".into(),
            refresh_token: "rt_test".into(),
            token_type: "bearer".into(),
            expires_in: 3600,
            expires_at: 1_735_500_000,
            scope: "read".into(),
            last_refresh_at: 1_735_496_400,
        };
        let json = serde_json::to_string(&tokens).unwrap();
        assert!(json.contains("\"access_token\":\"at_test\""));
        assert!(json.contains("\"expires_at\":1735500000"));
        assert!(json.contains("\"last_refresh_at\":1735496400"));
    }
}
