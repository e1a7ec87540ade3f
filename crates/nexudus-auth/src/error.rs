//! Error types for OAuth and token lifecycle operations

/// Errors from authentication and token lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("OAuth client id is not configured")]
    MissingClientId,

    #[error("OAuth request failed: {0}")]
    OAuthFailed(String),

    #[error("token endpoint response contained no access token")]
    OAuthMissingToken,

    #[error("not connected: no access token on record")]
    NotConnected,

    #[error("no refresh token on record")]
    MissingRefreshToken,

    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("failed to persist tokens")]
    TokenSaveFailed,
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
