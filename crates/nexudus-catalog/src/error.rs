//! Error types for catalog API operations

/// Errors from catalog fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("tenant base URL is not configured")]
    MissingBaseUrl,

    #[error("upstream returned HTTP {status}")]
    Http { status: u16 },

    #[error("upstream body is not a JSON object or array")]
    InvalidJson,

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Auth(#[from] nexudus_auth::Error),
}

/// Result alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;
