//! Nexudus OAuth constants and setting keys
//!
//! Endpoint defaults for the hosted Nexudus platform. Tenants on custom
//! domains override these through the settings store. The actual secrets
//! (access/refresh tokens) are managed by the token store.

use std::time::Duration;

/// Default token endpoint for hosted Nexudus tenants
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://spaces.nexudus.com/api/token";

/// Settings key for the token endpoint override
pub const TOKEN_URL_SETTING: &str = "oauth_token_url";

/// Settings key for the optional `client_id` header value.
/// Required for the refresh grant; optional for the password grant.
pub const CLIENT_ID_SETTING: &str = "oauth_client_id_header";

/// Per-request timeout for token endpoint calls
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(20);
