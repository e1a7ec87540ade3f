//! Tenant endpoint defaults and setting keys
//!
//! Paths for the hosted Nexudus layout; tenants with custom routing
//! override them through the settings store.

use std::time::Duration;

/// Settings key for the tenant API base URL
pub const BASE_URL_SETTING: &str = "tenant_base_url";

/// Settings key for the memberships listing path override
pub const MEMBERSHIPS_ENDPOINT_SETTING: &str = "memberships_endpoint";

/// Settings key for the room bookings listing path override
pub const ROOMS_ENDPOINT_SETTING: &str = "rooms_endpoint";

/// Settings key for the product cache TTL in seconds
pub const CACHE_TTL_SETTING: &str = "cache_ttl";

/// Settings key for the connection probe path override
pub const TEST_PATH_SETTING: &str = "connection_test_path";

/// Default memberships listing path
pub const DEFAULT_MEMBERSHIPS_PATH: &str = "/spaces/memberships";

/// Default room bookings listing path
pub const DEFAULT_ROOMS_PATH: &str = "/spaces/rooms";

/// Default connection probe path
pub const DEFAULT_TEST_PATH: &str = "/";

/// Default product cache TTL: one day
pub const DEFAULT_CACHE_TTL: u64 = 86_400;

/// Per-request timeout for tenant API calls
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

/// Canonical form of the tenant base URL: whitespace trimmed, trailing
/// slashes removed. Empty output means unconfigured.
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_whitespace_and_trailing_slashes() {
        assert_eq!(
            normalize_base_url("  https://t.example/api// "),
            "https://t.example/api"
        );
        assert_eq!(normalize_base_url("https://t.example"), "https://t.example");
    }

    #[test]
    fn normalize_of_blank_is_empty() {
        assert_eq!(normalize_base_url("   "), "");
        assert_eq!(normalize_base_url(""), "");
    }
}
