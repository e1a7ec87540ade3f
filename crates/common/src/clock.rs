//! Time source abstraction
//!
//! Token expiry math (`expires_at = now + expires_in`) needs a controllable
//! time source in tests. Production code injects `SystemClock`.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current unix time in whole seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

/// Wall-clock time from the OS.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
