//! Host-collaborator storage seams
//!
//! The connector does not own durable storage. The host supplies three
//! collaborators: a read-only settings lookup, a single named slot for the
//! encrypted token blob, and a TTL string cache. In-memory implementations
//! are provided for tests and embedders without persistence needs.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Read-only key/value settings supplied by the host.
pub trait SettingsStore: Send + Sync {
    /// Look up a setting. `None` when unset; empty strings are returned as-is.
    fn get(&self, key: &str) -> Option<String>;
}

/// The single persistent slot holding the encrypted token blob.
pub trait TokenSlot: Send + Sync {
    fn get(&self) -> Option<String>;
    /// Returns false when the write failed. Callers may verify with a re-read.
    fn set(&self, value: &str) -> bool;
    fn delete(&self);
}

/// TTL string cache. `get` must return `None` once the entry's TTL has lapsed.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str, ttl: Duration);
    fn delete(&self, key: &str);
}

/// HashMap-backed settings for tests and embedders.
#[derive(Default)]
pub struct MemorySettings {
    values: HashMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// In-memory token slot.
#[derive(Default)]
pub struct MemorySlot {
    value: Mutex<Option<String>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenSlot for MemorySlot {
    fn get(&self) -> Option<String> {
        self.value.lock().ok().and_then(|v| v.clone())
    }

    fn set(&self, value: &str) -> bool {
        match self.value.lock() {
            Ok(mut slot) => {
                *slot = Some(value.to_string());
                true
            }
            Err(_) => false,
        }
    }

    fn delete(&self) {
        if let Ok(mut slot) = self.value.lock() {
            *slot = None;
        }
    }
}

/// In-memory TTL cache keyed by deadline.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        let (value, deadline) = entries.get(key)?;
        if Instant::now() >= *deadline {
            return None;
        }
        Some(value.clone())
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        }
    }

    fn delete(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_settings_returns_stored_values() {
        let settings = MemorySettings::new().with("tenant_base_url", "https://x.example");
        assert_eq!(
            settings.get("tenant_base_url").as_deref(),
            Some("https://x.example")
        );
        assert!(settings.get("missing").is_none());
    }

    #[test]
    fn memory_slot_roundtrip_and_delete() {
        let slot = MemorySlot::new();
        assert!(slot.get().is_none());

        assert!(slot.set("blob"));
        assert_eq!(slot.get().as_deref(), Some("blob"));

        slot.delete();
        assert!(slot.get().is_none());
    }

    #[test]
    fn memory_cache_honors_ttl() {
        let cache = MemoryCache::new();
        cache.set("k", "v", Duration::from_secs(60));
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        // Zero TTL expires immediately
        cache.set("gone", "v", Duration::from_secs(0));
        assert!(cache.get("gone").is_none());
    }

    #[test]
    fn memory_cache_delete_is_idempotent() {
        let cache = MemoryCache::new();
        cache.set("k", "v", Duration::from_secs(60));
        cache.delete("k");
        cache.delete("k");
        assert!(cache.get("k").is_none());
    }
}
