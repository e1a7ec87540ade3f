//! File-backed token slot and product cache
//!
//! One JSON state file holds the encrypted token blob and the cache
//! entries. All writes use atomic temp-file + rename to prevent
//! corruption on crash, with 0600 permissions since the file carries
//! the token ciphertext.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use common::{Cache, Clock, TokenSlot};

#[derive(Debug, Default, Serialize, Deserialize)]
struct State {
    #[serde(default)]
    token_blob: Option<String>,
    #[serde(default)]
    cache: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    value: String,
    expires_at: u64,
}

/// Single-file state store serving both the token slot and the cache.
pub struct FileStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl FileStore {
    /// Open the state file, creating an empty one when absent.
    pub fn open(path: PathBuf, clock: Arc<dyn Clock>) -> common::Result<Arc<Self>> {
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let state: State = serde_json::from_str(&contents)
                .map_err(|e| common::Error::Config(format!("parsing state file: {e}")))?;
            info!(path = %path.display(), cached = state.cache.len(), "loaded state");
            state
        } else {
            info!(path = %path.display(), "state file not found, starting empty");
            let state = State::default();
            write_atomic(&path, &state)?;
            state
        };

        Ok(Arc::new(Self {
            path,
            clock,
            state: Mutex::new(state),
        }))
    }

    fn persist(&self, state: &State) -> common::Result<()> {
        write_atomic(&self.path, state)
    }
}

impl TokenSlot for FileStore {
    fn get(&self) -> Option<String> {
        let state = match self.state.lock() {
            Ok(s) => s,
            Err(_) => return None,
        };
        state.token_blob.clone()
    }

    fn set(&self, value: &str) -> bool {
        let mut state = match self.state.lock() {
            Ok(s) => s,
            Err(_) => return false,
        };
        state.token_blob = Some(value.to_string());
        match self.persist(&state) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to persist token blob");
                false
            }
        }
    }

    fn delete(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.token_blob = None;
            if let Err(e) = self.persist(&state) {
                warn!(error = %e, "failed to persist token deletion");
            }
        }
    }
}

impl Cache for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let state = self.state.lock().ok()?;
        let entry = state.cache.get(key)?;
        if self.clock.now() >= entry.expires_at {
            return None;
        }
        Some(entry.value.clone())
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.cache.insert(
                key.to_string(),
                CacheEntry {
                    value: value.to_string(),
                    expires_at: self.clock.now().saturating_add(ttl.as_secs()),
                },
            );
            if let Err(e) = self.persist(&state) {
                warn!(key, error = %e, "failed to persist cache entry");
            }
        }
    }

    fn delete(&self, key: &str) {
        if let Ok(mut state) = self.state.lock() {
            if state.cache.remove(key).is_some() {
                if let Err(e) = self.persist(&state) {
                    warn!(key, error = %e, "failed to persist cache deletion");
                }
            }
        }
    }
}

/// Write the state to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. File permissions are set to 0600 (owner read/write only).
fn write_atomic(path: &Path, state: &State) -> common::Result<()> {
    let json = serde_json::to_string_pretty(state)
        .map_err(|e| common::Error::Config(format!("serializing state: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| common::Error::Config("state path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".state.tmp.{}", std::process::id()));

    std::fs::write(&tmp_path, json.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)?;

    debug!(path = %path.display(), "persisted state");
    Ok(())
}
