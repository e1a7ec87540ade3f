//! Encrypted token persistence
//!
//! Wraps the host's single token slot with encryption. The store is the
//! only component that touches the slot, and its read path is infallible:
//! any decrypt or parse failure reads as the empty token set, which callers
//! treat as "not connected".

use std::sync::Arc;

use tracing::{debug, warn};

use common::TokenSlot;

use crate::crypto::Crypto;
use crate::tokens::TokenSet;

/// Encrypt-then-store facade over the host's token slot.
pub struct TokenStore {
    slot: Arc<dyn TokenSlot>,
    crypto: Crypto,
}

impl TokenStore {
    pub fn new(slot: Arc<dyn TokenSlot>, crypto: Crypto) -> Self {
        Self { slot, crypto }
    }

    /// Serialize, encrypt, and write the token set.
    ///
    /// Returns false when serialization, encryption, or the write fails.
    /// A write the slot reports as failed still counts as success when a
    /// verifying re-read returns the intended ciphertext, since some hosts
    /// report idempotent writes as failures.
    pub fn save(&self, tokens: &TokenSet) -> bool {
        let json = match serde_json::to_vec(tokens) {
            Ok(j) => j,
            Err(e) => {
                warn!(error = %e, "failed to serialize token set");
                return false;
            }
        };
        let sealed = match self.crypto.encrypt(&json) {
            Some(s) => s,
            None => {
                warn!("failed to encrypt token set");
                return false;
            }
        };

        if self.slot.set(&sealed) {
            debug!("persisted token set");
            return true;
        }

        match self.slot.get() {
            Some(stored) if stored == sealed => {
                debug!("slot reported write failure but holds the intended value");
                true
            }
            _ => {
                warn!("token slot write failed");
                false
            }
        }
    }

    /// Read and decrypt the stored token set.
    ///
    /// Any failure (empty slot, undecryptable blob, malformed JSON) yields
    /// `TokenSet::default()`.
    pub fn get(&self) -> TokenSet {
        let Some(blob) = self.slot.get() else {
            return TokenSet::default();
        };
        let plaintext = self.crypto.decrypt(&blob);
        if plaintext.is_empty() {
            return TokenSet::default();
        }
        serde_json::from_slice(&plaintext).unwrap_or_default()
    }

    /// Delete the stored blob unconditionally.
    pub fn clear(&self) {
        self.slot.delete();
        debug!("cleared token store");
    }
}
