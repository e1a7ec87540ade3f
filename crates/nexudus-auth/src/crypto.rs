//! Token blob encryption at rest
//!
//! Token sets are serialized to JSON and sealed with an AEAD before they
//! reach the host's storage slot. The payload is self-describing: a JSON
//! envelope records the algorithm and its parameters, each binary field
//! base64-encoded, and the whole envelope base64-encoded once more so the
//! stored value is always storage-safe ASCII.
//!
//! Decryption dispatches on the envelope's recorded algorithm, so payloads
//! written under either algorithm stay readable regardless of which one is
//! currently configured for writes.

use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use common::Secret;

const XCHACHA_ALGO: &str = "xchacha20-poly1305";
const AES_GCM_ALGO: &str = "aes-256-gcm";

/// GCM authentication tag length; stored as a separate envelope field
const GCM_TAG_LEN: usize = 16;

/// AEAD used for newly written payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    XChaCha20Poly1305,
    Aes256Gcm,
}

/// Self-describing encrypted payload. `nonce` is the XChaCha field, `iv` +
/// `tag` are the GCM fields; the unused ones are omitted from the JSON.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    algo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
    ct: String,
}

/// Symmetric encryption keyed off the host's site secret.
///
/// The key is SHA-256 of the secret, shared by both algorithms. Losing the
/// secret makes every stored payload undecryptable; reads then yield empty
/// and callers see a disconnected state rather than an error.
#[derive(Clone)]
pub struct Crypto {
    key: [u8; 32],
    algorithm: Algorithm,
}

impl Crypto {
    /// Derive the AEAD key from the site secret. Writes default to
    /// XChaCha20-Poly1305.
    pub fn new(key_material: &Secret<String>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(key_material.expose().as_bytes());
        Self {
            key: hasher.finalize().into(),
            algorithm: Algorithm::XChaCha20Poly1305,
        }
    }

    /// Select the algorithm used for new payloads.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Seal plaintext into a storage-safe string.
    ///
    /// `None` only when the AEAD call itself fails; envelope serialization
    /// of the fixed struct cannot fail in practice.
    pub fn encrypt(&self, plaintext: &[u8]) -> Option<String> {
        let envelope = match self.algorithm {
            Algorithm::XChaCha20Poly1305 => self.encrypt_xchacha(plaintext)?,
            Algorithm::Aes256Gcm => self.encrypt_aes_gcm(plaintext)?,
        };
        let json = serde_json::to_vec(&envelope).ok()?;
        Some(BASE64.encode(json))
    }

    /// Open a stored payload. Returns the empty vector on ANY failure:
    /// bad base64, malformed envelope, unknown algorithm, wrong key,
    /// truncated fields. Store reads must stay infallible.
    pub fn decrypt(&self, payload: &str) -> Vec<u8> {
        self.try_decrypt(payload).unwrap_or_default()
    }

    fn try_decrypt(&self, payload: &str) -> Option<Vec<u8>> {
        let json = BASE64.decode(payload.trim()).ok()?;
        let envelope: Envelope = serde_json::from_slice(&json).ok()?;
        match envelope.algo.as_str() {
            XCHACHA_ALGO => self.decrypt_xchacha(&envelope),
            AES_GCM_ALGO => self.decrypt_aes_gcm(&envelope),
            _ => None,
        }
    }

    fn encrypt_xchacha(&self, plaintext: &[u8]) -> Option<Envelope> {
        let cipher = XChaCha20Poly1305::new_from_slice(&self.key).ok()?;
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ct = cipher.encrypt(&nonce, plaintext).ok()?;
        Some(Envelope {
            algo: XCHACHA_ALGO.into(),
            nonce: Some(BASE64.encode(nonce)),
            iv: None,
            tag: None,
            ct: BASE64.encode(ct),
        })
    }

    fn decrypt_xchacha(&self, envelope: &Envelope) -> Option<Vec<u8>> {
        let nonce = BASE64.decode(envelope.nonce.as_deref()?).ok()?;
        let nonce: [u8; 24] = nonce.as_slice().try_into().ok()?;
        let ct = BASE64.decode(&envelope.ct).ok()?;
        let cipher = XChaCha20Poly1305::new_from_slice(&self.key).ok()?;
        cipher.decrypt(&XNonce::from(nonce), ct.as_ref()).ok()
    }

    fn encrypt_aes_gcm(&self, plaintext: &[u8]) -> Option<Envelope> {
        let cipher = Aes256Gcm::new_from_slice(&self.key).ok()?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut ct = cipher.encrypt(&nonce, plaintext).ok()?;
        if ct.len() < GCM_TAG_LEN {
            return None;
        }
        let tag = ct.split_off(ct.len() - GCM_TAG_LEN);
        Some(Envelope {
            algo: AES_GCM_ALGO.into(),
            nonce: None,
            iv: Some(BASE64.encode(nonce)),
            tag: Some(BASE64.encode(tag)),
            ct: BASE64.encode(ct),
        })
    }

    fn decrypt_aes_gcm(&self, envelope: &Envelope) -> Option<Vec<u8>> {
        let iv = BASE64.decode(envelope.iv.as_deref()?).ok()?;
        let iv: [u8; 12] = iv.as_slice().try_into().ok()?;
        let tag = BASE64.decode(envelope.tag.as_deref()?).ok()?;
        let mut ct = BASE64.decode(&envelope.ct).ok()?;
        // The aead crate expects ciphertext || tag as one buffer
        ct.extend_from_slice(&tag);
        let cipher = Aes256Gcm::new_from_slice(&self.key).ok()?;
        cipher.decrypt(&Nonce::from(iv), ct.as_ref()).ok()
    }
}
