//! Session key hashing.
//!
//! Raw session ids are bearer tokens; only their digest is stored.

use sha2::{Digest, Sha256};

/// Compute the storage key for a session id.
pub fn session_key(session_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"stackpager-session\n");
    hasher.update(session_id.as_bytes());
    hex::encode(hasher.finalize())
}
