//! Random identifiers for state tokens and sessions.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, thread_rng};
use uuid::Uuid;

const SESSION_ID_BYTES: usize = 32;

/// A fresh state token for one authorization redirect.
pub fn generate_state_token() -> String {
    Uuid::new_v4().to_string()
}

/// A fresh, unguessable session identifier (256 random bits, URL-safe).
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
