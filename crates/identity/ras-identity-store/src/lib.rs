//! Expiring state and session stores for OAuth2 login flows.
//!
//! This crate holds the two time-bounded records an OAuth2 login needs:
//!
//! - one-time CSRF state tokens, issued before redirecting to the provider and consumed
//!   on the callback ([`StateStore`])
//! - authenticated sessions, created after a successful callback and read until they
//!   expire or are deleted ([`SessionStore`])
//!
//! Both stores treat expired entries as absent on read and can be swept periodically with
//! [`start_cleanup`]. The in-memory implementations never fail; the `StoreResult` return
//! types exist for networked backends implementing the same traits.

mod cleanup;
mod config;
mod error;
mod expiry;
mod map;
mod session;
mod state;


pub use cleanup::{CleanupHandle, ExpiredEntryCleanup, start_cleanup};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use expiry::{Clock, ManualClock, SystemClock, expiry_after, is_expired_at};
pub use map::ExpiringMap;
pub use session::{InMemorySessionStore, Session, SessionStore};
pub use state::{InMemoryStateStore, StateStore};
