//! OAuth2 login flow backed by one-time state tokens and expiring sessions.
//!
//! [`LoginFlow`] drives the Authorization Code flow against a single provider. It issues a
//! state token before redirecting, consumes it on the callback, exchanges the code, fetches
//! user info and records a [`Session`]. Both records live in the stores from
//! `ras-identity-store`, which are injected so that networked backends can replace the
//! in-memory ones.

mod client;
mod config;
mod error;
mod flow;
mod token;
mod types;


pub use client::OAuth2Client;
pub use config::{OAuth2Config, OAuth2ProviderConfig};
pub use error::{OAuth2Error, OAuth2Result};
pub use flow::{CleanupTasks, LoginFlow, LoginRedirect};
pub use token::{generate_session_id, generate_state_token};
pub use types::{AuthorizationResponse, TokenResponse, UserInfoResponse};

// Re-export the store layer for convenience
pub use ras_identity_store::{
    Clock, InMemorySessionStore, InMemoryStateStore, ManualClock, Session, SessionStore,
    StateStore, StoreConfig, StoreError, SystemClock,
};
