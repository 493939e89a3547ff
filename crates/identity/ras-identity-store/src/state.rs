//! One-time CSRF state tokens.

use crate::cleanup::ExpiredEntryCleanup;
use crate::error::StoreResult;
use crate::expiry::Clock;
use crate::map::ExpiringMap;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage for pending OAuth2 state tokens.
#[async_trait]
pub trait StateStore: ExpiredEntryCleanup {
    /// Stores `key` until `expires_at`, replacing any existing token with the same key.
    async fn save(&self, key: &str, expires_at: DateTime<Utc>) -> StoreResult<()>;

    /// Consumes `key` and reports whether it was present and unexpired.
    ///
    /// The token is removed whatever the outcome, so each token validates at most once.
    /// Unknown and expired tokens both yield `false`.
    async fn validate(&self, key: &str) -> StoreResult<bool>;
}

/// In-memory implementation of [`StateStore`]. Never returns an error.
pub struct InMemoryStateStore {
    tokens: ExpiringMap<()>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self {
            tokens: ExpiringMap::new(),
        }
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens: ExpiringMap::with_clock(clock),
        }
    }

    /// Number of stored tokens, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.tokens.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.tokens.is_empty().await
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn save(&self, key: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        if self.tokens.insert(key.to_string(), (), expires_at).await {
            warn!("State token key collision, previous token replaced");
        }
        Ok(())
    }

    async fn validate(&self, key: &str) -> StoreResult<bool> {
        let valid = self.tokens.take(key).await.is_some();
        if !valid {
            debug!("Rejected unknown or expired state token");
        }
        Ok(valid)
    }
}

#[async_trait]
impl ExpiredEntryCleanup for InMemoryStateStore {
    fn store_name(&self) -> &'static str {
        "state"
    }

    async fn cleanup(&self) -> StoreResult<usize> {
        Ok(self.tokens.purge_expired().await)
    }
}
