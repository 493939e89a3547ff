//! Key to (value, expiry) map shared by the in-memory stores.

use crate::expiry::{Clock, SystemClock, is_expired_at};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

/// A string-keyed map whose entries carry an absolute expiry instant.
///
/// All access goes through one interior `RwLock`. Lookups share the read lock and never
/// delete; expired entries simply read as absent until [`ExpiringMap::purge_expired`] or a
/// removing operation drops them.
pub struct ExpiringMap<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V> ExpiringMap<V> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Inserts or replaces the entry for `key`. Returns true if an entry was replaced.
    pub async fn insert(&self, key: String, value: V, expires_at: DateTime<Utc>) -> bool {
        let mut entries = self.entries.write().await;
        entries
            .insert(key, Entry { value, expires_at })
            .is_some()
    }

    /// Removes the entry for `key` and returns its value only if it had not expired.
    ///
    /// The entry is removed either way, and the removal happens under the write lock, so
    /// of any number of concurrent callers at most one receives the value.
    pub async fn take(&self, key: &str) -> Option<V> {
        let entry = {
            let mut entries = self.entries.write().await;
            entries.remove(key)?
        };

        if is_expired_at(entry.expires_at, self.clock.now()) {
            None
        } else {
            Some(entry.value)
        }
    }

    /// Removes the entry for `key`. Returns true if one was present.
    pub async fn remove(&self, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries.remove(key).is_some()
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let now = self.clock.now();
        let before = entries.len();

        entries.retain(|_, entry| !is_expired_at(entry.expires_at, now));

        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl<V: Clone> ExpiringMap<V> {
    /// Returns a copy of the value for `key` unless it is missing or expired.
    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;

        if is_expired_at(entry.expires_at, self.clock.now()) {
            None
        } else {
            Some(entry.value.clone())
        }
    }
}

impl<V> Default for ExpiringMap<V> {
    fn default() -> Self {
        Self::new()
    }
}
