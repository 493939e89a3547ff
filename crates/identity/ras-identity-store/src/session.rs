//! Authenticated sessions.

use crate::cleanup::ExpiredEntryCleanup;
use crate::error::StoreResult;
use crate::expiry::{Clock, expiry_after, is_expired_at};
use crate::map::ExpiringMap;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// An authenticated user session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    /// Profile fields supplied by the identity provider.
    pub attributes: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, ttl: Duration) -> Self {
        Self::new_at(id, user_id, Utc::now(), ttl)
    }

    /// Creates a session starting at `created_at`, typically the store clock's `now()`.
    ///
    /// A `ttl` reaching past the representable range expires at the latest instant.
    pub fn new_at(
        id: impl Into<String>,
        user_id: impl Into<String>,
        created_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            attributes: HashMap::new(),
            created_at,
            expires_at: expiry_after(created_at, ttl),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        is_expired_at(self.expires_at, now)
    }
}

/// Storage for authenticated sessions.
#[async_trait]
pub trait SessionStore: ExpiredEntryCleanup {
    /// Stores `session` under `session.id`, replacing any previous value.
    async fn save(&self, session: Session) -> StoreResult<()>;

    /// Returns the session for `key` unless it is missing or expired.
    async fn get(&self, key: &str) -> StoreResult<Option<Session>>;

    /// Removes the session for `key`. Removing a missing session is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;
}

/// In-memory implementation of [`SessionStore`]. Never returns an error.
pub struct InMemorySessionStore {
    sessions: ExpiringMap<Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: ExpiringMap::new(),
        }
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: ExpiringMap::with_clock(clock),
        }
    }

    /// Number of stored sessions, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.sessions.len().await
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.is_empty().await
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: Session) -> StoreResult<()> {
        let expires_at = session.expires_at;
        self.sessions
            .insert(session.id.clone(), session, expires_at)
            .await;
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Session>> {
        Ok(self.sessions.get(key).await)
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        if !self.sessions.remove(key).await {
            debug!("Delete requested for unknown session");
        }
        Ok(())
    }
}

#[async_trait]
impl ExpiredEntryCleanup for InMemorySessionStore {
    fn store_name(&self) -> &'static str {
        "session"
    }

    async fn cleanup(&self) -> StoreResult<usize> {
        Ok(self.sessions.purge_expired().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expiry::ManualClock;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = InMemorySessionStore::new();
        let session = Session::new("s1", "u1", Duration::seconds(3600))
            .with_attribute("email", "u1@example.com");

        store.save(session.clone()).await.unwrap();

        let fetched = store.get("s1").await.unwrap().unwrap();
        assert_eq!(fetched.user_id, "u1");
        assert_eq!(fetched, session);

        store.delete("s1").await.unwrap();
        assert!(store.get("s1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let store = InMemorySessionStore::new();
        assert!(store.get("missing").await.unwrap().is_none());
        store.delete("missing").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_is_absent_without_cleanup() {
        let clock = ManualClock::default();
        let store = InMemorySessionStore::with_clock(Arc::new(clock.clone()));

        let session = Session::new_at("s1", "u1", clock.now(), Duration::seconds(60));
        store.save(session.clone()).await.unwrap();

        clock.advance(Duration::seconds(59));
        assert!(store.get("s1").await.unwrap().is_some());

        clock.advance(Duration::seconds(1));
        assert!(store.get("s1").await.unwrap().is_none());
        assert!(session.is_expired_at(clock.now()));
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_session_with_unbounded_ttl() {
        let config: crate::StoreConfig =
            serde_json::from_str(r#"{ "session_ttl_seconds": 18446744073709551615 }"#).unwrap();

        let session = Session::new("s1", "u1", config.session_ttl());
        assert!(!session.is_expired());

        let session = Session::new("s2", "u1", Duration::MAX);
        assert_eq!(session.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!session.is_expired());
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();

        for (id, offset) in [("past-1", -120), ("past-2", -1), ("future", 3600)] {
            let mut session = Session::new(id, "u1", Duration::zero());
            session.expires_at = now + Duration::seconds(offset);
            store.save(session).await.unwrap();
        }

        assert_eq!(store.cleanup().await.unwrap(), 2);
        assert_eq!(store.cleanup().await.unwrap(), 0);
        assert!(store.get("future").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_save_replaces_session() {
        let store = InMemorySessionStore::new();

        store
            .save(Session::new("s1", "u1", Duration::hours(1)))
            .await
            .unwrap();
        store
            .save(Session::new("s1", "u2", Duration::hours(1)).with_attribute("name", "Two"))
            .await
            .unwrap();

        let fetched = store.get("s1").await.unwrap().unwrap();
        assert_eq!(fetched.user_id, "u2");
        assert_eq!(fetched.attribute("name"), Some("Two"));
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_session_serde() {
        let session = Session::new("s1", "u1", Duration::hours(1)).with_attribute("k", "v");
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["attributes"]["k"], "v");
        assert!(!session.is_expired());
    }
}
