//! Store lifetime configuration.

use serde::{Deserialize, Serialize};

/// Upper bound for every configured duration (about 100 years).
const MAX_CONFIGURED_SECONDS: u64 = 100 * 365 * 86_400;

/// Lifetimes and sweep interval for the state and session stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub state_ttl_seconds: u64,
    pub session_ttl_seconds: u64,
    pub cleanup_interval_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            state_ttl_seconds: 600,      // 10 minutes
            session_ttl_seconds: 86_400, // 24 hours
            cleanup_interval_seconds: 60,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state_ttl(mut self, seconds: u64) -> Self {
        self.state_ttl_seconds = seconds;
        self
    }

    pub fn with_session_ttl(mut self, seconds: u64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    pub fn with_cleanup_interval(mut self, seconds: u64) -> Self {
        self.cleanup_interval_seconds = seconds;
        self
    }

    pub fn state_ttl(&self) -> chrono::Duration {
        seconds_to_chrono(self.state_ttl_seconds)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        seconds_to_chrono(self.session_ttl_seconds)
    }

    /// Sweep interval for the cleanup scheduler. Never zero.
    pub fn cleanup_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(
            self.cleanup_interval_seconds.clamp(1, MAX_CONFIGURED_SECONDS),
        )
    }
}

fn seconds_to_chrono(seconds: u64) -> chrono::Duration {
    // Bounded well inside i64, so the cast cannot wrap
    chrono::Duration::seconds(seconds.min(MAX_CONFIGURED_SECONDS) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.state_ttl(), chrono::Duration::minutes(10));
        assert_eq!(config.session_ttl(), chrono::Duration::hours(24));
        assert_eq!(config.cleanup_interval(), std::time::Duration::from_secs(60));
    }

    #[test]
    fn test_builder_and_zero_interval() {
        let config = StoreConfig::new()
            .with_state_ttl(300)
            .with_session_ttl(3600)
            .with_cleanup_interval(0);

        assert_eq!(config.state_ttl(), chrono::Duration::seconds(300));
        assert_eq!(config.session_ttl(), chrono::Duration::hours(1));
        assert_eq!(config.cleanup_interval(), std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_huge_values_are_clamped() {
        let config: StoreConfig = serde_json::from_str(
            r#"{
                "state_ttl_seconds": 10000000000000,
                "session_ttl_seconds": 18446744073709551615,
                "cleanup_interval_seconds": 18446744073709551615
            }"#,
        )
        .unwrap();

        let hundred_years = chrono::Duration::days(100 * 365);
        assert_eq!(config.state_ttl(), hundred_years);
        assert_eq!(config.session_ttl(), hundred_years);
        assert_eq!(
            config.cleanup_interval(),
            std::time::Duration::from_secs(100 * 365 * 86_400)
        );

        // Adding the clamped lifetimes to the current instant must not overflow
        let now = chrono::Utc::now();
        assert!(now + config.state_ttl() > now);
        assert!(now + config.session_ttl() > now);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: StoreConfig =
            serde_json::from_str(r#"{ "session_ttl_seconds": 7200 }"#).unwrap();
        assert_eq!(config.session_ttl_seconds, 7200);
        assert_eq!(config.state_ttl_seconds, 600);
        assert_eq!(config.cleanup_interval_seconds, 60);
    }
}
