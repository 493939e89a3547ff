//! OAuth2 configuration types.

use crate::error::{OAuth2Error, OAuth2Result};
use ras_identity_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// OAuth2 provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2ProviderConfig {
    pub provider_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: Option<String>,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    /// Additional parameters to include in authorization request
    #[serde(default)]
    pub auth_params: HashMap<String, String>,
}

impl OAuth2ProviderConfig {
    /// Reads the provider settings from `<PREFIX>_*` environment variables.
    ///
    /// See [`OAuth2ProviderConfig::from_lookup`] for the variable names.
    pub fn from_env(prefix: &str) -> OAuth2Result<Self> {
        Self::from_lookup(prefix, |name| std::env::var(name).ok())
    }

    /// Builds the provider settings from a variable lookup.
    ///
    /// Required: `<PREFIX>_CLIENT_ID`, `<PREFIX>_CLIENT_SECRET`, `<PREFIX>_AUTH_URL`,
    /// `<PREFIX>_TOKEN_URL` and `<PREFIX>_REDIRECT_URI`. Optional: `<PREFIX>_USERINFO_URL`
    /// and `<PREFIX>_SCOPES` (separated by spaces or commas). The provider id is the
    /// lowercased prefix.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> OAuth2Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(format!("{prefix}_{suffix}").as_str());
        let required = |suffix: &str| {
            var(suffix).filter(|v| !v.is_empty()).ok_or_else(|| {
                OAuth2Error::ConfigError(format!(
                    "{prefix}_{suffix} environment variable is required"
                ))
            })
        };

        let scopes = var("SCOPES")
            .map(|raw| {
                raw.split([' ', ','])
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            provider_id: prefix.to_lowercase(),
            client_id: required("CLIENT_ID")?,
            client_secret: required("CLIENT_SECRET")?,
            authorization_endpoint: required("AUTH_URL")?,
            token_endpoint: required("TOKEN_URL")?,
            userinfo_endpoint: var("USERINFO_URL").filter(|v| !v.is_empty()),
            redirect_uri: required("REDIRECT_URI")?,
            scopes,
            auth_params: HashMap::new(),
        })
    }

    pub fn with_auth_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.auth_params.insert(key.into(), value.into());
        self
    }
}

/// Login flow configuration
#[derive(Debug, Clone)]
pub struct OAuth2Config {
    pub provider: OAuth2ProviderConfig,
    pub store: StoreConfig,
    pub http_timeout_seconds: u64,
}

impl OAuth2Config {
    pub fn new(provider: OAuth2ProviderConfig) -> Self {
        Self {
            provider,
            store: StoreConfig::default(),
            http_timeout_seconds: 30,
        }
    }

    pub fn with_state_ttl(mut self, seconds: u64) -> Self {
        self.store.state_ttl_seconds = seconds;
        self
    }

    pub fn with_session_ttl(mut self, seconds: u64) -> Self {
        self.store.session_ttl_seconds = seconds;
        self
    }

    pub fn with_store_config(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = seconds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_provider_config_from_lookup() {
        let lookup = lookup_from(&[
            ("GOOGLE_CLIENT_ID", "client"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
            ("GOOGLE_AUTH_URL", "https://accounts.google.com/o/oauth2/v2/auth"),
            ("GOOGLE_TOKEN_URL", "https://oauth2.googleapis.com/token"),
            ("GOOGLE_REDIRECT_URI", "http://localhost:3000/auth/callback"),
            ("GOOGLE_SCOPES", "openid email,profile"),
        ]);

        let config = OAuth2ProviderConfig::from_lookup("GOOGLE", lookup).unwrap();
        assert_eq!(config.provider_id, "google");
        assert_eq!(config.client_id, "client");
        assert_eq!(config.userinfo_endpoint, None);
        assert_eq!(config.scopes, vec!["openid", "email", "profile"]);
    }

    #[test]
    fn test_provider_config_missing_variable() {
        let lookup = lookup_from(&[("GOOGLE_CLIENT_ID", "client")]);

        let err = OAuth2ProviderConfig::from_lookup("GOOGLE", lookup).unwrap_err();
        match err {
            OAuth2Error::ConfigError(message) => {
                assert!(message.contains("GOOGLE_CLIENT_SECRET"))
            }
            other => panic!("Expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn test_flow_config_builders() {
        let provider = OAuth2ProviderConfig::from_lookup(
            "P",
            lookup_from(&[
                ("P_CLIENT_ID", "c"),
                ("P_CLIENT_SECRET", "s"),
                ("P_AUTH_URL", "https://p.example/auth"),
                ("P_TOKEN_URL", "https://p.example/token"),
                ("P_REDIRECT_URI", "https://app.example/cb"),
            ]),
        )
        .unwrap();

        let config = OAuth2Config::new(provider)
            .with_state_ttl(300)
            .with_session_ttl(3600)
            .with_http_timeout(5);

        assert_eq!(config.store.state_ttl_seconds, 300);
        assert_eq!(config.store.session_ttl_seconds, 3600);
        assert_eq!(config.store.cleanup_interval_seconds, 60);
        assert_eq!(config.http_timeout_seconds, 5);
    }
}
