//! Login flow orchestration over the state and session stores.

use crate::client::OAuth2Client;
use crate::config::OAuth2Config;
use crate::error::{OAuth2Error, OAuth2Result};
use crate::token::{generate_session_id, generate_state_token};
use crate::types::{AuthorizationResponse, TokenResponse, UserInfoResponse};
use ras_identity_store::{
    CleanupHandle, Clock, Session, SessionStore, StateStore, SystemClock, expiry_after,
    start_cleanup,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where to send the user agent to start a login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRedirect {
    pub authorization_url: String,
    pub state: String,
}

/// Background sweepers for the two stores of a [`LoginFlow`].
#[derive(Debug)]
pub struct CleanupTasks {
    pub state: CleanupHandle,
    pub session: CleanupHandle,
}

impl CleanupTasks {
    pub fn cancel(&self) {
        self.state.cancel();
        self.session.cancel();
    }

    pub async fn shutdown(self) {
        tokio::join!(self.state.shutdown(), self.session.shutdown());
    }
}

/// OAuth2 Authorization Code login against one provider.
///
/// Per login, the flow saves exactly one state token when redirecting and validates it
/// exactly once on the callback, before looking at anything else the provider sent. A
/// session is saved only after the code exchange and user info fetch both succeed. Store
/// errors are returned to the caller and never treated as a successful check.
#[derive(Clone)]
pub struct LoginFlow {
    config: OAuth2Config,
    client: OAuth2Client,
    state_store: Arc<dyn StateStore>,
    session_store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl LoginFlow {
    pub fn new(
        config: OAuth2Config,
        state_store: Arc<dyn StateStore>,
        session_store: Arc<dyn SessionStore>,
    ) -> OAuth2Result<Self> {
        let client = OAuth2Client::new(config.http_timeout_seconds)?;

        Ok(Self {
            config,
            client,
            state_store,
            session_store,
            clock: Arc::new(SystemClock),
        })
    }

    /// Use `clock` for the expiry of new state tokens and sessions.
    ///
    /// Pass the same clock the stores check expiry against.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &OAuth2Config {
        &self.config
    }

    pub fn state_store(&self) -> &Arc<dyn StateStore> {
        &self.state_store
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        &self.session_store
    }

    /// Start periodic sweeping of both stores at the configured interval.
    pub fn start_cleanup(&self) -> CleanupTasks {
        let interval = self.config.store.cleanup_interval();

        CleanupTasks {
            state: start_cleanup(self.state_store.clone(), interval),
            session: start_cleanup(self.session_store.clone(), interval),
        }
    }

    /// Issue a state token and build the provider authorization URL.
    pub async fn begin_login(
        &self,
        additional_params: HashMap<String, String>,
    ) -> OAuth2Result<LoginRedirect> {
        let provider = &self.config.provider;
        let state = generate_state_token();

        let authorization_url = self
            .client
            .authorization_url(provider, &state, &additional_params)?;

        let expires_at = expiry_after(self.clock.now(), self.config.store.state_ttl());
        self.state_store.save(&state, expires_at).await?;

        info!("Started OAuth2 flow for provider: {}", provider.provider_id);

        Ok(LoginRedirect {
            authorization_url,
            state,
        })
    }

    /// Complete a login from the provider callback and record the new session.
    pub async fn complete_login(&self, callback: AuthorizationResponse) -> OAuth2Result<Session> {
        let provider = &self.config.provider;

        let state = callback.state.ok_or(OAuth2Error::InvalidState)?;
        if !self.state_store.validate(&state).await? {
            warn!(
                "Rejected OAuth2 callback with unknown, expired or reused state for provider: {}",
                provider.provider_id
            );
            return Err(OAuth2Error::InvalidState);
        }

        if let Some(error) = callback.error {
            let error_desc = callback
                .error_description
                .as_deref()
                .unwrap_or("No description");
            return Err(OAuth2Error::CallbackError(format!("{error}: {error_desc}")));
        }

        let code = callback.code.ok_or(OAuth2Error::MissingAuthorizationCode)?;

        let token_response = self.client.exchange_code(provider, &code).await?;
        let user_info = self
            .client
            .get_user_info(provider, &token_response.access_token)
            .await?;

        let session = self.build_session(user_info, token_response);
        self.session_store.save(session.clone()).await?;

        info!(
            user_id = %session.user_id,
            "Successfully created session for provider: {}",
            provider.provider_id
        );

        Ok(session)
    }

    /// Resolve a session id presented by a later request.
    ///
    /// Returns `None` for unknown, expired and logged-out sessions.
    pub async fn authenticate(&self, session_id: &str) -> OAuth2Result<Option<Session>> {
        let session = self.session_store.get(session_id).await?;
        if session.is_none() {
            debug!("No active session for presented id");
        }
        Ok(session)
    }

    /// End a session. Logging out an unknown session succeeds.
    pub async fn logout(&self, session_id: &str) -> OAuth2Result<()> {
        self.session_store.delete(session_id).await?;
        info!("Session ended");
        Ok(())
    }

    fn build_session(&self, user_info: UserInfoResponse, tokens: TokenResponse) -> Session {
        let mut session = Session::new_at(
            generate_session_id(),
            user_info.sub.clone(),
            self.clock.now(),
            self.config.store.session_ttl(),
        );

        session.attributes = user_info.profile_attributes();
        session
            .attributes
            .insert("provider".to_string(), self.config.provider.provider_id.clone());
        session
            .attributes
            .insert("access_token".to_string(), tokens.access_token);
        if let Some(refresh_token) = tokens.refresh_token {
            session
                .attributes
                .insert("refresh_token".to_string(), refresh_token);
        }

        session
    }
}
