//! OAuth2 HTTP client for the Authorization Code flow.

use crate::config::OAuth2ProviderConfig;
use crate::error::{OAuth2Error, OAuth2Result};
use crate::types::{TokenResponse, UserInfoResponse};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

/// Talks to the provider's authorization, token and user info endpoints.
///
/// The client keeps no state between calls; state tokens are handled by the login flow.
#[derive(Clone)]
pub struct OAuth2Client {
    http_client: Client,
}

impl OAuth2Client {
    pub fn new(http_timeout_seconds: u64) -> OAuth2Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(http_timeout_seconds))
            .build()?;

        Ok(Self { http_client })
    }

    /// Build the URL the user agent is redirected to.
    pub fn authorization_url(
        &self,
        provider_config: &OAuth2ProviderConfig,
        state: &str,
        additional_params: &HashMap<String, String>,
    ) -> OAuth2Result<String> {
        let mut url = Url::parse(&provider_config.authorization_endpoint)?;

        {
            let mut params = url.query_pairs_mut();
            params.append_pair("response_type", "code");
            params.append_pair("client_id", &provider_config.client_id);
            params.append_pair("redirect_uri", &provider_config.redirect_uri);
            params.append_pair("state", state);

            if !provider_config.scopes.is_empty() {
                params.append_pair("scope", &provider_config.scopes.join(" "));
            }

            // Provider-specific parameters, then the ones from the request
            for (key, value) in provider_config.auth_params.iter().chain(additional_params) {
                params.append_pair(key, value);
            }
        }

        debug!(
            "Generated authorization URL for provider {}",
            provider_config.provider_id
        );

        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(
        &self,
        provider_config: &OAuth2ProviderConfig,
        code: &str,
    ) -> OAuth2Result<TokenResponse> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", provider_config.client_id.as_str()),
            ("client_secret", provider_config.client_secret.as_str()),
            ("redirect_uri", provider_config.redirect_uri.as_str()),
        ];

        let response = self
            .http_client
            .post(&provider_config.token_endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Token exchange failed: {}", error_text);
            return Err(OAuth2Error::TokenExchangeFailed(format!(
                "{status}: {error_text}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuth2Error::InvalidTokenResponse(e.to_string()))?;

        info!(
            "Exchanged authorization code for tokens with provider {}",
            provider_config.provider_id
        );
        Ok(token_response)
    }

    /// Get user info using access token
    pub async fn get_user_info(
        &self,
        provider_config: &OAuth2ProviderConfig,
        access_token: &str,
    ) -> OAuth2Result<UserInfoResponse> {
        let userinfo_endpoint = provider_config.userinfo_endpoint.as_ref().ok_or_else(|| {
            OAuth2Error::ConfigError("User info endpoint not configured".to_string())
        })?;

        let response = self
            .http_client
            .get(userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "User info request failed: {}", error_text);
            return Err(OAuth2Error::UserInfoFailed(format!("{status}: {error_text}")));
        }

        let user_info: UserInfoResponse = response
            .json()
            .await
            .map_err(|e| OAuth2Error::InvalidUserInfoResponse(e.to_string()))?;

        debug!(
            "Successfully retrieved user info for subject: {}",
            user_info.sub
        );
        Ok(user_info)
    }
}
