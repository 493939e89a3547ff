//! OAuth2 protocol types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Query parameters delivered to the redirect URI by the provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// OAuth2 token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}

/// OAuth2 user info response (OpenID Connect compatible)
///
/// The user identifier is read from `sub` (OpenID Connect) or `id` (Google v1, GitHub and
/// other legacy endpoints), and numeric identifiers are accepted as well. Claims without a
/// dedicated field are kept in `additional_claims`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfoResponse {
    #[serde(alias = "id", deserialize_with = "string_or_number")]
    pub sub: String,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
    pub locale: Option<String>,
    #[serde(flatten)]
    pub additional_claims: HashMap<String, serde_json::Value>,
}

impl UserInfoResponse {
    /// Flattens the profile into string attributes suitable for a session.
    ///
    /// Scalar extra claims are stringified; nulls, arrays and objects are dropped.
    pub fn profile_attributes(&self) -> HashMap<String, String> {
        let mut attributes: HashMap<String, String> = self
            .additional_claims
            .iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    serde_json::Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((key.clone(), value))
            })
            .collect();

        let known = [
            ("email", &self.email),
            ("name", &self.name),
            ("given_name", &self.given_name),
            ("family_name", &self.family_name),
            ("picture", &self.picture),
            ("locale", &self.locale),
        ];
        for (key, value) in known {
            if let Some(value) = value {
                attributes.insert(key.to_string(), value.clone());
            }
        }
        if let Some(verified) = self.email_verified {
            attributes.insert("email_verified".to_string(), verified.to_string());
        }

        attributes
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number user identifier, got {other}"
        ))),
    }
}
