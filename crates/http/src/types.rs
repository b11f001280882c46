//! Wire types for the account endpoints and the API response envelope

use serde::{Deserialize, Serialize};
use stockroom_core::{CredentialRecord, UserProfile};

/// Every API response wraps its payload in a `data` field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Body of `POST /account/refresh-token`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RefreshTokenRequest {
    /// The expired access token
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of `POST /account/login`
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session issued by login and refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    pub account_id: String,
    pub user_name: String,
    pub email: String,
    pub role: String,
}

impl SessionData {
    /// The user profile carried by this session
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            account_id: self.account_id.clone(),
            user_name: self.user_name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
        }
    }
}

impl From<SessionData> for CredentialRecord {
    fn from(session: SessionData) -> Self {
        let profile = session.profile();
        Self::new(session.access_token, session.refresh_token, profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_refresh_request_uses_kebab_case_keys() {
        let body = serde_json::to_value(RefreshTokenRequest {
            access_token: "tok1".to_string(),
            refresh_token: "ref1".to_string(),
        })
        .unwrap();

        assert_eq!(body, json!({ "access-token": "tok1", "refresh-token": "ref1" }));
    }

    #[test]
    fn test_session_envelope_becomes_credential_record() {
        let envelope: DataEnvelope<SessionData> = serde_json::from_value(json!({
            "data": {
                "access-token": "tok2",
                "refresh-token": "ref2",
                "account-id": "acc-7",
                "user-name": "warehouse-lead",
                "email": "lead@example.com",
                "role": "staff"
            }
        }))
        .unwrap();

        let record = CredentialRecord::from(envelope.data);
        assert_eq!(record.access_token.as_deref(), Some("tok2"));
        assert_eq!(record.refresh_token.as_deref(), Some("ref2"));
        let profile = record.user_info.unwrap();
        assert_eq!(profile.account_id, "acc-7");
        assert_eq!(profile.role, "staff");
    }

    #[test]
    fn test_login_request_debug_hides_password() {
        let request = LoginRequest {
            email: "lead@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{request:?}");
        assert!(rendered.contains("lead@example.com"));
        assert!(!rendered.contains("hunter2"));
    }
}
