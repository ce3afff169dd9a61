use crate::core::kernel::ClientSignature;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    ClientCredentials,
    ClientSignature,
    RefreshToken,
}

/// Params of `public/auth`
#[derive(Debug, Clone, Serialize)]
pub struct AuthParams {
    pub grant_type: GrantType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl AuthParams {
    fn empty(grant_type: GrantType) -> Self {
        Self {
            grant_type,
            client_id: None,
            client_secret: None,
            refresh_token: None,
            timestamp: None,
            signature: None,
            nonce: None,
            data: None,
            scope: None,
        }
    }

    pub fn client_credentials(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            ..Self::empty(GrantType::ClientCredentials)
        }
    }

    pub fn client_signature(signed: ClientSignature) -> Self {
        Self {
            client_id: Some(signed.client_id),
            timestamp: Some(signed.timestamp),
            signature: Some(signed.signature),
            nonce: Some(signed.nonce),
            data: Some(signed.data),
            ..Self::empty(GrantType::ClientSignature)
        }
    }

    pub fn refresh_token(refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: Some(refresh_token.into()),
            ..Self::empty(GrantType::RefreshToken)
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
    pub refresh_token: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub token_type: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LogoutParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalidate_token: Option<bool>,
}
