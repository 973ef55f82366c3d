use crate::auth::error::{AccessTokenError, AccessTokenErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TokenType {
    Bearer,
}

#[derive(Debug, PartialEq)]
pub enum TokenRequest {
    AuthorizationCode(AuthorizationCodeTokenRequest),
    RefreshToken(RefreshTokenRequest),
}

/// Missing string fields decode as empty and are rejected by the grant
/// handler, not by the decoder.
#[derive(Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct AuthorizationCodeTokenRequest {
    pub code: String,
    pub code_verifier: String,
    pub redirect_uri: String,
    pub client_id: String,
}

#[derive(Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
    pub redirect_uri: String,
    pub client_id: String,
}

impl TokenRequest {
    /// Decodes a `/api/token` body. A body that is not JSON is a
    /// `server_error`; an unknown grant is `unsupported_grant_type`.
    pub fn from_json(body: &[u8]) -> Result<Self, AccessTokenError> {
        let value: serde_json::Value = serde_json::from_slice(body).map_err(|_| {
            AccessTokenError::from(AccessTokenErrorKind::ServerError)
                .describe("request body is not valid JSON")
        })?;

        let grant_type = value
            .get("grant_type")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string);

        let invalid = |_| {
            AccessTokenError::from(AccessTokenErrorKind::InvalidRequest)
                .describe("malformed token request")
        };

        match grant_type.as_deref() {
            Some("authorization_code") => serde_json::from_value(value)
                .map(Self::AuthorizationCode)
                .map_err(invalid),
            Some("refresh_token") => serde_json::from_value(value)
                .map(Self::RefreshToken)
                .map_err(invalid),
            _ => Err(AccessTokenErrorKind::UnsupportedGrantType.into()),
        }
    }

    pub fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode(_) => "authorization_code",
            Self::RefreshToken(_) => "refresh_token",
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct AccessTokenResponse {
    pub token_type: TokenType,
    pub access_token: String,
    pub expires_in: u64,
    pub refresh_token: String,
}
