use crate::auth::{
    error::{AuthorizationErrorKind, ErrorResponse},
    pkce,
    session::SessionView,
    BadRequest, MaybeRedirect, WithState,
};
use crate::core::models::{AuthOption, Branding, LoginConfig, PermissionDefinition, Permissions};
use crate::core::types::{AuthCode, ClientId, RedirectUri, Scope};

pub type AuthorizationErrorResponse = WithState<ErrorResponse<AuthorizationErrorKind>>;
pub type AuthorizationError = MaybeRedirect<AuthorizationErrorResponse, BadRequest>;

/// Raw `/authorize` query. Every field is optional so that validation can
/// choose between a redirect and a direct error.
#[derive(Debug, Clone, Default, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct AuthorizeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,
}

/// An authorization request that passed validation.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub client: LoginConfig,
    pub redirect_uri: RedirectUri,
    pub scope: Scope,
    pub state: Option<String>,
    pub challenge: pkce::Challenge,
}

impl AuthorizationRequest {
    pub fn client_id(&self) -> &ClientId {
        &self.client.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentAction {
    #[default]
    Accept,
    Reject,
}

/// Consent submission from the login frontend.
#[derive(Debug, Clone)]
#[derive(serde::Deserialize)]
pub struct ConsentRequest {
    #[serde(flatten)]
    pub params: AuthorizeParams,
    #[serde(default)]
    pub action: ConsentAction,
    #[serde(default)]
    pub permissions: Permissions,
}

/// A consent body that could not be decoded, with whatever authorization
/// parameters could still be read from it.
#[derive(Debug, Clone)]
pub struct UndecodableConsent {
    pub params: AuthorizeParams,
    pub reason: String,
}

impl ConsentRequest {
    /// Decodes a form post from the login page or a JSON body from a
    /// script, chosen by the request content type.
    pub fn decode(content_type: Option<&str>, body: &[u8]) -> Result<Self, UndecodableConsent> {
        let is_form = content_type
            .map(|ct| ct.trim_start().starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);

        if is_form {
            return serde_urlencoded::from_bytes::<Self>(body).map_err(|e| UndecodableConsent {
                params: serde_urlencoded::from_bytes(body).unwrap_or_default(),
                reason: e.to_string(),
            });
        }

        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| UndecodableConsent {
                params: AuthorizeParams::default(),
                reason: e.to_string(),
            })?;

        serde_json::from_value::<Self>(value.clone()).map_err(|e| UndecodableConsent {
            params: serde_json::from_value(value).unwrap_or_default(),
            reason: e.to_string(),
        })
    }
}

/// What the login frontend needs to render the consent screen.
#[derive(Debug, Clone)]
#[derive(serde::Serialize)]
pub struct ConsentDocument {
    pub client: ClientView,
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub permissions: Permissions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionView>,
    pub params: AuthorizeParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk_client_id: Option<String>,
}

#[derive(Debug, Clone)]
#[derive(serde::Serialize)]
pub struct ClientView {
    pub id: ClientId,
    pub name: String,
    pub branding: Branding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    pub auth_options: Vec<AuthOption>,
    pub permissions: Vec<PermissionDefinition>,
}

impl From<&LoginConfig> for ClientView {
    fn from(config: &LoginConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            branding: config.branding.clone(),
            chain_id: config.chain_id,
            auth_options: config.auth_options.clone(),
            permissions: config.permissions.clone(),
        }
    }
}

#[derive(Debug, Clone)]
#[derive(serde::Serialize)]
pub struct AuthorizationCodeResponse {
    pub code: AuthCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}
