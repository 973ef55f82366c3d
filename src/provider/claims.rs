use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::{
    auth::pkce::Transformation,
    core::{
        models::Permissions,
        types::{ClientId, Expire, RedirectUri, Scope, TokenId},
    },
};

/// Every token carries what it was minted for, so one kind can never be
/// presented as another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenUse {
    Code,
    Access,
    Refresh,
    Session,
}

pub trait TypedClaims: Serialize + DeserializeOwned {
    const USE: TokenUse;

    fn token_use(&self) -> TokenUse;
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CodeClaims {
    pub iss: String,
    pub sub: String,
    pub scope: Scope,
    pub client_id: ClientId,
    pub code_challenge: String,
    pub code_challenge_method: Transformation,
    pub redirect_uri: RedirectUri,
    pub permissions: Permissions,
    #[serde(default)]
    pub data: Map<String, Value>,
    pub iat: u64,
    pub exp: u64,
    pub jti: TokenId,
    pub token_use: TokenUse,
}

impl Expire for CodeClaims {
    const EXPIRES_IN_SECS: u64 = 60;
}

/// What an access token grants. Refresh tokens carry it unchanged.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AccessPayload {
    pub sub: String,
    pub scope: Scope,
    pub client_id: ClientId,
    pub permissions: Permissions,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AccessClaims {
    #[serde(flatten)]
    pub payload: AccessPayload,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: TokenId,
    pub token_use: TokenUse,
}

impl Expire for AccessClaims {
    const EXPIRES_IN_SECS: u64 = 15 * 60;
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RefreshClaims {
    pub payload: AccessPayload,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: TokenId,
    pub token_use: TokenUse,
}

impl Expire for RefreshClaims {
    const EXPIRES_IN_SECS: u64 = 30 * 24 * 60 * 60;
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iss: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: TokenId,
    pub token_use: TokenUse,
}

impl Expire for SessionClaims {
    const EXPIRES_IN_SECS: u64 = 30 * 24 * 60 * 60;
}

macro_rules! typed_claims {
    ($claims: ty, $use: expr) => {
        impl TypedClaims for $claims {
            const USE: TokenUse = $use;

            fn token_use(&self) -> TokenUse {
                self.token_use
            }
        }
    };
}

typed_claims!(CodeClaims, TokenUse::Code);
typed_claims!(AccessClaims, TokenUse::Access);
typed_claims!(RefreshClaims, TokenUse::Refresh);
typed_claims!(SessionClaims, TokenUse::Session);
