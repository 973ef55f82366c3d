use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{event, Level};

use crate::auth::TokenType;
use crate::core::types::{current_timestamp, Expire, TokenId};
use crate::keys::{JsonWebKeySet, KeyProvider};
use crate::provider::{
    claims::{AccessClaims, AccessPayload, RefreshClaims, SessionClaims, TokenUse, TypedClaims},
    Error,
};
use crate::util::random::FromRandom;

/// Mints and verifies every JWT the server hands out. Codes, access and
/// refresh tokens are RS256 with the shared keypair; session cookies are
/// HS256 keyed by the session secret.
pub struct TokenService {
    keys: Arc<dyn KeyProvider>,
    session_encoding: EncodingKey,
    session_decoding: DecodingKey,
    issuer: String,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenService {{ issuer: {:?}, ... }}", self.issuer)
    }
}

impl TokenService {
    pub fn new(keys: Arc<dyn KeyProvider>, session_secret: &str, issuer: String) -> Self {
        Self {
            keys,
            session_encoding: EncodingKey::from_secret(session_secret.as_bytes()),
            session_decoding: DecodingKey::from_secret(session_secret.as_bytes()),
            issuer,
        }
    }

    pub fn token_type() -> TokenType {
        TokenType::Bearer
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    fn validation(&self, alg: Algorithm) -> Validation {
        let mut validation = Validation::new(alg);
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss"]);
        validation
    }

    fn check_use<C: TypedClaims>(claims: C) -> Result<C, Error> {
        if claims.token_use() == C::USE {
            Ok(claims)
        } else {
            Err(Error::WrongTokenUse {
                expected: C::USE,
                found: claims.token_use(),
            })
        }
    }

    pub async fn sign<C: TypedClaims>(&self, claims: &C) -> Result<String, Error> {
        let keys = self.keys.get().await?;
        let mut header = Header::new(keys.alg);
        header.kid = Some(keys.kid.clone());

        Ok(jsonwebtoken::encode(&header, claims, &keys.encoding)?)
    }

    /// Checks signature, expiry, issuer and token use.
    pub async fn verify<C: TypedClaims>(&self, token: &str) -> Result<C, Error> {
        let keys = self.keys.get().await?;
        let data = jsonwebtoken::decode::<C>(token, &keys.decoding, &self.validation(keys.alg))?;
        Self::check_use(data.claims)
    }

    pub async fn jwks(&self) -> Result<JsonWebKeySet, Error> {
        let keys = self.keys.get().await?;
        Ok(JsonWebKeySet {
            keys: vec![keys.jwk.clone()],
        })
    }

    #[tracing::instrument(skip_all, fields(client_id = %payload.client_id))]
    pub async fn new_access_token(&self, payload: &AccessPayload) -> Result<String, Error> {
        let time_now = current_timestamp();

        let claims = AccessClaims {
            payload: payload.clone(),
            iss: self.issuer.clone(),
            iat: time_now,
            exp: AccessClaims::expiry_from(time_now),
            jti: TokenId::from_random(),
            token_use: TokenUse::Access,
        };

        event!(Level::DEBUG, "Issuing access_token");
        self.sign(&claims).await
    }

    #[tracing::instrument(skip_all, fields(client_id = %payload.client_id))]
    pub async fn new_refresh_token(&self, payload: &AccessPayload) -> Result<String, Error> {
        let time_now = current_timestamp();

        let claims = RefreshClaims {
            payload: payload.clone(),
            iss: self.issuer.clone(),
            iat: time_now,
            exp: RefreshClaims::expiry_from(time_now),
            jti: TokenId::from_random(),
            token_use: TokenUse::Refresh,
        };

        event!(Level::DEBUG, "Issuing refresh_token");
        self.sign(&claims).await
    }

    pub fn new_session_token(&self, address: &str) -> Result<String, Error> {
        let time_now = current_timestamp();

        let claims = SessionClaims {
            sub: address.to_string(),
            iss: self.issuer.clone(),
            iat: time_now,
            exp: SessionClaims::expiry_from(time_now),
            jti: TokenId::from_random(),
            token_use: TokenUse::Session,
        };

        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.session_encoding,
        )?)
    }

    pub fn validate_session_token(&self, token: &str) -> Result<SessionClaims, Error> {
        let data = jsonwebtoken::decode::<SessionClaims>(
            token,
            &self.session_decoding,
            &self.validation(Algorithm::HS256),
        )?;
        Self::check_use(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Permissions;
    use crate::core::types::{ClientId, Scope};
    use crate::keys::{fixtures, StaticKeyProvider};
    use crate::provider::claims::CodeClaims;

    fn service() -> TokenService {
        TokenService::new(Arc::new(fixtures::provider()), "session-secret", "inkan".to_string())
    }

    fn payload() -> AccessPayload {
        AccessPayload {
            sub: "0x000000000000000000000000000000000000dEaD".to_string(),
            scope: Scope::from_delimited_parts("wallet"),
            client_id: ClientId("demo".to_string()),
            permissions: Permissions::default(),
            data: Default::default(),
        }
    }

    #[tokio::test]
    async fn access_token_round_trip_and_header() {
        let service = service();
        let token = service.new_access_token(&payload()).await.unwrap();

        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("test-key"));
        assert_eq!(header.typ.as_deref(), Some("JWT"));

        let claims: AccessClaims = service.verify(&token).await.unwrap();
        assert_eq!(claims.payload, payload());
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[tokio::test]
    async fn refresh_token_cannot_be_used_as_access_token() {
        let service = service();
        let token = service.new_refresh_token(&payload()).await.unwrap();

        let err = service.verify::<AccessClaims>(&token).await.unwrap_err();
        assert!(matches!(err, Error::Jwt(_) | Error::WrongTokenUse { .. }));

        let claims: RefreshClaims = service.verify(&token).await.unwrap();
        assert_eq!(claims.exp - claims.iat, 2_592_000);
    }

    #[tokio::test]
    async fn refresh_tokens_are_unique() {
        let service = service();
        let a = service.new_refresh_token(&payload()).await.unwrap();
        let b = service.new_refresh_token(&payload()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn expired_code_is_rejected_without_leeway() {
        let service = service();
        let now = current_timestamp();
        let claims = CodeClaims {
            iss: "inkan".to_string(),
            sub: "0xabc".to_string(),
            scope: Scope::default(),
            client_id: ClientId("demo".to_string()),
            code_challenge: "c".to_string(),
            code_challenge_method: crate::auth::pkce::Transformation::S256,
            redirect_uri: crate::core::types::RedirectUri("https://app.example/cb".to_string()),
            permissions: Permissions::default(),
            data: Default::default(),
            iat: now - 61,
            exp: now - 1,
            jti: TokenId::from_random(),
            token_use: TokenUse::Code,
        };
        let token = service.sign(&claims).await.unwrap();

        assert!(service.verify::<CodeClaims>(&token).await.is_err());
    }

    #[tokio::test]
    async fn foreign_key_and_foreign_issuer_are_rejected() {
        let foreign = TokenService::new(
            Arc::new(StaticKeyProvider::new(fixtures::other_material().parse().unwrap())),
            "session-secret",
            "inkan".to_string(),
        );
        let token = foreign.new_access_token(&payload()).await.unwrap();
        assert!(service().verify::<AccessClaims>(&token).await.is_err());

        let other_issuer =
            TokenService::new(Arc::new(fixtures::provider()), "session-secret", "elsewhere".to_string());
        let token = other_issuer.new_access_token(&payload()).await.unwrap();
        assert!(service().verify::<AccessClaims>(&token).await.is_err());
    }

    #[test]
    fn session_tokens_are_bound_to_the_secret() {
        let service = service();
        let token = service.new_session_token("0xabc").unwrap();
        assert_eq!(service.validate_session_token(&token).unwrap().sub, "0xabc");

        let other = TokenService::new(Arc::new(fixtures::provider()), "another-secret", "inkan".to_string());
        assert!(other.validate_session_token(&token).is_err());
    }
}
