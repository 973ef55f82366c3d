use crate::auth::{
    pkce, AccessTokenError, AccessTokenErrorKind, AccessTokenResponse,
    AuthorizationCodeTokenRequest, RefreshTokenRequest, TokenRequest,
};
use crate::core::types::Expire;
use crate::provider::{
    claims::{AccessClaims, AccessPayload, CodeClaims, RefreshClaims},
    token::TokenService,
};

use super::OAuth2Provider;

use tracing::{event, Level};

fn invalid_grant(description: &str) -> AccessTokenError {
    AccessTokenError::from(AccessTokenErrorKind::InvalidGrant).describe(description)
}

impl OAuth2Provider {
    #[tracing::instrument(skip_all, fields(grant_type = req.grant_type()))]
    pub async fn access_token_request(
        &self,
        req: TokenRequest,
    ) -> Result<AccessTokenResponse, AccessTokenError> {
        event!(Level::TRACE, "Handling access token request");

        match req {
            TokenRequest::AuthorizationCode(req) => self.authorization_code_grant(req).await,
            TokenRequest::RefreshToken(req) => self.refresh_token_grant(req).await,
        }
    }

    async fn authorization_code_grant(
        &self,
        req: AuthorizationCodeTokenRequest,
    ) -> Result<AccessTokenResponse, AccessTokenError> {
        if [&req.code, &req.code_verifier, &req.redirect_uri, &req.client_id]
            .iter()
            .any(|field| field.is_empty())
        {
            return Err(AccessTokenError::from(AccessTokenErrorKind::InvalidRequest)
                .describe("code, code_verifier, redirect_uri and client_id are required"));
        }

        let claims: CodeClaims = self.token.verify(&req.code).await.map_err(|e| {
            event!(Level::DEBUG, error = %e, "Rejected authorization code");
            invalid_grant("authorization code is invalid or expired")
        })?;

        if claims.redirect_uri.0 != req.redirect_uri || claims.client_id.0 != req.client_id {
            event!(
                Level::WARN,
                original_client_id = %claims.client_id,
                client_id = %req.client_id,
                "Authorization code presented with different client or redirect_uri"
            );
            return Err(invalid_grant("redirect_uri or client_id does not match"));
        }

        event!(Level::DEBUG, method = claims.code_challenge_method.as_str(), "Verifying PKCE challenge");
        pkce::verify(
            &pkce::Challenge {
                code: claims.code_challenge,
                method: claims.code_challenge_method,
            },
            &pkce::Verifier::new(req.code_verifier),
        )?;

        let payload = AccessPayload {
            sub: claims.sub,
            scope: claims.scope,
            client_id: claims.client_id,
            permissions: claims.permissions,
            data: claims.data,
        };

        self.issue_tokens(&payload).await
    }

    async fn refresh_token_grant(
        &self,
        req: RefreshTokenRequest,
    ) -> Result<AccessTokenResponse, AccessTokenError> {
        if req.refresh_token.is_empty() {
            return Err(AccessTokenError::from(AccessTokenErrorKind::InvalidRequest)
                .describe("refresh_token is required"));
        }

        let claims: RefreshClaims = self.token.verify(&req.refresh_token).await.map_err(|e| {
            event!(Level::DEBUG, error = %e, "Rejected refresh token");
            invalid_grant("refresh token is invalid or expired")
        })?;

        if !req.client_id.is_empty() && claims.payload.client_id.0 != req.client_id {
            event!(
                Level::WARN,
                original_client_id = %claims.payload.client_id,
                refresh_client_id = %req.client_id,
                "client_ids do not match"
            );
            return Err(invalid_grant("refresh token was issued to another client"));
        }

        // Rotated on every use. Earlier refresh tokens stay valid until they
        // expire on their own.
        self.issue_tokens(&claims.payload).await
    }

    async fn issue_tokens(
        &self,
        payload: &AccessPayload,
    ) -> Result<AccessTokenResponse, AccessTokenError> {
        let server_error = |e: super::Error| {
            event!(Level::ERROR, error = %e, "Failed to sign tokens");
            AccessTokenError::from(AccessTokenErrorKind::ServerError)
        };

        let access_token = self
            .token
            .new_access_token(payload)
            .await
            .map_err(server_error)?;
        let refresh_token = self
            .token
            .new_refresh_token(payload)
            .await
            .map_err(server_error)?;

        Ok(AccessTokenResponse {
            token_type: TokenService::token_type(),
            access_token,
            expires_in: AccessClaims::EXPIRES_IN_SECS,
            refresh_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::pkce::Transformation;
    use crate::core::models::Permissions;
    use crate::core::types::{current_timestamp, ClientId, RedirectUri, Scope, TokenId};
    use crate::provider::claims::TokenUse;
    use crate::provider::fixtures;
    use crate::util::random::FromRandom;

    const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";
    const REDIRECT: &str = "https://app.example/callback";

    fn code_claims(method: Transformation, challenge: &str, exp_offset: i64) -> CodeClaims {
        let now = current_timestamp();
        CodeClaims {
            iss: "inkan".to_string(),
            sub: "0x000000000000000000000000000000000000dEaD".to_string(),
            scope: Scope::from_delimited_parts("wallet"),
            client_id: ClientId("demo".to_string()),
            code_challenge: challenge.to_string(),
            code_challenge_method: method,
            redirect_uri: RedirectUri(REDIRECT.to_string()),
            permissions: Permissions::default(),
            data: Default::default(),
            iat: now,
            exp: (now as i64 + exp_offset) as u64,
            jti: TokenId::from_random(),
            token_use: TokenUse::Code,
        }
    }

    fn exchange(code: &str, verifier: &str) -> TokenRequest {
        TokenRequest::AuthorizationCode(AuthorizationCodeTokenRequest {
            code: code.to_string(),
            code_verifier: verifier.to_string(),
            redirect_uri: REDIRECT.to_string(),
            client_id: "demo".to_string(),
        })
    }

    async fn code(provider: &OAuth2Provider, claims: &CodeClaims) -> String {
        provider.token.sign(claims).await.unwrap()
    }

    #[tokio::test]
    async fn s256_exchange() {
        let provider = fixtures::provider();
        let code = code(&provider, &code_claims(Transformation::S256, CHALLENGE, 60)).await;

        let response = provider
            .access_token_request(exchange(&code, VERIFIER))
            .await
            .unwrap();
        assert_eq!(response.expires_in, 900);
        assert_eq!(response.token_type, crate::auth::TokenType::Bearer);

        let access: AccessClaims = provider.token.verify(&response.access_token).await.unwrap();
        assert_eq!(access.payload.sub, "0x000000000000000000000000000000000000dEaD");
        assert_eq!(access.payload.client_id, ClientId("demo".to_string()));

        let refresh: RefreshClaims = provider.token.verify(&response.refresh_token).await.unwrap();
        assert_eq!(refresh.payload, access.payload);
    }

    #[tokio::test]
    async fn wrong_verifier_is_invalid_grant() {
        let provider = fixtures::provider();
        let code = code(&provider, &code_claims(Transformation::S256, CHALLENGE, 60)).await;

        let err = provider
            .access_token_request(exchange(&code, "wrong-verifier"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AccessTokenErrorKind::InvalidGrant);
    }

    #[tokio::test]
    async fn plain_exchange() {
        let provider = fixtures::provider();
        let code = code(&provider, &code_claims(Transformation::Plain, VERIFIER, 60)).await;

        assert!(provider
            .access_token_request(exchange(&code, VERIFIER))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn expired_code_is_invalid_grant() {
        let provider = fixtures::provider();
        let code = code(&provider, &code_claims(Transformation::S256, CHALLENGE, -1)).await;

        let err = provider
            .access_token_request(exchange(&code, VERIFIER))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AccessTokenErrorKind::InvalidGrant);
    }

    #[tokio::test]
    async fn code_signed_by_foreign_key_is_invalid_grant() {
        use crate::keys::{self, StaticKeyProvider};
        use std::sync::Arc;

        let provider = fixtures::provider();
        let foreign = TokenService::new(
            Arc::new(StaticKeyProvider::new(
                keys::fixtures::other_material().parse().unwrap(),
            )),
            "session-secret",
            "inkan".to_string(),
        );
        let code = foreign
            .sign(&code_claims(Transformation::S256, CHALLENGE, 60))
            .await
            .unwrap();

        let err = provider
            .access_token_request(exchange(&code, VERIFIER))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AccessTokenErrorKind::InvalidGrant);
    }

    #[tokio::test]
    async fn client_and_redirect_must_match() {
        let provider = fixtures::provider();
        let code = code(&provider, &code_claims(Transformation::S256, CHALLENGE, 60)).await;

        let other_client = TokenRequest::AuthorizationCode(AuthorizationCodeTokenRequest {
            code: code.clone(),
            code_verifier: VERIFIER.to_string(),
            redirect_uri: REDIRECT.to_string(),
            client_id: "other".to_string(),
        });
        let err = provider.access_token_request(other_client).await.unwrap_err();
        assert_eq!(err.kind, AccessTokenErrorKind::InvalidGrant);

        let other_redirect = TokenRequest::AuthorizationCode(AuthorizationCodeTokenRequest {
            code,
            code_verifier: VERIFIER.to_string(),
            redirect_uri: "https://evil.example/callback".to_string(),
            client_id: "demo".to_string(),
        });
        let err = provider.access_token_request(other_redirect).await.unwrap_err();
        assert_eq!(err.kind, AccessTokenErrorKind::InvalidGrant);
    }

    #[tokio::test]
    async fn empty_fields_are_invalid_request() {
        let provider = fixtures::provider();
        let err = provider
            .access_token_request(exchange("", VERIFIER))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AccessTokenErrorKind::InvalidRequest);

        let err = provider
            .access_token_request(TokenRequest::RefreshToken(RefreshTokenRequest::default()))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AccessTokenErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn unsupported_method_in_code_is_invalid_request() {
        let provider = fixtures::provider();
        let code = code(&provider, &code_claims(Transformation::Unsupported, CHALLENGE, 60)).await;

        let err = provider
            .access_token_request(exchange(&code, VERIFIER))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AccessTokenErrorKind::InvalidRequest);
    }

    #[tokio::test]
    async fn refresh_rotates_and_preserves_payload() {
        let provider = fixtures::provider();
        let code = code(&provider, &code_claims(Transformation::S256, CHALLENGE, 60)).await;
        let first = provider
            .access_token_request(exchange(&code, VERIFIER))
            .await
            .unwrap();

        let second = provider
            .access_token_request(TokenRequest::RefreshToken(RefreshTokenRequest {
                refresh_token: first.refresh_token.clone(),
                redirect_uri: REDIRECT.to_string(),
                client_id: "demo".to_string(),
            }))
            .await
            .unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);

        let old: RefreshClaims = provider.token.verify(&first.refresh_token).await.unwrap();
        let new: RefreshClaims = provider.token.verify(&second.refresh_token).await.unwrap();
        assert_eq!(old.payload, new.payload);
        assert_ne!(old.jti, new.jti);

        // The earlier token is not invalidated by rotation.
        assert!(provider
            .access_token_request(TokenRequest::RefreshToken(RefreshTokenRequest {
                refresh_token: first.refresh_token,
                ..Default::default()
            }))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn refresh_rejects_codes_and_other_clients() {
        let provider = fixtures::provider();
        let code = code(&provider, &code_claims(Transformation::S256, CHALLENGE, 60)).await;

        let err = provider
            .access_token_request(TokenRequest::RefreshToken(RefreshTokenRequest {
                refresh_token: code.clone(),
                ..Default::default()
            }))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AccessTokenErrorKind::InvalidGrant);

        let tokens = provider
            .access_token_request(exchange(&code, VERIFIER))
            .await
            .unwrap();
        let err = provider
            .access_token_request(TokenRequest::RefreshToken(RefreshTokenRequest {
                refresh_token: tokens.refresh_token,
                redirect_uri: String::new(),
                client_id: "other".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AccessTokenErrorKind::InvalidGrant);
    }
}
