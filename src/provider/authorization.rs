use chrono::Utc;
use serde_json::{Map, Value};

use crate::{
    auth::{
        pkce::{self, Transformation},
        AuthorizationCodeResponse, AuthorizationError, AuthorizationErrorKind, AuthorizationErrorResponse,
        AuthorizationRequest, AuthorizeParams, BadRequest, ClientView, ConsentAction,
        ConsentDocument, ConsentRequest, ErrorResponse, MaybeRedirect, Redirect,
        UndecodableConsent,
    },
    core::{
        models::LoginConfig,
        types::{current_timestamp, AuthCode, ClientId, Expire, RedirectUri, Scope, TokenId},
    },
    provider::{
        claims::{CodeClaims, TokenUse},
        error::ResultExt,
    },
    util::random::FromRandom,
};

use tracing::{event, Level};

use super::OAuth2Provider;

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn invalid_request(description: &str) -> ErrorResponse<AuthorizationErrorKind> {
    ErrorResponse::new(AuthorizationErrorKind::InvalidRequest).describe(description)
}

/// Extra claims carried from the client configuration into issued tokens.
fn token_data(client: &LoginConfig) -> Map<String, Value> {
    let mut data = Map::new();
    if let Some(signer) = &client.session_key_signer_address {
        data.insert(
            "session_key_signer_address".to_string(),
            Value::String(signer.clone()),
        );
    }
    if let Some(chain_id) = client.chain_id {
        data.insert("chain_id".to_string(), Value::from(chain_id));
    }
    data
}

impl OAuth2Provider {
    /// Errors past the redirect URI check are reported by redirecting back
    /// to the client. The redirect URI is checked against the client's
    /// allowlist before anything is reported through it.
    pub fn validate_authorization(
        &self,
        params: &AuthorizeParams,
    ) -> Result<AuthorizationRequest, AuthorizationError> {
        let redirect_uri = non_empty(&params.redirect_uri)
            .map(|uri| RedirectUri(uri.to_string()))
            .ok_or(BadRequest::MissingRedirect)
            .without_redirect::<AuthorizationErrorResponse>()?;

        redirect_uri
            .parse()
            .ok_or(BadRequest::InvalidRedirect)
            .without_redirect::<AuthorizationErrorResponse>()?;

        let client_id = non_empty(&params.client_id).map(|id| ClientId(id.to_string()));
        let client = client_id.as_ref().and_then(|id| self.lookup_client(id));

        let trusted = match &client {
            Some(client) => client.allows_redirect(&redirect_uri),
            None => !self.clients.restricts_redirects(),
        };
        if !trusted {
            event!(
                Level::WARN,
                client_id = ?client_id,
                redirect_uri = %redirect_uri.0,
                "redirect_uri is not registered for client"
            );
            return Err(MaybeRedirect::Direct(BadRequest::InvalidRedirect));
        }

        let state = params.state.clone();
        let fail = |description: &str| -> AuthorizationError {
            MaybeRedirect::Redirected(Redirect::new(
                redirect_uri.clone(),
                (invalid_request(description), state.clone()).into(),
            ))
        };

        match non_empty(&params.response_type) {
            Some("code") => {}
            Some(_) => return Err(fail("response_type must be code")),
            None => return Err(fail("response_type is required")),
        }

        let client = match (client_id, client) {
            (_, Some(client)) => client,
            (None, None) => return Err(fail("client_id is required")),
            (Some(_), None) => return Err(fail("client_id is not registered")),
        };

        let code_challenge =
            non_empty(&params.code_challenge).ok_or_else(|| fail("code_challenge is required"))?;

        let method = match non_empty(&params.code_challenge_method) {
            Some(method) => method.parse().unwrap_or(Transformation::Unsupported),
            None => Transformation::Plain,
        };
        if method == Transformation::Unsupported {
            return Err(fail("code_challenge_method must be S256 or plain"));
        }

        let scope = params
            .scope
            .as_deref()
            .map(Scope::from_delimited_parts)
            .unwrap_or_default();

        Ok(AuthorizationRequest {
            client,
            redirect_uri,
            scope,
            state,
            challenge: pkce::Challenge {
                code: code_challenge.to_string(),
                method,
            },
        })
    }

    #[tracing::instrument(skip_all, fields(client_id = ?params.client_id))]
    pub async fn authorization_request(
        &self,
        params: AuthorizeParams,
        session: Option<&str>,
    ) -> Result<ConsentDocument, AuthorizationError> {
        let req = self.validate_authorization(&params)?;
        let session = self.current_session(session);

        event!(
            Level::DEBUG,
            signed_in = session.is_some(),
            "Serving consent document"
        );

        Ok(ConsentDocument {
            client: ClientView::from(&req.client),
            scope: req.scope.clone(),
            state: req.state.clone(),
            permissions: req.client.default_permissions(Utc::now()),
            session,
            params,
            sdk_client_id: self.sdk_client_id.clone(),
        })
    }

    /// A consent body that failed to decode is reported through the
    /// redirect URI only when the parameters read from it validate that URI.
    pub fn undecodable_consent(&self, consent: UndecodableConsent) -> AuthorizationError {
        event!(Level::INFO, reason = %consent.reason, "Undecodable consent body");
        let error: AuthorizationErrorResponse =
            (invalid_request(&consent.reason), consent.params.state.clone()).into();

        match self.validate_authorization(&consent.params) {
            Ok(req) => MaybeRedirect::Redirected(Redirect::new(req.redirect_uri, error)),
            Err(MaybeRedirect::Redirected(r)) => {
                MaybeRedirect::Redirected(Redirect::new(r.uri, error))
            }
            Err(MaybeRedirect::Direct(_)) => MaybeRedirect::Direct(BadRequest::InvalidRequest),
        }
    }

    /// Mints the authorization code once the signed-in user consents.
    #[tracing::instrument(skip_all, fields(client_id = ?consent.params.client_id))]
    pub async fn create_code(
        &self,
        session: Option<&str>,
        consent: ConsentRequest,
    ) -> Result<Redirect<AuthorizationCodeResponse>, AuthorizationError> {
        let session = self
            .current_session(session)
            .ok_or(BadRequest::LoginRequired)
            .without_redirect::<AuthorizationErrorResponse>()?;

        let req = self.validate_authorization(&consent.params)?;
        let uri = req.redirect_uri.clone();

        if consent.action == ConsentAction::Reject {
            event!(Level::INFO, "User denied authorization");
            return Err(ErrorResponse::new(AuthorizationErrorKind::AccessDenied))
                .add_state_context(&req.state)
                .add_redirect_context(uri);
        }

        let permissions = req
            .client
            .resolve_permissions(&consent.permissions, Utc::now())
            .map_err(|e| invalid_request(&e.to_string()))
            .add_state_context(&req.state)
            .add_redirect_context::<BadRequest>(uri.clone())?;

        let time_now = current_timestamp();
        let claims = CodeClaims {
            iss: self.token.issuer().to_string(),
            sub: session.address,
            scope: req.scope.clone(),
            client_id: req.client_id().clone(),
            code_challenge: req.challenge.code.clone(),
            code_challenge_method: req.challenge.method,
            redirect_uri: uri.clone(),
            permissions,
            data: token_data(&req.client),
            iat: time_now,
            exp: CodeClaims::expiry_from(time_now),
            jti: TokenId::from_random(),
            token_use: TokenUse::Code,
        };

        let code = self
            .token
            .sign(&claims)
            .await
            .map_err(|e| {
                event!(Level::ERROR, error = %e, "Failed to sign authorization code");
                ErrorResponse::new(AuthorizationErrorKind::ServerError)
            })
            .add_state_context(&req.state)
            .add_redirect_context::<BadRequest>(uri.clone())?;

        event!(Level::DEBUG, "Issuing authorization code");
        Ok(Redirect::see_other(
            uri,
            AuthorizationCodeResponse {
                code: AuthCode(code),
                state: req.state,
            },
        ))
    }
}
