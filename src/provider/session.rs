use crate::auth::session::{LoginRequest, PayloadRequest, SessionView};
use crate::auth::{SessionError, SessionErrorKind};
use crate::siwe::{LoginPayload, SiweError};

use super::OAuth2Provider;

use tracing::{event, Level};

impl OAuth2Provider {
    /// Issues a fresh SIWE payload for `address`. A known client with a
    /// fixed chain pins the payload to that chain.
    #[tracing::instrument(skip_all, fields(address = %req.address))]
    pub fn login_payload(&self, req: PayloadRequest) -> Result<LoginPayload, SessionError> {
        let client = req.client_id.as_ref().and_then(|id| self.lookup_client(id));

        let chain_id = match client {
            Some(client) => match req.chain_id {
                Some(requested) if !client.allows_chain(requested) => {
                    return Err(SessionError::from(SessionErrorKind::InvalidRequest)
                        .describe(format!("client does not support chain {}", requested)));
                }
                requested => requested.or(client.chain_id),
            },
            None => req.chain_id,
        };

        self.siwe
            .generate_payload(&req.address, chain_id)
            .map_err(|e| SessionError::from(SessionErrorKind::InvalidRequest).describe(e.to_string()))
    }

    /// Verifies a signed payload and mints the session token for the
    /// recovered wallet.
    #[tracing::instrument(skip_all, fields(address = %req.payload.address))]
    pub fn login(&self, req: LoginRequest) -> Result<(SessionView, String), SessionError> {
        let signer = self
            .siwe
            .verify(&req.payload, &req.signature)
            .map_err(|e| {
                event!(Level::INFO, error = %e, "Rejected login");
                let kind = match e {
                    SiweError::InvalidAddress(_) => SessionErrorKind::InvalidRequest,
                    _ => SessionErrorKind::InvalidSignature,
                };
                SessionError::from(kind).describe(e.to_string())
            })?;

        let address = signer.to_checksum(None);
        let token = self.token.new_session_token(&address).map_err(|e| {
            event!(Level::ERROR, error = %e, "Failed to sign session token");
            SessionError::from(SessionErrorKind::ServerError)
        })?;

        event!(Level::INFO, %address, "Wallet signed in");
        Ok((SessionView { address }, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ClientId;
    use crate::provider::fixtures;
    use crate::siwe::fixtures::sign;
    use alloy::signers::local::PrivateKeySigner;

    fn payload_request(wallet: &PrivateKeySigner) -> PayloadRequest {
        PayloadRequest {
            address: wallet.address().to_string(),
            chain_id: None,
            client_id: None,
        }
    }

    #[test]
    fn payload_is_bound_to_the_server_domain() {
        let provider = fixtures::provider();
        let wallet = PrivateKeySigner::random();

        let payload = provider.login_payload(payload_request(&wallet)).unwrap();
        assert_eq!(payload.domain, fixtures::DOMAIN);
        assert_eq!(payload.address, wallet.address().to_checksum(None));
        assert_eq!(payload.chain_id, None);
    }

    #[test]
    fn client_chain_is_enforced() {
        let provider = fixtures::provider();
        let wallet = PrivateKeySigner::random();

        let payload = provider
            .login_payload(PayloadRequest {
                client_id: Some(ClientId("demo".to_string())),
                ..payload_request(&wallet)
            })
            .unwrap();
        assert_eq!(payload.chain_id, Some(84532));

        let payload = provider
            .login_payload(PayloadRequest {
                chain_id: Some(84532),
                client_id: Some(ClientId("demo".to_string())),
                ..payload_request(&wallet)
            })
            .unwrap();
        assert_eq!(payload.chain_id, Some(84532));

        let err = provider
            .login_payload(PayloadRequest {
                chain_id: Some(1),
                client_id: Some(ClientId("demo".to_string())),
                ..payload_request(&wallet)
            })
            .unwrap_err();
        assert_eq!(err.kind, SessionErrorKind::InvalidRequest);
    }

    #[test]
    fn invalid_address_is_invalid_request() {
        let provider = fixtures::provider();
        let err = provider
            .login_payload(PayloadRequest {
                address: "not-an-address".to_string(),
                chain_id: None,
                client_id: None,
            })
            .unwrap_err();
        assert_eq!(err.kind, SessionErrorKind::InvalidRequest);
    }

    #[test]
    fn login_creates_a_session() {
        let provider = fixtures::provider();
        let wallet = PrivateKeySigner::random();
        let payload = provider.login_payload(payload_request(&wallet)).unwrap();
        let signature = sign(&wallet, &payload);

        let (session, token) = provider.login(LoginRequest { payload, signature }).unwrap();
        assert_eq!(session.address, wallet.address().to_checksum(None));
        assert_eq!(provider.current_session(Some(&token)), Some(session));
    }

    #[test]
    fn login_with_foreign_signature_fails() {
        let provider = fixtures::provider();
        let wallet = PrivateKeySigner::random();
        let intruder = PrivateKeySigner::random();
        let payload = provider.login_payload(payload_request(&wallet)).unwrap();
        let signature = sign(&intruder, &payload);

        let err = provider
            .login(LoginRequest { payload, signature })
            .unwrap_err();
        assert_eq!(err.kind, SessionErrorKind::InvalidSignature);
    }

    #[test]
    fn tampered_payload_fails() {
        let provider = fixtures::provider();
        let wallet = PrivateKeySigner::random();
        let mut payload = provider.login_payload(payload_request(&wallet)).unwrap();
        let signature = sign(&wallet, &payload);
        payload.statement = "Something else".to_string();

        let err = provider
            .login(LoginRequest { payload, signature })
            .unwrap_err();
        assert_eq!(err.kind, SessionErrorKind::InvalidSignature);
    }

    #[test]
    fn garbage_session_cookie_is_ignored() {
        let provider = fixtures::provider();
        assert_eq!(provider.current_session(Some("garbage")), None);
        assert_eq!(provider.current_session(None), None);
    }
}
