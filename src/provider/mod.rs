use std::sync::Arc;

use crate::auth::{session::SessionView, ClientStore};
use crate::core::{models::LoginConfig, types::ClientId};
use crate::siwe::SiweVerifier;

pub mod access_token;
pub mod authorization;
pub mod claims;
pub mod error;
pub mod jwks;
pub mod session;
pub mod token;

pub use error::Error;
use token::TokenService;

use tracing::{event, Level};

#[derive(Debug)]
pub struct OAuth2Provider {
    clients: Arc<dyn ClientStore>,
    token: TokenService,
    siwe: SiweVerifier,
    sdk_client_id: Option<String>,
}

impl OAuth2Provider {
    pub fn new(clients: Arc<dyn ClientStore>, token: TokenService, siwe: SiweVerifier) -> Self {
        Self {
            clients,
            token,
            siwe,
            sdk_client_id: None,
        }
    }

    /// Client id of the wallet SDK, handed to the login frontend.
    pub fn with_sdk_client_id(mut self, sdk_client_id: Option<String>) -> Self {
        self.sdk_client_id = sdk_client_id;
        self
    }

    pub fn token_service(&self) -> &TokenService {
        &self.token
    }

    fn lookup_client(&self, client_id: &ClientId) -> Option<LoginConfig> {
        let client = self.clients.get_client(client_id);
        if client.is_none() {
            event!(Level::DEBUG, %client_id, "Unknown client");
        }
        client
    }

    /// The signed-in wallet, if the session cookie is present and valid.
    pub fn current_session(&self, session: Option<&str>) -> Option<SessionView> {
        let token = session?;
        match self.token.validate_session_token(token) {
            Ok(claims) => Some(SessionView {
                address: claims.sub,
            }),
            Err(e) => {
                event!(Level::DEBUG, error = %e, "Ignoring invalid session cookie");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::config::clients::StaticClientStore;
    use crate::keys;

    pub const DOMAIN: &str = "login.example";

    pub fn provider() -> OAuth2Provider {
        provider_with(StaticClientStore::builtin())
    }

    pub fn provider_with(clients: StaticClientStore) -> OAuth2Provider {
        let token = TokenService::new(
            Arc::new(keys::fixtures::provider()),
            "session-secret",
            "inkan".to_string(),
        );
        OAuth2Provider::new(Arc::new(clients), token, SiweVerifier::new(DOMAIN))
    }
}
