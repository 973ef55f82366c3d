use crate::keys::JsonWebKeySet;

use super::{Error, OAuth2Provider};

use tracing::{event, Level};

impl OAuth2Provider {
    /// Public half of the signing key, for resource servers verifying
    /// access tokens.
    pub async fn jwks(&self) -> Result<JsonWebKeySet, Error> {
        self.token.jwks().await.map_err(|e| {
            event!(Level::ERROR, error = %e, "Failed to load JWKS");
            e
        })
    }
}
