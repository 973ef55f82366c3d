use std::sync::Arc;

use clap::Parser;
use tracing::{event, Level};
use tracing_subscriber::EnvFilter;

use inkan::auth::ClientStore;
use inkan::config::{clients::StaticClientStore, Config};
use inkan::http::Server;
use inkan::keys::{EnvKeyProvider, KeyProvider};
use inkan::provider::{token::TokenService, OAuth2Provider};
use inkan::siwe::SiweVerifier;

async fn inkand(config: Config) -> Option<()> {
    let keys = Arc::new(EnvKeyProvider::new(config.key_material()));
    keys.initialize().await.ok()?;

    let clients: Arc<dyn ClientStore> = match &config.clients_file {
        Some(path) => match StaticClientStore::from_file(path) {
            Ok(store) => Arc::new(store),
            Err(e) => {
                event!(Level::ERROR, error = %e, path = %path.display(), "Failed to load clients");
                return None;
            }
        },
        None => Arc::new(StaticClientStore::builtin()),
    };

    let token = TokenService::new(keys, &config.auth_pkey, config.issuer.clone());
    let provider = OAuth2Provider::new(clients, token, SiweVerifier::new(&config.auth_domain))
        .with_sdk_client_id(config.sdk_client_id.clone());

    Server::new(Arc::new(provider))
        .with_secure_cookies(config.production)
        .serve(config.listen)
        .await;
    Some(())
}

#[tokio::main]
async fn main() -> Result<(), ()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    event!(Level::DEBUG, ?config, "Starting inkand");
    inkand(config).await.ok_or(())
}
