use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::keys::KeyMaterial;

pub mod clients;

#[derive(Parser)]
#[clap(
    name = "inkand",
    version = env!("CARGO_PKG_VERSION"),
    about = "OAuth 2.0 + PKCE authorization server with Sign-In-With-Ethereum sessions"
)]
pub struct Config {
    /// PKCS#8 PEM private key used to sign codes and tokens.
    #[clap(long, env = "RSA_PRIVATE_KEY", hide_env_values = true)]
    pub rsa_private_key: String,
    /// SPKI PEM public key matching the private key.
    #[clap(long, env = "RSA_PUBLIC_KEY", hide_env_values = true)]
    pub rsa_public_key: String,
    #[clap(long, env = "RSA_KEY_ID")]
    pub rsa_key_id: String,
    /// Secret for session cookies.
    #[clap(long, env = "AUTH_PKEY", hide_env_values = true)]
    pub auth_pkey: String,
    /// Domain that SIWE login payloads are issued for.
    #[clap(long, env = "AUTH_DOMAIN", default_value = "localhost:3000")]
    pub auth_domain: String,
    #[clap(long, env = "INKAN_ISSUER", default_value = "inkan")]
    pub issuer: String,
    #[clap(long, env = "INKAN_LISTEN", default_value = "0.0.0.0:8001")]
    pub listen: SocketAddr,
    /// Marks the session cookie `Secure`.
    #[clap(long, env = "INKAN_PRODUCTION")]
    pub production: bool,
    #[clap(long, env = "INKAN_CLIENTS_FILE")]
    pub clients_file: Option<PathBuf>,
    #[clap(long, env = "THIRDWEB_CLIENT_ID")]
    pub sdk_client_id: Option<String>,
    #[clap(long, env = "THIRDWEB_SECRET_KEY", hide_env_values = true)]
    pub sdk_secret_key: Option<String>,
}

impl Config {
    pub fn key_material(&self) -> KeyMaterial {
        KeyMaterial::new(
            self.rsa_private_key.clone(),
            self.rsa_public_key.clone(),
            self.rsa_key_id.clone(),
        )
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("rsa_key_id", &self.rsa_key_id)
            .field("auth_domain", &self.auth_domain)
            .field("issuer", &self.issuer)
            .field("listen", &self.listen)
            .field("production", &self.production)
            .field("clients_file", &self.clients_file)
            .field("sdk_client_id", &self.sdk_client_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from([
            "inkand",
            "--rsa-private-key",
            "priv",
            "--rsa-public-key",
            "pub",
            "--rsa-key-id",
            "kid-1",
            "--auth-pkey",
            "secret",
        ])
        .unwrap();

        assert_eq!(config.listen, "0.0.0.0:8001".parse().unwrap());
        assert_eq!(config.issuer, "inkan");
        assert!(!config.production);
        assert_eq!(config.key_material().kid, "kid-1");
        assert!(!format!("{:?}", config).contains("secret"));
    }
}
