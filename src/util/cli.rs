use std::path::PathBuf;

use clap::Parser;

use crate::auth::pkce::{Transformation, Verifier};
use crate::auth::ClientStore;
use crate::config::clients::{ClientsFileError, StaticClientStore};
use crate::keys::{JsonWebKeySet, KeyError, KeyMaterial};
use crate::util::random::random_string;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Keys(#[from] KeyError),
    #[error(transparent)]
    Clients(#[from] ClientsFileError),
    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("unsupported code_challenge_method `{0}`")]
    Method(String),
}

#[derive(Parser)]
#[clap(
    name = "inkan-util",
    version = env!("CARGO_PKG_VERSION"),
    about = "Helpers for operating an inkan authorization server"
)]
pub struct Options {
    #[clap(subcommand)]
    command: SubCommand,
}

#[derive(Parser)]
enum SubCommand {
    /// Generate a PKCE code_verifier and its code_challenge.
    Pkce(Pkce),
    /// Print the JWKS document for the configured signing key.
    Jwks(Jwks),
    ListClients(ListClients),
}

#[derive(Parser)]
struct Pkce {
    #[clap(short, long, default_value = "S256")]
    method: String,
}

#[derive(Parser)]
struct Jwks {
    #[clap(long, env = "RSA_PRIVATE_KEY", hide_env_values = true)]
    rsa_private_key: String,
    #[clap(long, env = "RSA_PUBLIC_KEY", hide_env_values = true)]
    rsa_public_key: String,
    #[clap(long, env = "RSA_KEY_ID")]
    rsa_key_id: String,
}

#[derive(Parser)]
struct ListClients {
    /// Without a file the built-in clients are listed.
    #[clap(long, env = "INKAN_CLIENTS_FILE")]
    clients_file: Option<PathBuf>,
}

#[derive(Debug, PartialEq, serde::Serialize)]
pub struct PkcePair {
    pub code_verifier: String,
    pub code_challenge: String,
    pub code_challenge_method: Transformation,
}

pub fn pkce_pair(method: Transformation) -> Result<PkcePair, CliError> {
    let verifier = Verifier::new(random_string(32));
    let code_challenge = match method {
        Transformation::S256 => verifier.s256(),
        Transformation::Plain => verifier.value.clone(),
        Transformation::Unsupported => {
            return Err(CliError::Method(method.as_str().to_string()))
        }
    };

    Ok(PkcePair {
        code_verifier: verifier.value,
        code_challenge,
        code_challenge_method: method,
    })
}

fn pkce(c: &Pkce) -> Result<(), CliError> {
    let method: Transformation = c.method.parse().unwrap_or(Transformation::Unsupported);
    if method == Transformation::Unsupported {
        return Err(CliError::Method(c.method.clone()));
    }

    let pair = pkce_pair(method)?;
    println!("{}", serde_json::to_string_pretty(&pair)?);
    Ok(())
}

fn jwks(c: &Jwks) -> Result<(), CliError> {
    let material = KeyMaterial::new(
        c.rsa_private_key.clone(),
        c.rsa_public_key.clone(),
        c.rsa_key_id.clone(),
    );
    let keys = material.parse()?;
    let set = JsonWebKeySet {
        keys: vec![keys.jwk],
    };

    println!("{}", serde_json::to_string_pretty(&set)?);
    Ok(())
}

fn list_clients(c: &ListClients) -> Result<(), CliError> {
    let store = match &c.clients_file {
        Some(path) => StaticClientStore::from_file(path)?,
        None => StaticClientStore::builtin(),
    };

    for client in store.list_clients() {
        let chain = client
            .chain_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "any".to_string());
        println!("{} (name: \"{}\", chain: {})", client.id, client.name, chain);
        for uri in &client.redirect_uris {
            println!("  {}", uri);
        }
    }
    Ok(())
}

pub fn run_cli_action(opts: Options) -> Result<(), CliError> {
    match &opts.command {
        SubCommand::Pkce(c) => pkce(c),
        SubCommand::Jwks(c) => jwks(c),
        SubCommand::ListClients(c) => list_clients(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s256_pair_verifies() {
        let pair = pkce_pair(Transformation::S256).unwrap();
        assert_eq!(pair.code_verifier.len(), 43);
        assert_eq!(Verifier::new(pair.code_verifier).s256(), pair.code_challenge);
    }

    #[test]
    fn plain_pair_is_identical() {
        let pair = pkce_pair(Transformation::Plain).unwrap();
        assert_eq!(pair.code_verifier, pair.code_challenge);
    }

    #[test]
    fn subcommands_parse() {
        assert!(Options::try_parse_from(["inkan-util", "pkce", "--method", "plain"]).is_ok());
        assert!(Options::try_parse_from(["inkan-util", "list-clients"]).is_ok());
    }
}
