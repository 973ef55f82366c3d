//! RSA signing keys for codes and tokens.
//!
//! Keys are parsed once per process. Concurrent first callers wait on the
//! same initialization instead of parsing the PEM material twice.

use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use rsa::{pkcs8::DecodePrivateKey, pkcs8::DecodePublicKey, traits::PublicKeyParts};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tokio::sync::OnceCell;
use tracing::{event, Level};

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("RSA private key is not a PKCS#8 PEM document: {0}")]
    PrivateKey(String),
    #[error("RSA public key is not an SPKI PEM document: {0}")]
    PublicKey(String),
    #[error("RSA public key does not belong to the private key")]
    Mismatch,
}

/// JSON Web Key published at the JWKS endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct JsonWebKey {
    pub kty: String,
    pub kid: String,
    #[serde(rename = "use")]
    pub key_use: String,
    pub alg: String,
    pub n: String,
    pub e: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct JsonWebKeySet {
    pub keys: Vec<JsonWebKey>,
}

pub struct SigningKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub kid: String,
    pub alg: Algorithm,
    pub jwk: JsonWebKey,
}

impl std::fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SigningKeys {{ kid: {:?}, alg: {:?}, ... }}", self.kid, self.alg)
    }
}

/// PEM material as it arrives from the environment.
#[derive(Clone)]
pub struct KeyMaterial {
    pub private_pem: String,
    pub public_pem: String,
    pub kid: String,
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyMaterial {{ kid: {:?}, ... }}", self.kid)
    }
}

impl KeyMaterial {
    pub fn new(private_pem: String, public_pem: String, kid: String) -> Self {
        Self {
            private_pem,
            public_pem,
            kid,
        }
    }

    /// Env files often carry PEM bodies with literal `\n` escapes.
    fn normalize(pem: &str) -> String {
        pem.trim().replace("\\n", "\n")
    }

    pub fn parse(&self) -> Result<SigningKeys, KeyError> {
        let private_pem = Self::normalize(&self.private_pem);
        let public_pem = Self::normalize(&self.public_pem);

        let private = RsaPrivateKey::from_pkcs8_pem(&private_pem)
            .map_err(|e| KeyError::PrivateKey(e.to_string()))?;
        let public = RsaPublicKey::from_public_key_pem(&public_pem)
            .map_err(|e| KeyError::PublicKey(e.to_string()))?;

        if RsaPublicKey::from(&private) != public {
            return Err(KeyError::Mismatch);
        }

        let encoding = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| KeyError::PrivateKey(e.to_string()))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| KeyError::PublicKey(e.to_string()))?;

        let jwk = JsonWebKey {
            kty: "RSA".to_string(),
            kid: self.kid.clone(),
            key_use: "sig".to_string(),
            alg: "RS256".to_string(),
            n: URL_SAFE_NO_PAD.encode(public.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(public.e().to_bytes_be()),
        };

        Ok(SigningKeys {
            encoding,
            decoding,
            kid: self.kid.clone(),
            alg: Algorithm::RS256,
            jwk,
        })
    }
}

#[async_trait::async_trait]
pub trait KeyProvider: Send + Sync + std::fmt::Debug {
    async fn get(&self) -> Result<Arc<SigningKeys>, Arc<KeyError>>;

    async fn initialize(&self) -> Result<(), Arc<KeyError>> {
        self.get().await.map(|_| ())
    }
}

/// Parses the configured keypair on first use and caches the result,
/// including a failure.
#[derive(Debug)]
pub struct EnvKeyProvider {
    material: KeyMaterial,
    keys: OnceCell<Result<Arc<SigningKeys>, Arc<KeyError>>>,
}

impl EnvKeyProvider {
    pub fn new(material: KeyMaterial) -> Self {
        Self {
            material,
            keys: OnceCell::new(),
        }
    }
}

#[async_trait::async_trait]
impl KeyProvider for EnvKeyProvider {
    async fn get(&self) -> Result<Arc<SigningKeys>, Arc<KeyError>> {
        self.keys
            .get_or_init(|| async {
                event!(Level::INFO, kid = %self.material.kid, "Importing RSA signing keys");
                self.material.parse().map(Arc::new).map_err(|e| {
                    event!(Level::ERROR, error = %e, "Failed to import RSA signing keys");
                    Arc::new(e)
                })
            })
            .await
            .clone()
    }
}

/// Hands out an already parsed keypair.
#[derive(Debug, Clone)]
pub struct StaticKeyProvider {
    keys: Arc<SigningKeys>,
}

impl StaticKeyProvider {
    pub fn new(keys: SigningKeys) -> Self {
        Self {
            keys: Arc::new(keys),
        }
    }
}

#[async_trait::async_trait]
impl KeyProvider for StaticKeyProvider {
    async fn get(&self) -> Result<Arc<SigningKeys>, Arc<KeyError>> {
        Ok(Arc::clone(&self.keys))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn parses_fixture_keypair() {
        let keys = material().parse().unwrap();
        assert_eq!(keys.kid, "test-key");
        assert_eq!(keys.alg, Algorithm::RS256);
        assert_eq!(keys.jwk.kty, "RSA");
        assert_eq!(keys.jwk.e, "AQAB");
        assert!(!keys.jwk.n.contains('='));
    }

    #[test]
    fn accepts_escaped_newlines() {
        let escaped = KeyMaterial::new(
            PRIVATE_PEM.replace('\n', "\\n"),
            PUBLIC_PEM.replace('\n', "\\n"),
            "test-key".to_string(),
        );
        assert!(escaped.parse().is_ok());
    }

    #[test]
    fn rejects_mismatched_pair() {
        let mixed = KeyMaterial::new(
            PRIVATE_PEM.to_string(),
            OTHER_PUBLIC_PEM.to_string(),
            "test-key".to_string(),
        );
        assert!(matches!(mixed.parse(), Err(KeyError::Mismatch)));
    }

    #[test]
    fn rejects_garbage() {
        let garbage = KeyMaterial::new(
            "not a key".to_string(),
            PUBLIC_PEM.to_string(),
            "test-key".to_string(),
        );
        assert!(matches!(garbage.parse(), Err(KeyError::PrivateKey(_))));
    }

    #[tokio::test]
    async fn env_provider_imports_once() {
        let provider = Arc::new(EnvKeyProvider::new(material()));

        let (a, b) = tokio::join!(provider.get(), provider.get());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));

        let c = provider.get().await.unwrap();
        assert!(Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn env_provider_reports_bad_material() {
        let provider = EnvKeyProvider::new(KeyMaterial::new(
            String::new(),
            String::new(),
            "k".to_string(),
        ));
        assert!(provider.initialize().await.is_err());
    }
}
