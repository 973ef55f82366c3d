//! Sign-In-With-Ethereum (EIP-4361) challenge and response.
//!
//! Payloads are not recorded server-side. A payload is accepted while its
//! validity window is open and its signature recovers to the address it
//! names.

use std::str::FromStr;

use alloy::primitives::{Address, Signature};
use chrono::{DateTime, Duration, Utc};
use tracing::{event, Level};

use crate::core::types::{Expire, Nonce};
use crate::util::random::FromRandom;

pub mod timestamp;

pub const DEFAULT_STATEMENT: &str =
    "Please ensure that the domain above matches the URL of the current website.";

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct LoginPayload {
    pub domain: String,
    pub address: String,
    pub statement: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    pub version: String,
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    pub nonce: Nonce,
    #[serde(with = "timestamp")]
    pub issued_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub expiration_time: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub invalid_before: DateTime<Utc>,
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
}

impl Expire for LoginPayload {
    const EXPIRES_IN_SECS: u64 = 10 * 60;
}

impl LoginPayload {
    /// The text the wallet signs.
    pub fn to_message(&self) -> String {
        let mut message = format!(
            "{} wants you to sign in with your Ethereum account:\n{}\n\n",
            self.domain, self.address
        );

        if !self.statement.is_empty() {
            message.push_str(&self.statement);
            message.push_str("\n\n");
        }

        if let Some(uri) = &self.uri {
            message.push_str(&format!("URI: {}\n", uri));
        }
        message.push_str(&format!("Version: {}\n", self.version));
        if let Some(chain_id) = self.chain_id {
            message.push_str(&format!("Chain ID: {}\n", chain_id));
        }
        message.push_str(&format!("Nonce: {}\n", self.nonce.0));
        message.push_str(&format!("Issued At: {}\n", timestamp::format(&self.issued_at)));
        message.push_str(&format!(
            "Expiration Time: {}\n",
            timestamp::format(&self.expiration_time)
        ));
        message.push_str(&format!(
            "Not Before: {}",
            timestamp::format(&self.invalid_before)
        ));

        if !self.resources.is_empty() {
            message.push_str("\nResources:");
            for resource in &self.resources {
                message.push_str(&format!("\n- {}", resource));
            }
        }

        message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SiweError {
    #[error("`{0}` is not an Ethereum address")]
    InvalidAddress(String),
    #[error("payload was issued for domain `{0}`")]
    DomainMismatch(String),
    #[error("payload has expired")]
    Expired,
    #[error("payload is not valid yet")]
    NotYetValid,
    #[error("signature is malformed")]
    MalformedSignature,
    #[error("signature does not belong to the payload address")]
    SignerMismatch,
}

/// Issues and checks login payloads for one domain.
#[derive(Debug, Clone)]
pub struct SiweVerifier {
    domain: String,
    uri: String,
    statement: String,
}

impl SiweVerifier {
    pub fn new(domain: impl Into<String>) -> Self {
        let domain = domain.into();
        Self {
            uri: format!("https://{}", domain),
            domain,
            statement: DEFAULT_STATEMENT.to_string(),
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn generate_payload(
        &self,
        address: &str,
        chain_id: Option<u64>,
    ) -> Result<LoginPayload, SiweError> {
        let address = parse_address(address)?;
        let now = timestamp::now();
        let lifetime = Duration::seconds(LoginPayload::EXPIRES_IN_SECS as i64);

        Ok(LoginPayload {
            domain: self.domain.clone(),
            address: address.to_checksum(None),
            statement: self.statement.clone(),
            uri: Some(self.uri.clone()),
            version: "1".to_string(),
            chain_id,
            nonce: Nonce::from_random(),
            issued_at: now,
            expiration_time: now + lifetime,
            invalid_before: now,
            resources: Vec::new(),
        })
    }

    /// Returns the recovered signer if the payload and signature hold.
    #[tracing::instrument(skip_all, fields(address = %payload.address))]
    pub fn verify(&self, payload: &LoginPayload, signature: &str) -> Result<Address, SiweError> {
        if payload.domain != self.domain {
            return Err(SiweError::DomainMismatch(payload.domain.clone()));
        }

        let now = Utc::now();
        if now >= payload.expiration_time {
            return Err(SiweError::Expired);
        }
        if now < payload.invalid_before {
            return Err(SiweError::NotYetValid);
        }

        let claimed = parse_address(&payload.address)?;
        let signature =
            Signature::from_str(signature.trim()).map_err(|_| SiweError::MalformedSignature)?;

        let signer = signature
            .recover_address_from_msg(payload.to_message())
            .map_err(|_| SiweError::MalformedSignature)?;

        if signer != claimed {
            event!(Level::WARN, %signer, "Login signature from a different wallet");
            return Err(SiweError::SignerMismatch);
        }

        Ok(signer)
    }
}

pub fn parse_address(address: &str) -> Result<Address, SiweError> {
    Address::from_str(address.trim()).map_err(|_| SiweError::InvalidAddress(address.to_string()))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use alloy::primitives::hex;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};

    use super::LoginPayload;

    /// Signs the payload's message text the way a wallet would.
    pub fn sign(signer: &PrivateKeySigner, payload: &LoginPayload) -> String {
        let signature = signer
            .sign_message_sync(payload.to_message().as_bytes())
            .unwrap();
        hex::encode_prefixed(signature.as_bytes())
    }
}
