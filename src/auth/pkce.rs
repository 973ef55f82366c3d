use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use super::error::{AccessTokenError, AccessTokenErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformation {
    Plain,
    S256,
    Unsupported,
}

impl Transformation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::S256 => "S256",
            Self::Unsupported => "unsupported",
        }
    }
}

impl Default for Transformation {
    fn default() -> Self {
        Self::Plain
    }
}

impl std::str::FromStr for Transformation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "plain" => Self::Plain,
            "S256" => Self::S256,
            _ => Self::Unsupported,
        })
    }
}

impl<'de> Deserialize<'de> for Transformation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let method = String::deserialize(deserializer)?;
        Ok(method.parse().unwrap_or_default())
    }
}

impl Serialize for Transformation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Challenge {
    #[serde(rename = "code_challenge")]
    pub code: String,
    #[serde(rename = "code_challenge_method")]
    #[serde(default)]
    pub method: Transformation,
}

#[derive(Debug, Clone)]
#[derive(serde::Deserialize)]
pub struct Verifier {
    #[serde(rename = "code_verifier")]
    pub value: String,
}

impl Verifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn s256(&self) -> String {
        let digest = Sha256::digest(self.value.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }
}

pub fn verify(challenge: &Challenge, verifier: &Verifier) -> Result<(), AccessTokenError> {
    let proof = match challenge.method {
        Transformation::S256 => verifier.s256(),
        Transformation::Plain => verifier.value.clone(),
        Transformation::Unsupported => {
            return Err(AccessTokenError::from(AccessTokenErrorKind::InvalidRequest)
                .describe("unsupported code_challenge_method"))
        }
    };

    if proof.as_bytes() == challenge.code.as_bytes() {
        Ok(())
    } else {
        Err(AccessTokenError::from(AccessTokenErrorKind::InvalidGrant)
            .describe("code_verifier does not match code_challenge"))
    }
}
