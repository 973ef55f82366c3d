use crate::core::types::ClientId;
use crate::siwe::LoginPayload;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PayloadRequest {
    pub address: String,
    #[serde(default)]
    pub chain_id: Option<u64>,
    /// Restricts the payload to the chain the client allows.
    #[serde(default)]
    pub client_id: Option<ClientId>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoginRequest {
    pub payload: LoginPayload,
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionView {
    pub address: String,
}
