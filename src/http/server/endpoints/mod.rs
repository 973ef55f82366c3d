pub mod jwks;
pub mod oauth;
pub mod session;
