pub mod auth;
pub mod config;
pub mod core;
pub mod http;
pub mod keys;
pub mod provider;
pub mod siwe;
pub mod util;
