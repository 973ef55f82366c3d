use crate::core::models::LoginConfig;
use crate::core::types::{ClientId, RedirectUri};

pub mod access_token;
pub mod authorization;
pub mod error;
pub mod pkce;
pub mod session;

pub use access_token::*;
pub use authorization::*;
pub use error::*;

/// Keyed lookup of per-client login configuration.
pub trait ClientStore: Send + Sync + std::fmt::Debug {
    fn get_client(&self, client_id: &ClientId) -> Option<LoginConfig>;
    fn list_clients(&self) -> Vec<LoginConfig>;
    /// Whether any configuration carries a redirect allowlist. When it
    /// does, a request without a resolvable client has no trusted
    /// redirect target.
    fn restricts_redirects(&self) -> bool;
}

/// Authorization failures answered directly instead of through the
/// client's redirect URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadRequest {
    MissingRedirect,
    InvalidRedirect,
    InvalidRequest,
    LoginRequired,
}

#[derive(Debug)]
pub enum MaybeRedirect<R, D> {
    Redirected(Redirect<R>),
    Direct(D),
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize)]
pub struct WithState<T> {
    #[serde(flatten)]
    pub inner: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl<T> From<(T, Option<String>)> for WithState<T> {
    fn from((t, state): (T, Option<String>)) -> Self {
        Self { inner: t, state }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    Temporary,
    SeeOther,
}

#[derive(Debug, Clone)]
pub struct Redirect<T> {
    pub uri: RedirectUri,
    pub params: T,
    pub kind: RedirectKind,
}

impl<T> Redirect<T> {
    pub fn new(uri: RedirectUri, params: T) -> Self {
        Redirect {
            uri,
            params,
            kind: RedirectKind::Temporary,
        }
    }

    /// Redirect answering a form submission; the user agent follows it
    /// with a GET.
    pub fn see_other(uri: RedirectUri, params: T) -> Self {
        Redirect {
            uri,
            params,
            kind: RedirectKind::SeeOther,
        }
    }
}
