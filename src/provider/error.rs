use std::sync::Arc;

use crate::{
    auth::{MaybeRedirect, Redirect, WithState},
    core::types::RedirectUri,
    keys::KeyError,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("signing keys are unavailable: {0}")]
    Keys(#[from] Arc<KeyError>),
    #[error("token rejected: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("token was minted as {found:?}, expected {expected:?}")]
    WrongTokenUse {
        expected: crate::provider::claims::TokenUse,
        found: crate::provider::claims::TokenUse,
    },
}

pub trait ResultExt<T, E> {
    fn without_redirect<R>(self) -> Result<T, MaybeRedirect<R, E>>;
    fn add_redirect_context<D>(self, uri: RedirectUri) -> Result<T, MaybeRedirect<E, D>>;
    fn add_state_context(self, state: &Option<String>) -> Result<T, WithState<E>>;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn without_redirect<R>(self) -> Result<T, MaybeRedirect<R, E>> {
        self.map_err(|e| MaybeRedirect::Direct(e))
    }

    fn add_redirect_context<D>(self, uri: RedirectUri) -> Result<T, MaybeRedirect<E, D>> {
        self.map_err(|e| MaybeRedirect::Redirected(Redirect::new(uri, e)))
    }

    fn add_state_context(self, state: &Option<String>) -> Result<T, WithState<E>> {
        self.map_err(|e| WithState {
            state: state.clone(),
            inner: e,
        })
    }
}
