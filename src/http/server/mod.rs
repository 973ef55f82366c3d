use std::net::SocketAddr;
use std::sync::Arc;
use warp::{Filter, Rejection, Reply};

use crate::provider::OAuth2Provider;

mod endpoints;

use endpoints::{jwks::jwks_endpoint, oauth::oauth_endpoint, session::session_endpoint};

use super::encoding::{cookie::CookieSettings, error::handle_reject};

use tracing::{event, Level};

#[derive(Debug)]
pub struct Server {
    provider: Arc<OAuth2Provider>,
    cookies: CookieSettings,
}

impl Server {
    pub fn new(provider: Arc<OAuth2Provider>) -> Self {
        Self {
            provider,
            cookies: CookieSettings::default(),
        }
    }

    /// Marks the session cookie `Secure`.
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.cookies.secure = secure;
        self
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let provider = self.provider.clone();

        let oauth = oauth_endpoint(provider.clone());
        let session = session_endpoint(provider.clone(), self.cookies);
        let jwks = jwks_endpoint(provider);

        oauth
            .or(session)
            .or(jwks)
            .recover(handle_reject)
            .with(warp::log("inkan::http"))
    }

    pub async fn serve(self, addr: SocketAddr) {
        let routes = self.routes();

        event!(Level::INFO, %addr, "Listening");
        warp::serve(routes).run(addr).await;
    }
}
