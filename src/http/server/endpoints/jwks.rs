use std::sync::Arc;

use warp::http::StatusCode;
use warp::{Filter, Reply};

use crate::http::encoding::reply;
use crate::provider::OAuth2Provider;

const JWKS_METHODS: &str = "GET, OPTIONS";

pub fn jwks_endpoint(
    provider: Arc<OAuth2Provider>,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let with_provider = warp::any().map(move || provider.clone());

    let path = warp::path!("api" / "jwks")
        .or(warp::path!(".well-known" / "jwks.json"))
        .unify();

    let document = path
        .clone()
        .and(warp::get())
        .and(with_provider)
        .then(|provider: Arc<OAuth2Provider>| async move {
            reply::with_cors(reply::json_response(provider.jwks().await), JWKS_METHODS)
        });

    let preflight = path
        .and(warp::options())
        .map(|| reply::with_cors(StatusCode::NO_CONTENT.into_response(), JWKS_METHODS));

    document.or(preflight)
}
