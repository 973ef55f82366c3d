use std::sync::Arc;

use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::{Filter, Reply};

use crate::auth::{AuthorizeParams, ConsentRequest, TokenRequest};
use crate::http::encoding::{self, reply};
use crate::provider::OAuth2Provider;

const TOKEN_METHODS: &str = "POST, OPTIONS";

pub fn oauth_endpoint(
    provider: Arc<OAuth2Provider>,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let with_provider = warp::any().map(move || provider.clone());

    let consent_document = warp::path!("authorize")
        .and(warp::get())
        .and(with_provider.clone())
        .and(warp::query::<AuthorizeParams>())
        .and(encoding::session())
        .and_then(
            |provider: Arc<OAuth2Provider>, params, session: Option<String>| async move {
                let result = provider
                    .authorization_request(params, session.as_deref())
                    .await;
                reply::json_encode(result)
            },
        );

    // Either a redirect carrying the code, or an error redirect.
    let create_code = warp::path!("authorize")
        .and(warp::post())
        .and(with_provider.clone())
        .and(encoding::session())
        .and(encoding::content_type())
        .and(warp::body::bytes())
        .and_then(
            |provider: Arc<OAuth2Provider>,
             session: Option<String>,
             content_type: Option<String>,
             body: Bytes| async move {
                let result = match ConsentRequest::decode(content_type.as_deref(), &body) {
                    Ok(consent) => provider.create_code(session.as_deref(), consent).await,
                    Err(e) => Err(provider.undecodable_consent(e)),
                };
                reply::reply(result)
            },
        );

    // Answers in place so that errors carry the CORS headers too.
    let token = warp::path!("api" / "token")
        .and(warp::post())
        .and(with_provider.clone())
        .and(warp::body::bytes())
        .then(|provider: Arc<OAuth2Provider>, body: Bytes| async move {
            let result = match TokenRequest::from_json(&body) {
                Ok(req) => provider.access_token_request(req).await,
                Err(e) => Err(e),
            };
            reply::with_cors(reply::json_response(result), TOKEN_METHODS)
        });

    let preflight = warp::path!("api" / "token")
        .and(warp::options())
        .map(|| reply::with_cors(StatusCode::NO_CONTENT.into_response(), TOKEN_METHODS));

    consent_document.or(create_code).or(token).or(preflight)
}
