use std::sync::Arc;

use warp::http::StatusCode;
use warp::{Filter, Reply};

use crate::auth::session::{LoginRequest, PayloadRequest};
use crate::auth::{SessionError, SessionErrorKind};
use crate::http::encoding::{self, cookie::CookieSettings, reply};
use crate::provider::OAuth2Provider;

pub fn session_endpoint(
    provider: Arc<OAuth2Provider>,
    cookies: CookieSettings,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let with_provider = warp::any().map(move || provider.clone());

    let payload = warp::path!("payload")
        .and(warp::post())
        .and(with_provider.clone())
        .and(warp::body::json())
        .and_then(|provider: Arc<OAuth2Provider>, req: PayloadRequest| async move {
            reply::json_encode(provider.login_payload(req))
        });

    let login = warp::path!("login")
        .and(warp::post())
        .and(with_provider.clone())
        .and(warp::body::json())
        .and_then(move |provider: Arc<OAuth2Provider>, req: LoginRequest| async move {
            let (session, token) = provider.login(req).map_err(|e| {
                warp::reject::custom(encoding::error::AuthRejection::from(e))
            })?;
            let response = warp::reply::json(&session).into_response();
            Ok::<_, warp::Rejection>(encoding::cookie::set_cookie(
                response,
                cookies.session(token),
            ))
        });

    let session = warp::path!("session")
        .and(warp::get())
        .and(with_provider.clone())
        .and(encoding::session())
        .and_then(|provider: Arc<OAuth2Provider>, session: Option<String>| async move {
            reply::json_encode(
                provider
                    .current_session(session.as_deref())
                    .ok_or_else(|| SessionError::from(SessionErrorKind::LoginRequired)),
            )
        });

    let logout = warp::path!("logout").and(warp::post()).map(move || {
        encoding::cookie::set_cookie(
            StatusCode::NO_CONTENT.into_response(),
            cookies.removal(),
        )
    });

    warp::path!("api" / "auth" / ..).and(payload.or(login).or(session).or(logout))
}
