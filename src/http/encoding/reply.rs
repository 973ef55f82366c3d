use super::error::AuthRejection;
use crate::auth::{Redirect, RedirectKind};
use crate::core::types::RedirectUri;
use url::Url;
use warp::http::{header, HeaderValue, StatusCode};
use warp::reply::{Reply, Response};
use warp::Rejection;

use tracing::{event, Level};

fn append_params(r: &RedirectUri, p: impl serde::Serialize) -> Option<Url> {
    let mut url = Url::parse(&r.0).ok()?;
    let new_qs = serde_urlencoded::to_string(p).ok()?;
    let pairs = form_urlencoded::parse(new_qs.as_bytes());
    url.query_pairs_mut().extend_pairs(pairs);
    Some(url)
}

pub fn redirect_response<T: serde::Serialize>(redirect: &Redirect<T>) -> Response {
    let status = match redirect.kind {
        RedirectKind::Temporary => StatusCode::TEMPORARY_REDIRECT,
        RedirectKind::SeeOther => StatusCode::SEE_OTHER,
    };

    let location = append_params(&redirect.uri, &redirect.params)
        .and_then(|url| HeaderValue::from_str(url.as_str()).ok());

    match location {
        Some(location) => {
            let mut response = Response::new(warp::hyper::Body::empty());
            *response.status_mut() = status;
            response.headers_mut().insert(header::LOCATION, location);
            response
        }
        None => {
            event!(Level::ERROR, uri = %redirect.uri.0, "Failed to build redirect location");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

impl<T: serde::Serialize + Send> Reply for Redirect<T> {
    fn into_response(self) -> Response {
        redirect_response(&self)
    }
}

/// Headers answered on the token and key endpoints, which are called
/// straight from browser apps. `methods` lists what the route accepts.
pub fn with_cors(mut response: Response, methods: &'static str) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(methods),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type, authorization"),
    );
    response
}

pub fn json_encode(
    value: Result<impl serde::Serialize, impl Into<AuthRejection>>,
) -> Result<impl Reply, Rejection> {
    value
        .map(|v| warp::reply::json(&v))
        .map_err(|e| warp::reject::custom::<AuthRejection>(e.into()))
}

/// Like [`json_encode`], but errors are answered in place instead of
/// rejecting.
pub fn json_response(value: Result<impl serde::Serialize, impl Into<AuthRejection>>) -> Response {
    match value {
        Ok(v) => warp::reply::json(&v).into_response(),
        Err(e) => {
            let rejection: AuthRejection = e.into();
            rejection.into_response()
        }
    }
}

pub fn reply<T, E>(result: Result<T, E>) -> Result<Response, Rejection>
where
    T: Reply,
    E: Into<AuthRejection>,
{
    result
        .map(|t| t.into_response())
        .map_err(|e| warp::reject::custom(e.into()))
}
