use crate::auth::{
    AccessTokenError, AccessTokenErrorKind, AuthorizationError, AuthorizationErrorResponse,
    BadRequest, ErrorResponse, MaybeRedirect, Redirect, SessionError, SessionErrorKind,
};
use crate::provider::Error;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Rejection, Reply};

use super::reply::redirect_response;

use tracing::{event, Level};

#[derive(Debug)]
pub enum AuthRejection {
    Authorization(Redirect<AuthorizationErrorResponse>),
    BadRequest(BadRequest),
    AccessToken(AccessTokenError),
    Session(SessionError),
    Internal(Error),
}

impl warp::reject::Reject for AuthRejection {}

impl From<Redirect<AuthorizationErrorResponse>> for AuthRejection {
    fn from(error: Redirect<AuthorizationErrorResponse>) -> Self {
        Self::Authorization(error)
    }
}

impl From<AuthorizationError> for AuthRejection {
    fn from(error: AuthorizationError) -> Self {
        match error {
            MaybeRedirect::Redirected(r) => Self::from(r),
            MaybeRedirect::Direct(d) => Self::BadRequest(d),
        }
    }
}

impl From<AccessTokenError> for AuthRejection {
    fn from(error: AccessTokenError) -> Self {
        Self::AccessToken(error)
    }
}

impl From<SessionError> for AuthRejection {
    fn from(error: SessionError) -> Self {
        Self::Session(error)
    }
}

impl From<Error> for AuthRejection {
    fn from(error: Error) -> Self {
        Self::Internal(error)
    }
}

fn json_status(body: &impl serde::Serialize, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

impl AuthRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Authorization(redirect) => match redirect.kind {
                crate::auth::RedirectKind::Temporary => StatusCode::TEMPORARY_REDIRECT,
                crate::auth::RedirectKind::SeeOther => StatusCode::SEE_OTHER,
            },
            Self::BadRequest(BadRequest::MissingRedirect) => StatusCode::NOT_FOUND,
            Self::BadRequest(BadRequest::InvalidRedirect | BadRequest::InvalidRequest) => {
                StatusCode::BAD_REQUEST
            }
            Self::BadRequest(BadRequest::LoginRequired) => StatusCode::UNAUTHORIZED,
            Self::AccessToken(e) => match e.kind {
                AccessTokenErrorKind::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Session(e) => match e.kind {
                SessionErrorKind::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
                SessionErrorKind::LoginRequired => StatusCode::UNAUTHORIZED,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn response(&self) -> Response {
        let status = self.status();
        match self {
            Self::Authorization(redirect) => redirect_response(redirect),
            Self::BadRequest(kind) => json_status(&ErrorResponse::new(*kind), status),
            Self::AccessToken(e) => json_status(e, status),
            Self::Session(e) => json_status(e, status),
            Self::Internal(e) => {
                event!(Level::ERROR, error = %e, "Internal error");
                json_status(&ErrorResponse::new(AccessTokenErrorKind::ServerError), status)
            }
        }
    }
}

impl Reply for AuthRejection {
    fn into_response(self) -> Response {
        self.response()
    }
}

pub async fn handle_reject(err: Rejection) -> Result<Response, Rejection> {
    match err.find::<AuthRejection>() {
        Some(e) => Ok(e.response()),
        None => Err(err),
    }
}
