pub mod cookie;
pub mod error;
pub mod reply;

use warp::{Filter, Rejection};

use self::cookie::SESSION_COOKIE;

/// The raw session token, when the browser sent one.
pub fn session() -> impl Filter<Extract = (Option<String>,), Error = std::convert::Infallible> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE)
}

/// The request content type, used to choose between form and JSON bodies.
pub fn content_type() -> impl Filter<Extract = (Option<String>,), Error = Rejection> + Clone {
    warp::header::optional::<String>("content-type")
}
