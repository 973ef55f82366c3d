use cookie::{time::Duration, Cookie, SameSite};
use warp::http::{header, HeaderValue};
use warp::reply::Response;

use crate::provider::claims::SessionClaims;
use crate::core::types::Expire;

pub const SESSION_COOKIE: &str = "tw_session";

#[derive(Debug, Clone, Copy, Default)]
pub struct CookieSettings {
    pub secure: bool,
}

impl CookieSettings {
    fn build(&self, value: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, value))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(self.secure)
            .build()
    }

    pub fn session(&self, token: String) -> Cookie<'static> {
        let mut cookie = self.build(token);
        cookie.set_max_age(Duration::seconds(SessionClaims::EXPIRES_IN_SECS as i64));
        cookie
    }

    pub fn removal(&self) -> Cookie<'static> {
        let mut cookie = self.build(String::new());
        cookie.make_removal();
        cookie
    }
}

pub fn set_cookie(mut response: Response, cookie: Cookie<'_>) -> Response {
    if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}
