use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use cookie::time::Duration;
use cookie::{Cookie, SameSite};

/// Cookie carrying the provider-issued identity token.
pub const ID_TOKEN_COOKIE: &str = "id_token";
/// Cookie carrying the opaque server session token.
pub const SESSION_TOKEN_COOKIE: &str = "session_token";

/// Returns the value of the first cookie named `name`, if any.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

/// Builds the `Set-Cookie` value for a freshly minted session token.
pub fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> String {
    Cookie::build((SESSION_TOKEN_COOKIE, token.to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(max_age_seconds))
        .build()
        .to_string()
}

/// Builds a `Set-Cookie` value that expires the named cookie immediately.
pub fn removal_cookie(name: &'static str, secure: bool) -> String {
    let mut cookie = Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    cookie.make_removal();
    cookie.to_string()
}
