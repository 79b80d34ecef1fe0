use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

pub(super) const STATE_COOKIE: &str = "oauth_state";
pub(super) const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub(super) const REFRESH_TOKEN_COOKIE: &str = "refresh_token";
pub(super) const ACCOUNT_URI_COOKIE: &str = "uri";
pub(super) const PROFILE_PICTURE_COOKIE: &str = "profile_picture";

/// Spotify access tokens are valid for one hour.
const ACCESS_TOKEN_TTL: Duration = Duration::hours(1);
const REFRESH_TOKEN_TTL: Duration = Duration::days(30);
const STATE_TTL: Duration = Duration::minutes(5);

fn build(
    name: &'static str,
    value: String,
    secure: bool,
    max_age: Option<Duration>,
) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build();
    if let Some(max_age) = max_age {
        cookie.set_max_age(max_age);
    }
    cookie
}

/// The `state` cookie remembered between `/login` and `/callback`.
pub(super) fn state_cookie(state: &str, secure: bool) -> Cookie<'static> {
    build(STATE_COOKIE, state.to_string(), secure, Some(STATE_TTL))
}

pub(super) fn access_token_cookie(token: &str, secure: bool) -> Cookie<'static> {
    build(ACCESS_TOKEN_COOKIE, token.to_string(), secure, Some(ACCESS_TOKEN_TTL))
}

pub(super) fn refresh_token_cookie(token: &str, secure: bool) -> Cookie<'static> {
    build(REFRESH_TOKEN_COOKIE, token.to_string(), secure, Some(REFRESH_TOKEN_TTL))
}

pub(super) fn account_uri_cookie(uri: &str, secure: bool) -> Cookie<'static> {
    build(ACCOUNT_URI_COOKIE, uri.to_string(), secure, None)
}

pub(super) fn profile_picture_cookie(url: &str, secure: bool) -> Cookie<'static> {
    build(PROFILE_PICTURE_COOKIE, url.to_string(), secure, None)
}

/// Removal cookie matching the attributes the others were set with.
pub(super) fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").max_age(Duration::ZERO).build()
}

pub(super) fn value(jar: &PrivateCookieJar, name: &str) -> Option<String> {
    jar.get(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
