//! Refresh token cookie handling.
//!
//! The refresh token travels only in an HTTP-only cookie named
//! `refresh_token`, `SameSite=Lax`, living as long as the token (7 days).

use axum::http::{HeaderMap, HeaderValue, header::COOKIE};

use crate::utils::jwt::REFRESH_TOKEN_TTL_DAYS;

pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

const REFRESH_COOKIE_MAX_AGE: i64 = REFRESH_TOKEN_TTL_DAYS * 24 * 60 * 60;

/// Whether cookies get the `Secure` attribute. Off only in debug mode.
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    pub secure: bool,
}

impl CookiePolicy {
    pub fn from_debug(debug: bool) -> Self {
        CookiePolicy { secure: !debug }
    }

    /// `Set-Cookie` value carrying a refresh token.
    pub fn refresh_cookie(&self, token: &str) -> Option<HeaderValue> {
        self.build(token, REFRESH_COOKIE_MAX_AGE)
    }

    /// `Set-Cookie` value that makes the browser drop the refresh cookie.
    pub fn cleared_refresh_cookie(&self) -> Option<HeaderValue> {
        self.build("", 0)
    }

    fn build(&self, value: &str, max_age: i64) -> Option<HeaderValue> {
        let mut cookie = format!(
            "{REFRESH_COOKIE_NAME}={value}; Max-Age={max_age}; Path=/; HttpOnly; SameSite=Lax"
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).ok()
    }
}

/// Reads the refresh token from the request's `Cookie` headers.
pub fn read_refresh_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == REFRESH_COOKIE_NAME && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
