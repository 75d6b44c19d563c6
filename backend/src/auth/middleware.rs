//! Middleware for protecting authenticated routes and handling authorization.
//!
//! `jwt_auth` validates the bearer access token and loads the current user;
//! `superadmin_auth` must be layered inside it.

use std::sync::Arc;

use crate::api::common::{HttpError, error_response, service_error_to_http};
use crate::auth::models::CurrentUser;
use crate::auth::service::AuthService;
use crate::utils::jwt::TokenManager;
use axum::{
    extract::{Extension, Request},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use sqlx::SqlitePool;

/// JWT authentication middleware
pub async fn jwt_auth(
    Extension(pool): Extension<SqlitePool>,
    Extension(tokens): Extension<Arc<TokenManager>>,
    mut request: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        error_response(StatusCode::UNAUTHORIZED, "unauthorized", "Not authenticated")
    })?;

    let (claims, user) = AuthService::new(&pool, &tokens)
        .authenticate(token)
        .await
        .map_err(service_error_to_http)?;

    tracing::debug!(
        "Authenticated user {} with token {} for {}",
        user.id,
        claims.jti,
        request.uri()
    );
    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

/// Extracts the credentials of an `Authorization: Bearer` header. The scheme
/// name is matched case-insensitively.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.trim_start().split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Superadmin authorization middleware
pub async fn superadmin_auth(request: Request, next: Next) -> Result<Response, HttpError> {
    let CurrentUser(user) = request.extensions().get::<CurrentUser>().ok_or_else(|| {
        error_response(StatusCode::UNAUTHORIZED, "unauthorized", "Not authenticated")
    })?;

    if !user.is_superadmin {
        tracing::warn!("User {} denied superadmin route {}", user.id, request.uri());
        return Err(error_response(
            StatusCode::FORBIDDEN,
            "permission_denied",
            "The user doesn't have enough privileges",
        ));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("BEARER  abc.def ")), Some("abc.def"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearer   ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
