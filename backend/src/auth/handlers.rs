//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for signup, login, token
//! refresh and logout, and delegate to `auth::service` for the logic.

use std::sync::Arc;

use crate::api::common::{ApiResponse, HttpError, error_response, service_error_to_http};
use crate::auth::cookies::{CookiePolicy, read_refresh_cookie};
use crate::auth::models::*;
use crate::auth::service::AuthService;
use crate::database::models::{SignupRequest, User};
use crate::services::user_service::UserService;
use crate::utils::jwt::TokenManager;
use axum::{
    Form,
    extract::{Extension, Json},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::Json as ResponseJson,
};
use sqlx::SqlitePool;

/// Handle self-service registration
#[axum::debug_handler]
pub async fn signup(
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<SignupRequest>,
) -> Result<ResponseJson<ApiResponse<User>>, HttpError> {
    let service = UserService::new(&pool);

    match service.create_user(payload.into()).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::success(
            user,
            "User registered successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle user login request
#[axum::debug_handler]
pub async fn login(
    Extension(pool): Extension<SqlitePool>,
    Extension(tokens): Extension<Arc<TokenManager>>,
    Extension(cookies): Extension<CookiePolicy>,
    Form(payload): Form<LoginRequest>,
) -> Result<(HeaderMap, ResponseJson<TokenResponse>), HttpError> {
    let pair = AuthService::new(&pool, &tokens)
        .login(payload)
        .await
        .map_err(service_error_to_http)?;

    let mut headers = HeaderMap::new();
    if let Some(cookie) = cookies.refresh_cookie(&pair.refresh_token) {
        headers.insert(SET_COOKIE, cookie);
    }

    Ok((headers, ResponseJson(TokenResponse::from(&pair))))
}

/// Handle token refresh request using the refresh cookie
#[axum::debug_handler]
pub async fn refresh_token(
    Extension(pool): Extension<SqlitePool>,
    Extension(tokens): Extension<Arc<TokenManager>>,
    headers: HeaderMap,
) -> Result<ResponseJson<TokenResponse>, HttpError> {
    let refresh_token = read_refresh_cookie(&headers).ok_or_else(|| {
        error_response(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Refresh token not found",
        )
    })?;

    match AuthService::new(&pool, &tokens).refresh(&refresh_token).await {
        Ok(token) => Ok(ResponseJson(token.into())),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Handle logout: revoke the refresh token and clear its cookie
#[axum::debug_handler]
pub async fn logout(
    Extension(pool): Extension<SqlitePool>,
    Extension(tokens): Extension<Arc<TokenManager>>,
    Extension(cookies): Extension<CookiePolicy>,
    headers: HeaderMap,
) -> Result<(HeaderMap, ResponseJson<serde_json::Value>), HttpError> {
    let refresh_token = read_refresh_cookie(&headers);

    AuthService::new(&pool, &tokens)
        .logout(refresh_token.as_deref())
        .await
        .map_err(service_error_to_http)?;

    let mut response_headers = HeaderMap::new();
    if let Some(cookie) = cookies.cleared_refresh_cookie() {
        response_headers.insert(SET_COOKIE, cookie);
    }

    Ok((
        response_headers,
        ResponseJson(serde_json::json!({
            "message": "Successfully logged out"
        })),
    ))
}

/// Get current user information from token
#[axum::debug_handler]
pub async fn me(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ResponseJson<ApiResponse<User>> {
    ResponseJson(ApiResponse::ok(user))
}
