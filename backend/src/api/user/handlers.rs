//! Handler functions for user profile and management API endpoints.
//!
//! These functions process requests for user data, interact with the user
//! service, and return user-specific information.

use crate::api::common::{
    ApiResponse, HttpError, PaginatedData, PaginationFilter, PaginationMeta,
    service_error_to_http,
};
use crate::auth::models::CurrentUser;
use crate::database::models::{CreateUser, UpdateCurrentUser, UpdateUser, User};
use crate::errors::ServiceError;
use crate::services::user_service::UserService;
use axum::{
    extract::{Extension, Json, Path, Query},
    response::Json as ResponseJson,
};
use serde::Deserialize;
use sqlx::SqlitePool;

/// Optional filters for the user listing.
#[derive(Debug, Deserialize)]
pub struct UserFilter {
    pub tenant_id: Option<String>,
}

/// Returns the authenticated user.
#[axum::debug_handler]
pub async fn get_current_user(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ResponseJson<ApiResponse<User>> {
    ResponseJson(ApiResponse::success(user, "User retrieved successfully"))
}

/// Updates the authenticated user's own profile.
#[axum::debug_handler]
pub async fn update_current_user(
    Extension(pool): Extension<SqlitePool>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<UpdateCurrentUser>,
) -> Result<ResponseJson<ApiResponse<User>>, HttpError> {
    let service = UserService::new(&pool);

    match service.update_user(&user.id, payload.into()).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::success(
            user,
            "User updated successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn create_user(
    Extension(pool): Extension<SqlitePool>,
    Json(payload): Json<CreateUser>,
) -> Result<ResponseJson<ApiResponse<User>>, HttpError> {
    let service = UserService::new(&pool);

    match service.create_user(payload).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::success(
            user,
            "User created successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn list_users(
    Extension(pool): Extension<SqlitePool>,
    Query(filter): Query<UserFilter>,
    Query(pagination): Query<PaginationFilter>,
) -> Result<ResponseJson<ApiResponse<PaginatedData<User>>>, HttpError> {
    let service = UserService::new(&pool);
    let (users, total) = service
        .list_users(filter.tenant_id.as_deref(), &pagination)
        .await
        .map_err(service_error_to_http)?;

    Ok(ResponseJson(ApiResponse::paginated(
        PaginatedData::new(users, total),
        PaginationMeta::from_filter(&pagination, total),
        "Users retrieved successfully",
    )))
}

/// Retrieves a user by its ID.
#[axum::debug_handler]
pub async fn get_user(
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<User>>, HttpError> {
    let user_service = UserService::new(&pool);
    let user = user_service.get_user_required(&id).await.map_err(|e| {
        tracing::error!("User not found for ID {}: {}", id, e);
        service_error_to_http(e)
    })?;

    Ok(ResponseJson(ApiResponse::success(
        user,
        "User retrieved successfully",
    )))
}

#[axum::debug_handler]
pub async fn update_user(
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUser>,
) -> Result<ResponseJson<ApiResponse<User>>, HttpError> {
    let service = UserService::new(&pool);

    match service.update_user(&id, payload).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::success(
            user,
            "User updated successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn delete_user(
    Extension(pool): Extension<SqlitePool>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<User>>, HttpError> {
    if current.id == id {
        return Err(service_error_to_http(ServiceError::invalid_operation(
            "Users cannot delete themselves",
        )));
    }

    tracing::info!("User {} deleting user {}", current.id, id);
    let service = UserService::new(&pool);

    match service.delete_user(&id).await {
        Ok(user) => Ok(ResponseJson(ApiResponse::success(
            user,
            "User deleted successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
