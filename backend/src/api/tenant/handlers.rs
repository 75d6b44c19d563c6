//! Handler functions for tenant management API endpoints.

use crate::api::common::{
    ApiResponse, HttpError, PaginatedData, PaginationFilter, PaginationMeta,
    service_error_to_http,
};
use crate::auth::models::CurrentUser;
use crate::database::models::{CreateTenant, Tenant, UpdateTenant};
use crate::services::tenant_service::TenantService;
use axum::{
    extract::{Extension, Json, Path, Query},
    response::Json as ResponseJson,
};
use sqlx::SqlitePool;

#[axum::debug_handler]
pub async fn create_tenant(
    Extension(pool): Extension<SqlitePool>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateTenant>,
) -> Result<ResponseJson<ApiResponse<Tenant>>, HttpError> {
    tracing::info!("User {} creating tenant {}", user.id, payload.name);
    let service = TenantService::new(&pool);

    match service.create_tenant(payload).await {
        Ok(tenant) => Ok(ResponseJson(ApiResponse::success(
            tenant,
            "Tenant created successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn list_tenants(
    Extension(pool): Extension<SqlitePool>,
    Query(pagination): Query<PaginationFilter>,
) -> Result<ResponseJson<ApiResponse<PaginatedData<Tenant>>>, HttpError> {
    let service = TenantService::new(&pool);
    let (tenants, total) = service
        .list_tenants(&pagination)
        .await
        .map_err(service_error_to_http)?;

    Ok(ResponseJson(ApiResponse::paginated(
        PaginatedData::new(tenants, total),
        PaginationMeta::from_filter(&pagination, total),
        "Tenants retrieved successfully",
    )))
}

#[axum::debug_handler]
pub async fn get_tenant(
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<Tenant>>, HttpError> {
    let service = TenantService::new(&pool);

    match service.get_tenant_required(&id).await {
        Ok(tenant) => Ok(ResponseJson(ApiResponse::success(
            tenant,
            "Tenant retrieved successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn get_tenant_by_rut(
    Extension(pool): Extension<SqlitePool>,
    Path(rut): Path<String>,
) -> Result<ResponseJson<ApiResponse<Tenant>>, HttpError> {
    let service = TenantService::new(&pool);

    match service.get_tenant_by_rut(&rut).await {
        Ok(tenant) => Ok(ResponseJson(ApiResponse::success(
            tenant,
            "Tenant retrieved successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn update_tenant(
    Extension(pool): Extension<SqlitePool>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTenant>,
) -> Result<ResponseJson<ApiResponse<Tenant>>, HttpError> {
    let service = TenantService::new(&pool);

    match service.update_tenant(&id, payload).await {
        Ok(tenant) => Ok(ResponseJson(ApiResponse::success(
            tenant,
            "Tenant updated successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

#[axum::debug_handler]
pub async fn delete_tenant(
    Extension(pool): Extension<SqlitePool>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<Tenant>>, HttpError> {
    tracing::info!("User {} deleting tenant {}", user.id, id);
    let service = TenantService::new(&pool);

    match service.delete_tenant(&id).await {
        Ok(tenant) => Ok(ResponseJson(ApiResponse::success(
            tenant,
            "Tenant deleted successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
