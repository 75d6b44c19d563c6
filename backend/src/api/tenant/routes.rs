//! Defines the HTTP routes for tenant management.

use super::handlers::{
    create_tenant, delete_tenant, get_tenant, get_tenant_by_rut, list_tenants, update_tenant,
};
use crate::auth::middleware::{jwt_auth, superadmin_auth};
use axum::{
    Router, middleware,
    routing::{get, post},
};

pub fn tenant_router() -> Router {
    Router::new()
        .route("/", post(create_tenant).get(list_tenants))
        .route("/by-rut/{rut}", get(get_tenant_by_rut))
        .route(
            "/{id}",
            get(get_tenant).put(update_tenant).delete(delete_tenant),
        )
        .route_layer(middleware::from_fn(superadmin_auth))
        .route_layer(middleware::from_fn(jwt_auth))
}
