//! Defines the HTTP routes for user profile and management.

use super::handlers::{
    create_user, delete_user, get_current_user, get_user, list_users, update_current_user,
    update_user,
};
use crate::auth::middleware::{jwt_auth, superadmin_auth};
use axum::{
    Router, middleware,
    routing::{get, post},
};

pub fn user_router() -> Router {
    let profile = Router::new()
        .route("/me", get(get_current_user).put(update_current_user))
        .route_layer(middleware::from_fn(jwt_auth));

    let admin = Router::new()
        .route("/", post(create_user).get(list_users))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route_layer(middleware::from_fn(superadmin_auth))
        .route_layer(middleware::from_fn(jwt_auth));

    profile.merge(admin)
}
