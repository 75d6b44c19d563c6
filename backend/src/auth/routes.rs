//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle signup, login, token refresh and logout, and are
//! nested under `/auth` in the main router.

use crate::auth::handlers::*;
use crate::auth::middleware::*;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/me", get(me).layer(middleware::from_fn(jwt_auth)))
}
