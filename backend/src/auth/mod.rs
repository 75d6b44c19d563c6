//! Authentication module for sessions and access control.
//!
//! This module provides login, token refresh and logout endpoints, the
//! refresh cookie contract, and the middleware that gates routes on a valid
//! access token and on the superadmin flag.

pub mod cookies;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
