//! Module for user management API endpoints.
//!
//! `/me` endpoints serve any active user; the rest are superadmin-only.

pub mod handlers;
pub mod routes;
