//! Central module for organizing the application's main API endpoints.
//!
//! Tenant and user management live here; authentication routes are
//! handled separately in `auth`.

pub mod common;
pub mod tenant;
pub mod user;
