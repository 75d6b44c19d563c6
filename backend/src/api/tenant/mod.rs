//! Module for tenant management API endpoints.
//!
//! Tenants are organizations identified by name and RUT. Every endpoint
//! here is restricted to superadmins.

pub mod handlers;
pub mod routes;
