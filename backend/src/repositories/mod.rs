//! Data access layer.
//!
//! Each repository wraps a borrowed `SqlitePool` and owns the SQL for one
//! table. Soft-deleted rows are filtered out of every read.

pub mod revoked_token_repository;
pub mod tenant_repository;
pub mod user_repository;
