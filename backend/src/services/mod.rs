//! Module for core business logic services.
//!
//! Services validate input, enforce uniqueness and existence rules, and
//! orchestrate the repositories. Handlers never talk to a repository
//! directly.

pub mod tenant_service;
pub mod user_service;
