//! Collection of general utility functions.
//!
//! Holds the RUT checksum validator and the JWT token lifecycle manager,
//! neither of which depends on the HTTP layer.

pub mod jwt;
pub mod rut;
