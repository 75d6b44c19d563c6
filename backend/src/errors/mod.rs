//! Global application error types.
//!
//! Every service and repository failure is funnelled into [`ServiceError`],
//! which the HTTP layer turns into a status code and the standard
//! `ApiResponse` error envelope (see `api::common::service_error_to_http`).

use thiserror::Error;

/// Generic service error that can be used across all entities
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("{entity} already exists: {identifier}")]
    AlreadyExists { entity: String, identifier: String },

    /// Authentication failed. The message is meant for logs; all
    /// credential failures are one kind to callers.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Database error: {source}")]
    Database {
        #[from]
        source: anyhow::Error,
    },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    // Helper constructors for common patterns

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn already_exists(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::AlreadyExists {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::InternalError {
            message: message.into(),
        }
    }

    /// Collapses `validator` field errors into a single readable message.
    pub fn from_validation_errors(errors: &validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error.message.as_ref().unwrap_or(&"Invalid value".into())
                    )
                })
            })
            .collect();
        Self::validation(messages.join(", "))
    }

    /// Maps a write rejected by a UNIQUE index to `AlreadyExists`. Any other
    /// failure stays a database error.
    pub fn from_write_error(
        error: anyhow::Error,
        entity: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        let unique_violation = error
            .downcast_ref::<sqlx::Error>()
            .and_then(sqlx::Error::as_database_error)
            .is_some_and(|db_error| db_error.is_unique_violation());

        if unique_violation {
            Self::already_exists(entity, identifier)
        } else {
            Self::Database { source: error }
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_write_errors_stay_database_errors() {
        let error = ServiceError::from_write_error(
            anyhow::anyhow!("disk I/O error"),
            "Tenant",
            "760864285",
        );
        assert!(matches!(error, ServiceError::Database { .. }));

        let error = ServiceError::from_write_error(
            sqlx::Error::RowNotFound.into(),
            "Tenant",
            "760864285",
        );
        assert!(matches!(error, ServiceError::Database { .. }));
    }
}
