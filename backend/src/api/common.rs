//! Shared response envelope and error mapping for API handlers.
//!
//! Provides structured responses and conversion between service-layer errors
//! and HTTP responses. Includes:
//! - Standard success/error response format
//! - ServiceError to HTTP status code mapping
//! - Pagination support for list endpoints
//!
//! # Response Format
//! All errors return consistent JSON responses containing:
//! - `message`: Human-readable message
//! - `error.error_type`: Machine-readable error category
//!
//! Paginated responses include:
//! - `pagination`: Metadata about current page, total items, etc.
//!
//! # Error Handling Flow
//! 1. Service layer returns domain-specific `ServiceError`
//! 2. `service_error_to_http` converts to the matching status and body
//! 3. `Unauthorized` additionally carries `WWW-Authenticate: Bearer`

use crate::errors::ServiceError;
use axum::Json;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header::WWW_AUTHENTICATE};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Error half of every handler result.
pub type HttpError = (StatusCode, HeaderMap, Json<ApiResponse<()>>);

/// Standard API response wrapper for all endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message
    pub message: String,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    /// Pagination metadata (present for paginated responses)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
    /// Request timestamp
    pub timestamp: String,
}

/// Pagination metadata for list responses
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Current page number (1-indexed)
    pub current_page: u32,
    /// Number of items per page
    pub per_page: u32,
    /// Total number of items across all pages
    pub total_items: u64,
    /// Total number of pages
    pub total_pages: u32,
    /// Whether there is a next page
    pub has_next: bool,
    /// Whether there is a previous page
    pub has_prev: bool,
    /// Next page number (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u32>,
    /// Previous page number (if available)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<u32>,
}

/// Paginated response wrapper containing items and pagination metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedData<T> {
    /// List of items for current page
    pub items: Vec<T>,
    /// Total count of items (redundant with pagination.total_items but convenient)
    pub total: u64,
}

/// Error details for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error type identifier
    pub error_type: String,
}

/// Pagination parameters for requests
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PaginationFilter {
    /// Page number (1-indexed)
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Number of items per page
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
}

impl PaginationMeta {
    /// Create pagination metadata from page parameters and total count
    pub fn new(current_page: u32, per_page: u32, total_items: u64) -> Self {
        let total_pages = if total_items == 0 {
            1
        } else {
            ((total_items - 1) / per_page as u64 + 1) as u32
        };

        let has_next = current_page < total_pages;
        let has_prev = current_page > 1;

        Self {
            current_page,
            per_page,
            total_items,
            total_pages,
            has_next,
            has_prev,
            next_page: if has_next {
                Some(current_page + 1)
            } else {
                None
            },
            prev_page: if has_prev {
                Some(current_page - 1)
            } else {
                None
            },
        }
    }

    pub fn from_filter(filter: &PaginationFilter, total_items: u64) -> Self {
        Self::new(filter.page(), filter.per_page(), total_items)
    }
}

impl<T> PaginatedData<T> {
    /// Create a new paginated data wrapper
    pub fn new(items: Vec<T>, total: u64) -> Self {
        Self { items, total }
    }
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            pagination: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a successful response with default message
    pub fn ok(data: T) -> Self {
        Self::success(data, "Request successful")
    }

    /// Create a successful paginated response
    pub fn paginated(data: T, pagination: PaginationMeta, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            pagination: Some(pagination),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create an error response
    pub fn error(message: impl Into<String>, error_type: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: message.into(),
            error: Some(ErrorDetails {
                error_type: error_type.into(),
            }),
            pagination: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl PaginationFilter {
    /// Get page number with default
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Get per_page with default
    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(20)
    }

    /// Calculate offset for database queries
    pub fn offset(&self) -> u64 {
        (self.page() as u64 - 1) * self.per_page() as u64
    }

    /// Get limit for database queries
    pub fn limit(&self) -> u64 {
        self.per_page() as u64
    }
}

impl Default for PaginationFilter {
    fn default() -> Self {
        Self {
            page: Some(1),
            per_page: Some(20),
        }
    }
}

/// Builds an error response with the standard envelope.
pub fn error_response(
    status: StatusCode,
    error_type: &str,
    message: impl Into<String>,
) -> HttpError {
    let mut headers = HeaderMap::new();
    if status == StatusCode::UNAUTHORIZED {
        headers.insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    (
        status,
        headers,
        Json(ApiResponse::<()>::error(message, error_type)),
    )
}

/// Converts ServiceError to appropriate HTTP response with standard format
pub fn service_error_to_http(error: ServiceError) -> HttpError {
    let (status, error_type, message) = match error {
        ServiceError::Validation { message } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", message)
        }
        ServiceError::NotFound { entity, identifier } => (
            StatusCode::NOT_FOUND,
            "not_found",
            format!("{} '{}' not found", entity, identifier),
        ),
        ServiceError::AlreadyExists { entity, identifier } => (
            StatusCode::CONFLICT,
            "already_exists",
            format!("{} '{}' already exists", entity, identifier),
        ),
        ServiceError::Unauthorized { message } => {
            tracing::debug!("Unauthorized: {}", message);
            (StatusCode::UNAUTHORIZED, "unauthorized", message)
        }
        ServiceError::PermissionDenied { message } => {
            (StatusCode::FORBIDDEN, "permission_denied", message)
        }
        ServiceError::InvalidOperation { message } => {
            (StatusCode::BAD_REQUEST, "invalid_operation", message)
        }
        ServiceError::Database { source } => {
            tracing::error!("Database error: {}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                "Internal server error".to_string(),
            )
        }
        ServiceError::InternalError { message } => {
            tracing::error!("Internal error: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".to_string(),
            )
        }
    };

    error_response(status, error_type, message)
}
