//! Unified API error handling.
//!
//! Every handler returns `Result<_, ApiError>`. Errors are rendered in one JSON
//! envelope, `{"error": {"code", "message", "details"}}`, with the HTTP status
//! derived from the error code.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::QueryRejection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::db::MembershipError;

/// Error codes for API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Client errors (4xx)
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    ValidationError,

    // Server errors (5xx)
    InternalError,
    DatabaseError,
}

impl ErrorCode {
    /// Get the default HTTP status code for this error code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the string representation of the error code
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::InternalError => "internal_error",
            ErrorCode::DatabaseError => "database_error",
        }
    }
}

/// The inner error object in the response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Field-level validation errors, when there are any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
}

/// The full error response envelope
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    status: StatusCode,
    message: String,
    details: Option<HashMap<String, Vec<String>>>,
}

impl ApiError {
    /// Create a new API error with a specific code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.status_code(),
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Field-level errors, keyed by field name
    pub fn details(&self) -> Option<&HashMap<String, Vec<String>>> {
        self.details.as_ref()
    }

    // -------------------------------------------------------------------------
    // Convenience constructors for common error types
    // -------------------------------------------------------------------------

    /// Bad request error (400)
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Unauthorized error (401) - authentication required
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Forbidden error (403) - authenticated but not allowed
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Not found error (404)
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Conflict error (409) - membership or unique value already exists
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Validation error (400) with field-level details
    pub fn validation(errors: HashMap<String, Vec<String>>) -> Self {
        let message = if errors.len() == 1 {
            errors
                .values()
                .next()
                .and_then(|v| v.first())
                .cloned()
                .unwrap_or_else(|| "Validation failed".to_string())
        } else {
            format!("Validation failed for {} fields", errors.len())
        };

        let mut err = Self::new(ErrorCode::ValidationError, message);
        err.details = Some(errors);
        err
    }

    /// Single field validation error
    pub fn validation_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::validation(errors)
    }

    /// Internal server error (500)
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Database error (500)
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let response = ErrorResponse {
            error: ErrorBody {
                code: self.code.as_str().to_string(),
                message: self.message,
                details: self.details,
            },
        };

        (self.status, Json(response)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

// -------------------------------------------------------------------------
// Conversion implementations for common error types
// -------------------------------------------------------------------------

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);

        match &err {
            sqlx::Error::RowNotFound => ApiError::not_found("Resource not found"),
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if msg.contains("UNIQUE constraint failed") {
                    ApiError::conflict("A resource with this identifier already exists")
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    ApiError::bad_request("Referenced resource does not exist")
                } else {
                    ApiError::database("A database error occurred")
                }
            }
            _ => ApiError::database("A database error occurred"),
        }
    }
}

impl From<MembershipError> for ApiError {
    fn from(err: MembershipError) -> Self {
        match err {
            MembershipError::AlreadyExists(_) => ApiError::conflict(err.to_string()),
            MembershipError::NotFound(_) => ApiError::not_found(err.to_string()),
            MembershipError::SelfReference(_) => ApiError::validation_field("author", err.to_string()),
            MembershipError::Database(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.to_string())
    }
}

// -------------------------------------------------------------------------
// Builder for validation errors
// -------------------------------------------------------------------------

/// Builder for collecting multiple validation errors
#[derive(Debug, Default)]
pub struct ValidationErrorBuilder {
    errors: HashMap<String, Vec<String>>,
}

impl ValidationErrorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation error for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Build the ApiError if there are any errors
    pub fn build(self) -> Option<ApiError> {
        if self.errors.is_empty() {
            None
        } else {
            Some(ApiError::validation(self.errors))
        }
    }

    /// Return Ok(()) if no errors, or Err(ApiError) if there are errors
    pub fn finish(self) -> Result<(), ApiError> {
        match self.build() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_status_codes() {
        assert_eq!(ErrorCode::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::ValidationError.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::DatabaseError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::not_found("Recipe not found");
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Recipe not found");
    }

    #[test]
    fn test_validation_error_single_field() {
        let err = ApiError::validation_field("name", "Name is required");
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("Name is required"));
    }

    #[test]
    fn test_validation_error_multiple_fields() {
        let mut errors = HashMap::new();
        errors.insert("name".to_string(), vec!["Name is required".to_string()]);
        errors.insert("tags".to_string(), vec!["At least one tag is required".to_string()]);

        let err = ApiError::validation(errors);
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("2 fields"));
    }

    #[test]
    fn test_validation_error_builder() {
        let mut builder = ValidationErrorBuilder::new();
        builder.add("ingredients", "At least one ingredient is required");
        builder.add("amount", "Amount must be between 1 and 32767");
        builder.add("ingredients", "Ingredients must not repeat");

        assert!(!builder.is_empty());

        let err = builder.build().unwrap();
        let details = err.details().unwrap();
        assert_eq!(details.get("ingredients").unwrap().len(), 2);
        assert_eq!(details.get("amount").unwrap().len(), 1);
        assert!(!details.contains_key("tags"));
    }

    #[test]
    fn test_membership_errors_map_to_status() {
        assert_eq!(
            ApiError::from(MembershipError::AlreadyExists("favorites")).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(MembershipError::NotFound("shopping cart")).status(),
            StatusCode::NOT_FOUND
        );

        let err = ApiError::from(MembershipError::SelfReference("subscriptions"));
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(err.details().unwrap().contains_key("author"));

        let err = ApiError::from(MembershipError::Database(sqlx::Error::RowNotFound));
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
