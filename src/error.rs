//! Error handling module
//!
//! Centralized error types and HTTP response conversion. Every error carries
//! an [`ErrorKind`]; the envelope layer owns the kind → status mapping.

use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::response::{ErrorItem, ErrorKind, Output};
use crate::api::validation::ValidationFailure;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// One or more request fields failed validation
    #[error("validation failed")]
    Validation(Vec<ValidationFailure>),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    // Server errors (5xx)
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Cache(#[from] redis::RedisError),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// Classify the failure; the envelope layer maps kind to HTTP status.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) | AppError::Config(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// The error sequence carried by the response envelope.
    pub fn error_items(&self) -> Vec<ErrorItem> {
        let kind = self.kind();
        match self {
            AppError::Validation(failures) => failures
                .iter()
                .map(|f| ErrorItem::from_kind(kind, format!("{}: failed '{}' validation", f.field, f.tag)))
                .collect(),
            other => vec![ErrorItem::from_kind(kind, other.to_string())],
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        if kind == ErrorKind::Internal {
            tracing::error!(error = %self, "request failed");
        }

        (kind.status(), Json(Output::from_errors(self.error_items()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_kind_classification() {
        assert_eq!(AppError::NotFound("product 1".into()).kind(), ErrorKind::NotFound);
        assert_eq!(AppError::Conflict("duplicate sku".into()).kind(), ErrorKind::Conflict);
        assert_eq!(AppError::Internal("boom".into()).kind(), ErrorKind::Internal);
        assert_eq!(AppError::Validation(vec![]).kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_kind_status_mapping() {
        assert_eq!(ErrorKind::Validation.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ErrorKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_items_carry_message_and_kind_code() {
        let items = AppError::Internal("db timeout".into()).error_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].message, "db timeout");
        assert_eq!(items[0].code, 500);

        let items = AppError::NotFound("product 42".into()).error_items();
        assert_eq!(items[0].message, "product 42 not found");
        assert_eq!(items[0].code, 404);
    }

    #[test]
    fn test_validation_produces_one_item_per_failure() {
        let failures = vec![
            ValidationFailure::new("name", "length", serde_json::json!("")),
            ValidationFailure::new("sku", "length", serde_json::json!("x")),
        ];
        let items = AppError::Validation(failures).error_items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].message, "name: failed 'length' validation");
        assert_eq!(items[0].code, 422);
    }
}
