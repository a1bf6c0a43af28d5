use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dayplan_core::error::{self, ApiError};
use dayplan_core::repair::RepairError;
use dayplan_core::validation::ValidationError;

use crate::providers::ProviderError;
use crate::store::StoreError;

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Missing or rejected bearer token (401)
    Unauthorized {
        message: String,
        docs_hint: Option<String>,
    },
    /// Resource not found, or owned by someone else (404)
    NotFound { resource: String },
    /// Upstream provider failed where it is essential (500)
    Provider(ProviderError),
    /// Completion text held no recoverable schedule (500)
    AiResponseUnrecoverable { preview: String },
    /// Database error (500)
    Store(StoreError),
    /// Internal error (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::Unauthorized { message, docs_hint } => (
                StatusCode::UNAUTHORIZED,
                ApiError {
                    error: error::codes::UNAUTHORIZED.to_string(),
                    message,
                    field: None,
                    received: None,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    message: format!("{resource} not found"),
                    field: None,
                    received: None,
                    request_id,
                    docs_hint: None,
                },
            ),
            AppError::Provider(err) => {
                tracing::error!(provider = err.provider(), "Provider error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::PROVIDER_FAILED.to_string(),
                        message: format!("The {} is unavailable", err.provider()),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
            AppError::AiResponseUnrecoverable { preview } => {
                tracing::error!(preview = %preview, "AI response could not be recovered");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::AI_RESPONSE_UNRECOVERABLE.to_string(),
                        message: "The planning model returned text with no recoverable schedule"
                            .to_string(),
                        field: None,
                        received: Some(serde_json::Value::String(preview)),
                        request_id,
                        docs_hint: Some("Retry POST /api/plan to generate a new plan.".to_string()),
                    },
                )
            }
            AppError::Store(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "A database error occurred".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::Provider(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation {
            message: err.message,
            field: Some(err.field),
            received: err.received,
            docs_hint: None,
        }
    }
}

impl From<RepairError> for AppError {
    fn from(err: RepairError) -> Self {
        match err {
            RepairError::Unrecoverable { preview } => AppError::AiResponseUnrecoverable { preview },
        }
    }
}
