use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// One schema violation in a request.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
pub struct ValidationDetail {
    /// JSON pointer into the request, empty for the request itself
    pub path: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<ValidationDetail>,
    },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>, details: Vec<ValidationDetail>) -> ApiError {
        ApiError::Validation {
            message: message.into(),
            details,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Serialize)]
struct ErrorEnvelope {
    success: bool,
    error: ErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message,
                    details: Some(details),
                },
            ),
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "Internal server error".to_string(),
                        details: None,
                    },
                )
            }
        };

        (
            status,
            Json(ErrorEnvelope {
                success: false,
                error,
            }),
        )
            .into_response()
    }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
