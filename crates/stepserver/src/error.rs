use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use stepcore::ExecutionId;
use stepruntime::SubmitError;
use thiserror::Error;

/// Message returned in place of internal error details
const INTERNAL_MESSAGE: &str = "An unexpected error occurred";

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error("Execution {0} not found")]
    ExecutionNotFound(ExecutionId),

    #[error("Execution {0} has already finished")]
    ExecutionFinished(ExecutionId),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Submit(e) => e.code(),
            ApiError::ExecutionNotFound(_) => "EXECUTION_NOT_FOUND",
            ApiError::ExecutionFinished(_) => "EXECUTION_FINISHED",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Submit(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Submit(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ExecutionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ExecutionFinished(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Submit(SubmitError::Internal(_)) => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.code().to_string(),
            message,
        })
    }
}
