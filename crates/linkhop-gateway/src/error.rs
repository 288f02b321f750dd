use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use linkhop_redirector::RedirectorError;
use linkhop_shortener::LinkError;
use thiserror::Error;
use tracing::error;

use crate::model::ErrorResponse;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Redirect(#[from] RedirectorError),
    #[error("missing or invalid owner id")]
    Unauthorized,
    #[error("not found")]
    NotFound,
    #[error("{}", .0.body_text())]
    Json(#[from] JsonRejection),
    #[error("{}", .0.body_text())]
    Path(#[from] PathRejection),
    #[error("{}", .0.body_text())]
    Query(#[from] QueryRejection),
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Link(err) => match err {
                LinkError::CodeTaken(_) => (StatusCode::CONFLICT, "code_taken"),
                LinkError::AllocationExhausted { .. } => {
                    (StatusCode::SERVICE_UNAVAILABLE, "allocation_exhausted")
                }
                LinkError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
                LinkError::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
                LinkError::StoreUnavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
                }
                LinkError::InvalidUrl(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_url"),
                LinkError::InvalidShortCode(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "invalid_short_code")
                }
                LinkError::InvalidTitle(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_title"),
                LinkError::InvalidOwner(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
                LinkError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            AppError::Redirect(RedirectorError::StoreUnavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Json(rejection) => (rejection.status(), "invalid_request"),
            AppError::Path(rejection) => (rejection.status(), "invalid_request"),
            AppError::Query(rejection) => (rejection.status(), "invalid_request"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            error!(error = %self, status = %status, "request failed");
        }

        let body = ErrorResponse {
            error: kind,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
