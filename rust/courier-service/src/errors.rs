use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use courier_core::CoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Decode(_) | CoreError::EmptySurface | CoreError::InvalidPlacement(_) => {
                AppError::BadRequest(e.to_string())
            }
            CoreError::NotReady | CoreError::StartDisabled | CoreError::NoPathFound { .. } => {
                AppError::Conflict(e.to_string())
            }
            CoreError::InsufficientGrid { .. } => AppError::Unprocessable(e.to_string()),
            CoreError::Io(io) => AppError::Internal(io.into()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorPayload<'a>,
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    code: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Unprocessable(_) => (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_grid"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        let message = match self {
            AppError::BadRequest(m) | AppError::Conflict(m) | AppError::Unprocessable(m) => m,
            AppError::Internal(e) => e.to_string(),
        };
        (status, Json(ErrorBody { error: ErrorPayload { code, message } })).into_response()
    }
}
