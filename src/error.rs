use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failures of the signal pipeline itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("Insufficient data: got {got} candles, need at least {required}")]
    InsufficientData { got: usize, required: usize },

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ExternalApi(_) => StatusCode::BAD_GATEWAY,
            AppError::Signal(SignalError::InsufficientData { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Signal(_) => StatusCode::BAD_REQUEST,
            AppError::Reqwest(_) => StatusCode::BAD_GATEWAY,
            AppError::SerdeJson(_) => StatusCode::BAD_GATEWAY,
            AppError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
