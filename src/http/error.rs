//! Error responses for the HTTP layer

use crate::network::NetworkFileError;
use crate::report::ReportError;
use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::EdgeNotFound(_)
            | ReportError::EdgeFlagged(_)
            | ReportError::GeneNotFound(_)
            | ReportError::PathwayNotFound(_) => AppError::NotFound(err.to_string()),
            ReportError::MalformedExperiment(_) | ReportError::EdgeName(_) => {
                AppError::BadRequest(err.to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<NetworkFileError> for AppError {
    fn from(err: NetworkFileError) -> Self {
        match err {
            NetworkFileError::InvalidName(_) => AppError::BadRequest(err.to_string()),
            NetworkFileError::NotFound(_) => AppError::NotFound(err.to_string()),
            NetworkFileError::Csv(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
