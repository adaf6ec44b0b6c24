use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::database::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Server misconfiguration")]
    Misconfigured,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        source: StoreError,
    },
}

impl AppError {
    /// Wraps a store failure with the message the caller should see.
    pub fn store(context: &'static str) -> impl FnOnce(StoreError) -> AppError {
        move |source| AppError::Store { context, source }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Empty exports answer with plain text, not a JSON error body.
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),

            AppError::Store { context, source } => {
                error!("{context}: {source}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": context })),
                )
                    .into_response()
            }

            other => {
                let status = match other {
                    AppError::Validation(_) => StatusCode::BAD_REQUEST,
                    AppError::Unauthorized => StatusCode::UNAUTHORIZED,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };

                (status, Json(json!({ "error": other.to_string() }))).into_response()
            }
        }
    }
}
