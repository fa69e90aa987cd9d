use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{debug, error};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;
use crate::types::FieldError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request data")]
    Validation(Vec<FieldError>),

    #[error("not found")]
    NotFound,

    /// Logged in full, answered with `public` only.
    #[error("{public}: {cause}")]
    Internal {
        public: &'static str,
        cause: anyhow::Error,
    },
}

impl ApiError {
    pub fn internal(public: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            public,
            cause: source.into(),
        }
    }

    /// Maps a store failure, keeping the empty-number rejection a 400.
    pub fn from_store(public: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::EmptyPhoneNumber => Self::Validation(vec![FieldError::new(
                "phoneNumber",
                "Phone number is required",
            )]),
            other => Self::internal(public, other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                debug!("Rejected request: {:?}", errors);
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "message": "Invalid request data",
                        "errors": errors,
                    })),
                )
                    .into_response()
            }
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "Number not found" })),
            )
                .into_response(),
            ApiError::Internal { public, cause } => {
                error!("{}: {:#}", public, cause);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": public })),
                )
                    .into_response()
            }
        }
    }
}
