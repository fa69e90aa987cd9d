use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use log::info;

use crate::error::ApiError;
use crate::policy::FallbackPolicy;
use crate::session::SessionId;
use crate::sms;
use crate::store::SavedNumberStore;
use crate::types::{
    FieldError, GenerateMessageBody, GenerateRequest, GenerateResponse, HealthResponse,
    MessageResponse, SaveNumberRequest,
};

pub struct AppState {
    pub generator: FallbackPolicy,
    pub store: Arc<dyn SavedNumberStore>,
}

/// Malformed or mistyped JSON is reported against the whole body.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(ApiError::Validation(vec![FieldError::new(
            "body",
            rejection.body_text(),
        )])),
    }
}

pub async fn generate_message(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GenerateMessageBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = GenerateRequest::try_from(json_body(body)?).map_err(ApiError::Validation)?;

    let generated = state.generator.generate(&req.options).await;
    info!(
        "Generated {} {} message via {:?}",
        req.options.message_length, req.options.category, generated.provider
    );

    Ok(Json(GenerateResponse {
        sms_url: sms::deep_link(&req.phone_number, &generated.message),
        message: generated.message,
        category: req.options.category,
        provider: generated.provider,
    }))
}

pub async fn list_saved_numbers(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
) -> Result<impl IntoResponse, ApiError> {
    let numbers = state
        .store
        .list(session.as_str())
        .await
        .map_err(|e| ApiError::from_store("Failed to retrieve saved numbers", e))?;
    Ok(Json(numbers))
}

pub async fn save_number(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
    body: Result<Json<SaveNumberRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(body)?
        .validated()
        .map_err(ApiError::Validation)?;

    let saved = state
        .store
        .save(&req.phone_number, req.contact_name.as_deref(), session.as_str())
        .await
        .map_err(|e| ApiError::from_store("Failed to save phone number", e))?;
    info!("Saved number {} for session {}", saved.id, session.as_str());
    Ok(Json(saved))
}

pub async fn delete_saved_number(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<SessionId>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .store
        .delete(&id, session.as_str())
        .await
        .map_err(|e| ApiError::from_store("Failed to delete number", e))?;

    if !deleted {
        return Err(ApiError::NotFound);
    }
    info!("Deleted number {} for session {}", id, session.as_str());
    Ok(Json(MessageResponse {
        message: "Number deleted successfully".to_string(),
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        remote_configured: state.generator.remote_configured(),
    })
}
