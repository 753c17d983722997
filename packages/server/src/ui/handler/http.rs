//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::{
    domain::DisplayName,
    infrastructure::dto::{
        AppendMessageRequest, AppendMessageResponse, MessageDto, MessagesQuery, MessagesResponse,
    },
    ui::{error::ApiError, state::AppState},
    usecase::{LiveViewSubscriber, PublishMessageUseCase},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get the current window of messages
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let limit = state.clamp_limit(query.limit);
    let window = LiveViewSubscriber::with_limit(state.log.clone(), limit)
        .fetch()
        .await
        .map_err(|e| ApiError::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    Ok(Json(MessagesResponse {
        messages: window.iter().map(MessageDto::from).collect(),
    }))
}

/// Append a message to the log
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AppendMessageRequest>,
) -> Result<(StatusCode, Json<AppendMessageResponse>), ApiError> {
    // Convert String -> DisplayName (Domain Model)
    let author = DisplayName::try_from(request.author).map_err(|e| {
        tracing::warn!("Rejected message with invalid author: {}", e);
        ApiError::from(e)
    })?;

    let id = PublishMessageUseCase::new(state.log.clone())
        .execute(&author, &request.text)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AppendMessageResponse {
            id: id.into_string(),
        }),
    ))
}
