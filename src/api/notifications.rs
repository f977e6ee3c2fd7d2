use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse, NotificationDto, validation};

#[derive(Deserialize)]
pub struct ListQuery {
    pub limit: Option<u64>,
}

#[derive(Deserialize)]
pub struct CreateNotificationRequest {
    pub title: Option<String>,
    pub message: Option<String>,
}

pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<NotificationDto>>>, ApiError> {
    let limit = validation::validate_limit(query.limit.unwrap_or(100))?;

    let notifications = state
        .store()
        .list_notifications(limit)
        .await
        .map_err(ApiError::from)?
        .into_iter()
        .map(NotificationDto::from)
        .collect();

    Ok(Json(ApiResponse::success(notifications)))
}

pub async fn create_notification(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateNotificationRequest>,
) -> Result<Json<ApiResponse<NotificationDto>>, ApiError> {
    let title = payload
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::validation("Title is required"))?;

    let message = payload
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::validation("Message is required"))?;

    let created = state
        .store()
        .create_notification(title, message)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::success(created.into())))
}

pub async fn delete_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let deleted = state
        .store()
        .delete_notification(id)
        .await
        .map_err(ApiError::from)?;

    if !deleted {
        return Err(ApiError::not_found("Notification", id));
    }

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Notification deleted".to_string(),
    })))
}
