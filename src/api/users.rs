use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto, validation};
use crate::db::UserUpdate;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub external_ref: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<String>,
    /// Present-and-null clears the reference; absent leaves it alone.
    #[serde(default, deserialize_with = "double_option")]
    pub external_ref: Option<Option<String>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Sqlite reports duplicate keys as a constraint error somewhere down
/// the chain.
fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.to_string().contains("UNIQUE constraint failed"))
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub password: String,
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state
        .store()
        .list_users()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list users: {e}")))?;

    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = validation::validate_user_id(id)?;

    let user = state
        .store()
        .get_user_by_id(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// POST /users
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    let email = validation::validate_email(&payload.email)?;
    validation::validate_password(&payload.password)?;
    let role = if payload.role.trim().is_empty() {
        "student"
    } else {
        payload.role.trim()
    };

    let security = state.config().read().await.security.clone();

    // Login identifiers are globally unique: let the constraint decide so
    // a concurrent create with the same email cannot slip past a
    // check-then-insert window.
    let user = state
        .store()
        .create_user(
            payload.name.trim(),
            email,
            &payload.password,
            role,
            payload.external_ref.as_deref(),
            Some(&security),
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict(format!("A user with email {email} already exists"))
            } else {
                ApiError::internal(format!("Failed to create user: {e}"))
            }
        })?;

    tracing::info!(user_id = user.id, "User created");

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = validation::validate_user_id(id)?;

    if let Some(name) = &payload.name
        && name.trim().is_empty()
    {
        return Err(ApiError::validation("Name cannot be empty"));
    }

    let changes = UserUpdate {
        name: payload.name.map(|n| n.trim().to_string()),
        role: payload.role,
        external_ref: payload.external_ref,
    };

    let user = state
        .store()
        .update_user(id, changes)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update user: {e}")))?
        .ok_or_else(|| ApiError::not_found("User", id))?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// PUT /users/{id}/password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validation::validate_user_id(id)?;
    validation::validate_password(&payload.password)?;

    let security = state.config().read().await.security.clone();
    let updated = state
        .store()
        .update_user_password(id, &payload.password, Some(&security))
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update password: {e}")))?;

    if !updated {
        return Err(ApiError::not_found("User", id));
    }

    tracing::info!(user_id = id, "Password reset by admin");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validation::validate_user_id(id)?;

    let deleted = state
        .store()
        .delete_user(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete user: {e}")))?;

    if !deleted {
        return Err(ApiError::not_found("User", id));
    }

    tracing::info!(user_id = id, "User deleted");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "User deleted".to_string(),
    })))
}
