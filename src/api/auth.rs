use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, validation};

pub(crate) const SESSION_USER_KEY: &str = "user_id";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login succeeded, but the account is only partially authenticated:
/// the code delivered by email must still be verified.
#[derive(Serialize)]
pub struct LoginResponse {
    pub user_id: i32,
    pub email: String,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub user_id: Option<i32>,
    #[serde(default)]
    pub code: String,
}

#[derive(Deserialize)]
pub struct ResendRequest {
    pub user_id: Option<i32>,
}

#[derive(Serialize)]
pub struct UserInfoResponse {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Requires a session established by `verify`. Login alone does not
/// grant one.
pub async fn auth_middleware(
    session: Session,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    if let Ok(Some(user_id)) = session.get::<i32>(SESSION_USER_KEY).await {
        tracing::Span::current().record("user_id", user_id);
        return Ok(next.run(request).await);
    }

    let response = (StatusCode::UNAUTHORIZED, "Unauthorized");
    Ok(response.into_response())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Check credentials and email a one-time code. No session yet.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let email = validation::validate_email(&payload.email)?;
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let pending = state.auth().login(email, &payload.password).await?;

    Ok(Json(ApiResponse::success(LoginResponse {
        user_id: pending.user_id,
        email: pending.email,
    })))
}

/// POST /auth/verify
/// Consume the emailed code; on success the session is established.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let user_id = payload
        .user_id
        .ok_or_else(|| ApiError::validation("User ID is required"))?;
    let user_id = validation::validate_user_id(user_id)?;
    if payload.code.is_empty() {
        return Err(ApiError::validation("Code is required"));
    }

    let verified = state.auth().verify_code(user_id, &payload.code).await?;

    if let Err(e) = session.insert(SESSION_USER_KEY, verified.user_id).await {
        return Err(ApiError::internal(format!("Failed to create session: {e}")));
    }

    Ok(Json(ApiResponse::success(LoginResponse {
        user_id: verified.user_id,
        email: verified.email,
    })))
}

/// POST /auth/resend
/// Re-issue the code for a pending login. Supersedes the previous one.
pub async fn resend(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResendRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let user_id = payload
        .user_id
        .ok_or_else(|| ApiError::validation("User ID is required"))?;
    let user_id = validation::validate_user_id(user_id)?;

    let pending = state.auth().resend_code(user_id).await?;

    Ok(Json(ApiResponse::success(LoginResponse {
        user_id: pending.user_id,
        email: pending.email,
    })))
}

/// POST /auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> impl IntoResponse {
    let _ = session.flush().await;
    (StatusCode::OK, "Logged out")
}

/// GET /auth/me
/// Current user information (requires a verified session)
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<UserInfoResponse>>, ApiError> {
    let user_id = session_user_id(&session).await?;

    let user = state
        .store()
        .get_user_by_id(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    Ok(Json(ApiResponse::success(UserInfoResponse {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    })))
}

// ============================================================================
// Helpers
// ============================================================================

/// Get user id from session, returns error if not authenticated
async fn session_user_id(session: &Session) -> Result<i32, ApiError> {
    session
        .get::<i32>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}
