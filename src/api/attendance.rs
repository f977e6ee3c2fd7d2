use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, AttendanceDto, validation};

#[derive(Deserialize)]
pub struct CheckRequest {
    pub user_id: Option<i32>,
    pub user_latitude: Option<f64>,
    pub user_longitude: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct CheckResponse {
    pub attendance_id: i32,
    pub timestamp: String,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub user_id: Option<i32>,
    pub limit: Option<u64>,
}

fn parse_check(payload: &CheckRequest) -> Result<(i32, f64, f64), ApiError> {
    let user_id = payload
        .user_id
        .ok_or_else(|| ApiError::validation("User ID is required"))?;
    let user_id = validation::validate_user_id(user_id)?;

    let latitude = payload
        .user_latitude
        .ok_or_else(|| ApiError::validation("Latitude is required"))?;
    let longitude = payload
        .user_longitude
        .ok_or_else(|| ApiError::validation("Longitude is required"))?;
    let (latitude, longitude) = validation::validate_coordinates(latitude, longitude)?;

    Ok((user_id, latitude, longitude))
}

/// POST /attendance/check-in
pub async fn check_in(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CheckRequest>,
) -> Result<Json<ApiResponse<CheckResponse>>, ApiError> {
    let (user_id, latitude, longitude) = parse_check(&payload)?;

    let receipt = state
        .attendance()
        .check_in(user_id, latitude, longitude, payload.notes)
        .await?;

    Ok(Json(ApiResponse::success(CheckResponse {
        attendance_id: receipt.attendance_id,
        timestamp: receipt.recorded_at,
    })))
}

/// POST /attendance/check-out
pub async fn check_out(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CheckRequest>,
) -> Result<Json<ApiResponse<CheckResponse>>, ApiError> {
    let (user_id, latitude, longitude) = parse_check(&payload)?;

    let receipt = state
        .attendance()
        .check_out(user_id, latitude, longitude, payload.notes)
        .await?;

    Ok(Json(ApiResponse::success(CheckResponse {
        attendance_id: receipt.attendance_id,
        timestamp: receipt.recorded_at,
    })))
}

/// GET /attendance?user_id=&limit=
pub async fn list_attendance(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<AttendanceDto>>>, ApiError> {
    let limit = validation::validate_limit(query.limit.unwrap_or(100))?;
    if let Some(user_id) = query.user_id {
        validation::validate_user_id(user_id)?;
    }

    let rows = state.attendance().history(query.user_id, limit).await?;

    Ok(Json(ApiResponse::success(
        rows.into_iter().map(AttendanceDto::from).collect(),
    )))
}
