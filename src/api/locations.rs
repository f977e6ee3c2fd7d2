use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, LocationDto, validation};

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_m: Option<f64>,
}

pub async fn get_office(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<LocationDto>>, ApiError> {
    let office = state
        .store()
        .get_office()
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("Office location is not configured".to_string()))?;

    Ok(Json(ApiResponse::success(office.into())))
}

pub async fn update_office(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<ApiResponse<LocationDto>>, ApiError> {
    let current = state
        .store()
        .get_office()
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("Office location is not configured".to_string()))?;

    let name = payload.name.unwrap_or(current.name);
    if name.trim().is_empty() {
        return Err(ApiError::validation("Location name must not be empty"));
    }

    let latitude = payload.latitude.unwrap_or(current.latitude);
    let longitude = payload.longitude.unwrap_or(current.longitude);
    validation::validate_coordinates(latitude, longitude)?;

    let radius_m = payload.radius_m.unwrap_or(current.radius_m);
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(ApiError::validation("Radius must be a positive number"));
    }

    let updated = state
        .store()
        .update_office(&name, latitude, longitude, radius_m)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::NotFound("Office location is not configured".to_string()))?;

    Ok(Json(ApiResponse::success(updated.into())))
}
