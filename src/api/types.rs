use serde::Serialize;

use crate::db::User;
use crate::entities::{attendance_records, locations, notifications};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: String,
    pub external_ref: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            external_ref: user.external_ref,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttendanceDto {
    pub id: i32,
    pub user_id: i32,
    pub location_id: i32,
    pub kind: String,
    pub recorded_at: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: Option<String>,
    pub note: Option<String>,
}

impl From<attendance_records::Model> for AttendanceDto {
    fn from(model: attendance_records::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            location_id: model.location_id,
            kind: model.kind,
            recorded_at: model.recorded_at,
            latitude: model.latitude,
            longitude: model.longitude,
            status: model.status,
            note: model.note,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LocationDto {
    pub id: i32,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
    pub created_at: String,
}

impl From<locations::Model> for LocationDto {
    fn from(model: locations::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            latitude: model.latitude,
            longitude: model.longitude,
            radius_m: model.radius_m,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NotificationDto {
    pub id: i32,
    pub title: String,
    pub message: String,
    pub created_at: String,
}

impl From<notifications::Model> for NotificationDto {
    fn from(model: notifications::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            message: model.message,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub users: u64,
    pub attendance_records: u64,
}
