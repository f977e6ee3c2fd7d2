//! Domain service for geofenced check-in and check-out.

use serde::Serialize;
use thiserror::Error;

use crate::entities::attendance_records;

/// Errors specific to attendance operations.
#[derive(Debug, Error)]
pub enum AttendanceError {
    /// No office row exists. An operator problem, distinct from a
    /// rejected check-in.
    #[error("Office location is not configured")]
    OfficeNotConfigured,

    /// Geofence rejection. A business-rule outcome, not a fault.
    #[error("Reported position is {distance_m:.0}m from the office (allowed {radius_m:.0}m)")]
    OutsideAllowedArea { distance_m: f64, radius_m: f64 },

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AttendanceError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AttendanceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Which kind of attendance event an operation records. Check-in and
/// check-out are symmetric: same geofence rule, independent records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceKind {
    CheckIn,
    CheckOut,
}

impl AttendanceKind {
    /// Wire/storage tag. The asymmetry ("check-in" vs "checkout") is
    /// preserved for compatibility with existing rows.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CheckIn => "check-in",
            Self::CheckOut => "checkout",
        }
    }
}

/// Confirmation for a recorded attendance event.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceReceipt {
    pub attendance_id: i32,
    pub recorded_at: String,
}

/// Domain service trait for attendance tracking.
#[async_trait::async_trait]
pub trait AttendanceService: Send + Sync {
    /// Records a check-in if the reported position is within the office
    /// radius (boundary inclusive).
    ///
    /// # Errors
    ///
    /// [`AttendanceError::OutsideAllowedArea`] on geofence rejection (no
    /// record is written); [`AttendanceError::OfficeNotConfigured`] when
    /// the office row is missing.
    async fn check_in(
        &self,
        user_id: i32,
        latitude: f64,
        longitude: f64,
        note: Option<String>,
    ) -> Result<AttendanceReceipt, AttendanceError>;

    /// Records a check-out under the same geofence rule as check-in.
    async fn check_out(
        &self,
        user_id: i32,
        latitude: f64,
        longitude: f64,
        note: Option<String>,
    ) -> Result<AttendanceReceipt, AttendanceError>;

    /// Newest-first history, optionally filtered to one user.
    async fn history(
        &self,
        user_id: Option<i32>,
        limit: u64,
    ) -> Result<Vec<attendance_records::Model>, AttendanceError>;
}
