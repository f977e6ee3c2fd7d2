pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, PendingLogin, VerifiedLogin};
pub use auth_service_impl::SeaOrmAuthService;

pub mod attendance_service;
pub mod attendance_service_impl;
pub use attendance_service::{
    AttendanceError, AttendanceKind, AttendanceReceipt, AttendanceService,
};
pub use attendance_service_impl::SeaOrmAttendanceService;
