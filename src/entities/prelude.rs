pub use super::attendance_records::Entity as AttendanceRecords;
pub use super::locations::Entity as Locations;
pub use super::notifications::Entity as Notifications;
pub use super::two_factor_codes::Entity as TwoFactorCodes;
pub use super::users::Entity as Users;
