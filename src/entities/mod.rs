pub mod prelude;

pub mod attendance_records;
pub mod locations;
pub mod notifications;
pub mod two_factor_codes;
pub mod users;
