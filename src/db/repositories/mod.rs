pub mod attendance;
pub mod location;
pub mod notification;
pub mod two_factor;
pub mod user;
