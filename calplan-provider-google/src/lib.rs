//! Google backend for calplan: Calendar v3 events, Tasks v1 tasks and
//! OAuth token sessions.

pub mod auth;
pub mod calendar;
pub mod convert;
pub mod oauth;
pub mod session;

pub use auth::GoogleAuth;
pub use calendar::GoogleCalendar;
pub use session::{Session, SessionData, default_session_path};
