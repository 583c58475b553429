mod notification_service_impl;
mod relationship_service_impl;
mod retry;
mod session_service_fake;
mod session_service_jwt;

pub use notification_service_impl::*;
pub use relationship_service_impl::*;
pub use retry::*;
pub use session_service_fake::*;
pub use session_service_jwt::*;
