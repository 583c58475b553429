mod notification_service;
mod relationship_service;
mod session_service;

pub use notification_service::*;
pub use relationship_service::*;
pub use session_service::*;
