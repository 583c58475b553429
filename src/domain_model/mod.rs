mod friendship;
mod notification;
mod unit;
mod user;

pub use friendship::*;
pub use notification::*;
pub use unit::*;
pub use user::*;
