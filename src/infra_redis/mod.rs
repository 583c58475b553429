mod notification_publisher_redis;
pub use notification_publisher_redis::*;
