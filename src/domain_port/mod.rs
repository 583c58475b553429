// clock

mod sleeper;

pub use sleeper::*;

// publisher

mod notification_publisher;

pub use notification_publisher::*;

// repo

mod notification_repo;
mod profile_repo;
mod relationship_store;

pub use notification_repo::*;
pub use profile_repo::*;
pub use relationship_store::*;
