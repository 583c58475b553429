mod notification_repo_mysql;
mod profile_repo_mysql;
mod relationship_store_mysql;

pub use notification_repo_mysql::*;
pub use profile_repo_mysql::*;
pub use relationship_store_mysql::*;

mod util;
