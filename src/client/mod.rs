mod context;
mod friends_client;

pub use context::*;
pub use friends_client::*;
