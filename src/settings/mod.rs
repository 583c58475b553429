//! TOML settings plus the command line. Both feed `client::ClientContext`.

mod cli;
pub use clap::{Parser, Subcommand};
pub use cli::*;

mod settings;
pub use settings::*;
