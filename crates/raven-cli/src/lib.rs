//! Command-line argument model and configuration resolution for raven.

mod cli_args;
mod cli_types;
mod raven_paths;

pub use cli_args::{Cli, FetchArgs, ListArgs, RavenCommand, ShowArgs, StatusArgs};
pub use cli_types::CliOutputFormat;
pub use raven_paths::{login_config_from_cli, RavenPaths};
