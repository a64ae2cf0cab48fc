mod bootstrap_helpers;
mod profile_commands;
mod runtime_output;
mod session_commands;

use std::io::Write;

use anyhow::Result;
use clap::Parser;
use raven_cli::{Cli, RavenCommand, RavenPaths};

use crate::bootstrap_helpers::init_tracing;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run_cli(&cli)
}

fn run_cli(cli: &Cli) -> Result<()> {
    let paths = RavenPaths::from_cli(cli);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    tracing::debug!(
        auth_dir = %paths.auth_dir.display(),
        profiles_dir = %paths.profiles_dir.display(),
        "resolved raven paths"
    );
    match &cli.command {
        RavenCommand::Login => session_commands::execute_login(cli, &paths, &mut out),
        RavenCommand::Status(args) => session_commands::execute_status(cli, &paths, args, &mut out),
        RavenCommand::Logout => session_commands::execute_logout(&paths, &mut out),
        RavenCommand::Fetch(args) => profile_commands::execute_fetch(cli, &paths, args, &mut out),
        RavenCommand::Show(args) => profile_commands::execute_show(&paths, args, &mut out),
        RavenCommand::List(args) => profile_commands::execute_list(&paths, args, &mut out),
    }?;
    out.flush()?;
    Ok(())
}
