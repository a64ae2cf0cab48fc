use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use raven_browser_automation::DEFAULT_LOGIN_TIMEOUT_MS;
use raven_provider::DEFAULT_FETCH_TIMEOUT_MS;
use raven_session::{DEFAULT_API_BASE, DEFAULT_PROBE_TIMEOUT_MS};

use crate::CliOutputFormat;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_non_empty(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("value must not be empty".to_string());
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Parser)]
#[command(
    name = "raven",
    about = "Authenticated profile snapshots with an encrypted browser session",
    version
)]
/// Public struct `Cli` used across raven components.
pub struct Cli {
    #[arg(
        long = "auth-dir",
        env = "RAVEN_AUTH_DIR",
        default_value = ".raven/auth",
        global = true,
        help = "Directory holding the encrypted session envelope and its key"
    )]
    pub auth_dir: PathBuf,

    #[arg(
        long = "profiles-dir",
        env = "RAVEN_PROFILES_DIR",
        default_value = ".raven/profiles",
        global = true,
        help = "Root directory of per-profile records, reports and screenshots"
    )]
    pub profiles_dir: PathBuf,

    #[arg(
        long = "api-base",
        env = "RAVEN_API_BASE",
        default_value = DEFAULT_API_BASE,
        value_parser = parse_non_empty,
        global = true,
        help = "Base URL of the remote profile API"
    )]
    pub api_base: String,

    #[arg(
        long = "probe-timeout-ms",
        env = "RAVEN_PROBE_TIMEOUT_MS",
        default_value_t = DEFAULT_PROBE_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        global = true,
        help = "Timeout for the remote session validation probe"
    )]
    pub probe_timeout_ms: u64,

    #[arg(
        long = "fetch-timeout-ms",
        env = "RAVEN_FETCH_TIMEOUT_MS",
        default_value_t = DEFAULT_FETCH_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        global = true,
        help = "Timeout for one profile fetch request"
    )]
    pub fetch_timeout_ms: u64,

    #[arg(
        long = "login-timeout-ms",
        env = "RAVEN_LOGIN_TIMEOUT_MS",
        default_value_t = DEFAULT_LOGIN_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        global = true,
        help = "How long the interactive browser login may take before it is abandoned"
    )]
    pub login_timeout_ms: u64,

    #[arg(
        long = "browser-cli",
        env = "RAVEN_BROWSER_CLI",
        default_value = "raven-browser",
        value_parser = parse_non_empty,
        global = true,
        help = "Browser automation executable; receives `login` or `screenshot` plus JSON on stdin"
    )]
    pub browser_cli: String,

    #[command(subcommand)]
    pub command: RavenCommand,
}

#[derive(Debug, Subcommand)]
pub enum RavenCommand {
    /// Open the browser, sign in interactively, and store the encrypted session.
    Login,
    /// Report whether the stored session exists, is fresh, and is accepted remotely.
    Status(StatusArgs),
    /// Delete the stored session and its key.
    Logout,
    /// Fetch a profile and merge it into the local record.
    Fetch(FetchArgs),
    /// Print the stored record for a profile.
    Show(ShowArgs),
    /// List every stored profile.
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    #[arg(long, help = "Check only local presence and age; skip the remote probe")]
    pub offline: bool,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    #[arg(value_parser = parse_non_empty, help = "Username (with or without @) or numeric id")]
    pub identifier: String,

    #[arg(long = "no-screenshot", help = "Skip the profile page screenshot")]
    pub no_screenshot: bool,

    #[arg(
        long = "keep-known-on-blank",
        help = "Keep stored text fields when the fetched value is blank"
    )]
    pub keep_known_on_blank: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[arg(value_parser = parse_non_empty, help = "Username (current or previous) or numeric id")]
    pub identifier: String,

    #[arg(long, value_enum, default_value_t = CliOutputFormat::Text)]
    pub format: CliOutputFormat,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, value_enum, default_value_t = CliOutputFormat::Text)]
    pub format: CliOutputFormat,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{parse_positive_u64, Cli, RavenCommand};
    use crate::CliOutputFormat;

    #[test]
    fn unit_parse_positive_u64_rejects_zero_and_garbage() {
        assert_eq!(parse_positive_u64("250"), Ok(250));
        assert!(parse_positive_u64("0").is_err());
        assert!(parse_positive_u64("ten").is_err());
    }

    #[test]
    fn functional_fetch_flags_and_global_overrides_parse() {
        let cli = Cli::try_parse_from([
            "raven",
            "fetch",
            "@ada",
            "--no-screenshot",
            "--keep-known-on-blank",
            "--auth-dir",
            "/tmp/raven-auth",
            "--fetch-timeout-ms",
            "1500",
        ])
        .expect("parse");
        assert_eq!(cli.auth_dir.to_string_lossy(), "/tmp/raven-auth");
        assert_eq!(cli.fetch_timeout_ms, 1500);
        match cli.command {
            RavenCommand::Fetch(args) => {
                assert_eq!(args.identifier, "@ada");
                assert!(args.no_screenshot);
                assert!(args.keep_known_on_blank);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unit_defaults_and_output_format() {
        let cli =
            Cli::try_parse_from(["raven", "show", "1001", "--format", "json"]).expect("parse");
        assert_eq!(cli.login_timeout_ms, 300_000);
        match cli.command {
            RavenCommand::Show(args) => assert_eq!(args.format, CliOutputFormat::Json),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn regression_zero_timeout_and_missing_identifier_are_rejected() {
        assert!(Cli::try_parse_from(["raven", "status", "--probe-timeout-ms", "0"]).is_err());
        assert!(Cli::try_parse_from(["raven", "fetch"]).is_err());
        assert!(Cli::try_parse_from(["raven", "fetch", "  "]).is_err());
    }
}
