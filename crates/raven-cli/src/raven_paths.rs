use std::path::PathBuf;

use raven_browser_automation::BrowserLoginConfig;
use raven_session::SessionStoreConfig;

use crate::Cli;

/// Filesystem locations resolved from CLI flags and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RavenPaths {
    pub auth_dir: PathBuf,
    pub profiles_dir: PathBuf,
}

impl RavenPaths {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            auth_dir: cli.auth_dir.clone(),
            profiles_dir: cli.profiles_dir.clone(),
        }
    }

    pub fn session_store_config(&self) -> SessionStoreConfig {
        SessionStoreConfig::in_dir(&self.auth_dir)
    }
}

/// Login flow settings derived from the CLI.
pub fn login_config_from_cli(cli: &Cli) -> BrowserLoginConfig {
    BrowserLoginConfig {
        timeout_ms: cli.login_timeout_ms,
        ..BrowserLoginConfig::default()
    }
}
