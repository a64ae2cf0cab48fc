//! Browser collaborator for interactive login and profile screenshots.

pub mod browser_executor;
pub mod error;
pub mod interactive_login;

pub use browser_executor::{
    BrowserLoginCapture, BrowserLoginRequest, BrowserSessionExecutor, PlaywrightCliExecutor,
    ScreenshotRequest, DEFAULT_LOGIN_TIMEOUT_MS, DEFAULT_LOGIN_URL, DEFAULT_SCREENSHOT_TIMEOUT_MS,
};
pub use error::BrowserLoginError;
pub use interactive_login::{
    run_interactive_login, BrowserLoginConfig, LoginOutcome, DEFAULT_REQUIRED_COOKIE,
};
