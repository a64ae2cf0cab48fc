use raven_session::SessionError;
use thiserror::Error;

/// Failures of the interactive login flow.
#[derive(Debug, Error)]
pub enum BrowserLoginError {
    #[error("interactive login did not complete within {timeout_ms} ms")]
    LoginTimeout { timeout_ms: u64 },
    #[error("browser automation backend failed: {0}")]
    Backend(String),
    #[error("browser returned an unusable login capture: {0}")]
    InvalidCapture(String),
    #[error(transparent)]
    Session(#[from] SessionError),
}
