use thiserror::Error;

/// Failures of a remote profile fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("profile {identifier} was not found")]
    NotFound { identifier: String },
    #[error("rate limited by the remote service")]
    RateLimited { retry_after_secs: Option<u64> },
    #[error("session rejected by the remote service (http {status})")]
    Unauthorized { status: u16 },
    #[error("profile request failed: {0}")]
    Transport(String),
    #[error("profile response could not be understood: {0}")]
    InvalidResponse(String),
}

impl FetchError {
    /// Operator-facing next step for this failure class.
    pub fn remediation(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "check the username or id",
            Self::RateLimited { .. } => "wait before fetching again",
            Self::Unauthorized { .. } => "run `raven login` to renew the session",
            Self::Transport(_) => "check network connectivity and retry",
            Self::InvalidResponse(_) => "retry later; the remote response format may have changed",
        }
    }
}
