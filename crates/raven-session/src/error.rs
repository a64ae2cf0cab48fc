use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for session store operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors returned by the key manager, cipher, and session store.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session cipher failure: {0}")]
    Crypto(String),
    #[error("session is corrupt: {0}")]
    CorruptSession(String),
    #[error("no session found at {}", .path.display())]
    SessionNotFound { path: PathBuf },
    #[error("session issued at {issued_at} is older than 24h")]
    SessionExpired { issued_at: DateTime<Utc> },
    #[error("session storage failure at {}: {detail}", .path.display())]
    Io { path: PathBuf, detail: String },
}

impl SessionError {
    pub(crate) fn io(path: impl Into<PathBuf>, detail: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.into(),
            detail: detail.to_string(),
        }
    }

    /// Operator-facing next step for this failure class.
    pub fn remediation(&self) -> &'static str {
        match self {
            Self::SessionNotFound { .. } => "run `raven login` to create a session",
            Self::SessionExpired { .. } => "run `raven login` to renew the session",
            Self::CorruptSession(_) => {
                "inspect the session file, then run `raven logout` and `raven login`"
            }
            Self::Crypto(_) => {
                "check the session key file, then run `raven logout` and `raven login`"
            }
            Self::Io { .. } => "check permissions of the auth directory",
        }
    }
}
