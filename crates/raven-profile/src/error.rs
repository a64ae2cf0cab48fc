use std::path::PathBuf;

use thiserror::Error;

use crate::profile_record::ProfileId;

/// Result type for profile repository operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Errors returned by the profile repository.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile record {} is corrupt: {reason}", .path.display())]
    DataCorrupt { path: PathBuf, reason: String },
    #[error("profile storage failure at {}: {detail}", .path.display())]
    Io { path: PathBuf, detail: String },
    #[error("profile {id} has no username; a new record needs one")]
    MissingUsername { id: ProfileId },
    #[error("invalid profile identifier '{0}'")]
    InvalidIdentifier(String),
}
