use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use raven_core::{write_bytes_atomic, write_text_atomic};

use crate::{
    error::{ProfileError, ProfileResult},
    profile_merge::{reconcile_profile, MergePolicy},
    profile_record::{FreshProfileFields, ProfileId, ProfileIdentifier, ProfileRecord},
    profile_report::render_report,
};

pub const PROFILE_RECORD_FILE_NAME: &str = "profile.json";
pub const PROFILE_REPORT_FILE_NAME: &str = "report.txt";
pub const PROFILE_SCREENSHOT_FILE_NAME: &str = "profile.png";

/// File-backed store keyed by [`ProfileId`]: `<root>/<id>/profile.json`.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    root: PathBuf,
    policy: MergePolicy,
}

impl ProfileRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            policy: MergePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn profile_dir(&self, id: ProfileId) -> PathBuf {
        self.root.join(id.to_string())
    }

    pub fn record_path(&self, id: ProfileId) -> PathBuf {
        self.profile_dir(id).join(PROFILE_RECORD_FILE_NAME)
    }

    /// Loads the stored record. Absent records are `Ok(None)`; unreadable or
    /// malformed ones are [`ProfileError::DataCorrupt`].
    pub fn get(&self, id: ProfileId) -> ProfileResult<Option<ProfileRecord>> {
        let path = self.record_path(id);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(ProfileError::DataCorrupt {
                    path,
                    reason: format!("unreadable: {error}"),
                })
            }
        };
        let record = serde_json::from_str::<ProfileRecord>(&raw).map_err(|error| {
            ProfileError::DataCorrupt {
                path: path.clone(),
                reason: error.to_string(),
            }
        })?;
        if record.id != id {
            return Err(ProfileError::DataCorrupt {
                path,
                reason: format!("stored id {} does not match directory {id}", record.id),
            });
        }
        Ok(Some(record))
    }

    pub fn merge(&self, id: ProfileId, fresh: &FreshProfileFields) -> ProfileResult<ProfileRecord> {
        self.merge_at(id, fresh, Utc::now())
    }

    /// Reconciles `fresh` with the stored record and persists the result atomically.
    ///
    /// A corrupt stored record aborts the merge and is left on disk untouched.
    pub fn merge_at(
        &self,
        id: ProfileId,
        fresh: &FreshProfileFields,
        now: DateTime<Utc>,
    ) -> ProfileResult<ProfileRecord> {
        let existing = self.get(id)?;
        let merged = reconcile_profile(existing.as_ref(), id, fresh, self.policy, now)?;
        let path = self.record_path(id);
        let mut encoded = serde_json::to_string_pretty(&merged).map_err(|error| ProfileError::Io {
            path: path.clone(),
            detail: format!("failed to encode profile: {error}"),
        })?;
        encoded.push('\n');
        write_text_atomic(&path, &encoded).map_err(|error| ProfileError::Io {
            path: path.clone(),
            detail: format!("{error:#}"),
        })?;
        tracing::debug!(
            profile_id = %id,
            username = %merged.username,
            analysis_count = merged.analysis_count,
            renamed = merged.username_history.len() > 1,
            "profile record saved"
        );
        Ok(merged)
    }

    /// Every readable record under the root, ordered by id.
    ///
    /// Entries that are not numeric directories, or numeric directories
    /// without a record, are ignored. A corrupt record fails the listing.
    pub fn list(&self) -> ProfileResult<Vec<ProfileRecord>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => {
                return Err(ProfileError::Io {
                    path: self.root.clone(),
                    detail: error.to_string(),
                })
            }
        };

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|error| ProfileError::Io {
                path: self.root.clone(),
                detail: error.to_string(),
            })?;
            if !entry.path().is_dir() {
                continue;
            }
            let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<ProfileId>().ok())
            else {
                continue;
            };
            if let Some(record) = self.get(id)? {
                records.push(record);
            }
        }
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    /// Resolves an identifier to a stored record. Usernames match the current
    /// name first, then any earlier name in the history.
    pub fn find(&self, identifier: &ProfileIdentifier) -> ProfileResult<Option<ProfileRecord>> {
        match identifier {
            ProfileIdentifier::Id(id) => self.get(*id),
            ProfileIdentifier::Username(username) => {
                let records = self.list()?;
                if let Some(current) = records
                    .iter()
                    .find(|record| record.username.eq_ignore_ascii_case(username))
                {
                    return Ok(Some(current.clone()));
                }
                Ok(records
                    .into_iter()
                    .find(|record| record.answers_to(username)))
            }
        }
    }

    pub fn write_report(&self, record: &ProfileRecord) -> ProfileResult<PathBuf> {
        let path = self.profile_dir(record.id).join(PROFILE_REPORT_FILE_NAME);
        write_text_atomic(&path, &render_report(record)).map_err(|error| ProfileError::Io {
            path: path.clone(),
            detail: format!("{error:#}"),
        })?;
        Ok(path)
    }

    pub fn write_screenshot(&self, id: ProfileId, png: &[u8]) -> ProfileResult<PathBuf> {
        let path = self.profile_dir(id).join(PROFILE_SCREENSHOT_FILE_NAME);
        write_bytes_atomic(&path, png).map_err(|error| ProfileError::Io {
            path: path.clone(),
            detail: format!("{error:#}"),
        })?;
        Ok(path)
    }
}
