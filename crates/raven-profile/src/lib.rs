//! Persistent, versioned profile records keyed by stable numeric id.
//!
//! Records live at `<root>/<id>/profile.json`. Each merge reconciles fresh
//! fetch results with the stored record, advances `last_updated`, counts the
//! analysis, and tracks username changes over time.

pub mod error;
pub mod profile_merge;
pub mod profile_record;
pub mod profile_report;
pub mod profile_repository;

pub use error::{ProfileError, ProfileResult};
pub use profile_merge::{reconcile_profile, reconcile_username_history, MergePolicy};
pub use profile_record::{FreshProfileFields, ProfileId, ProfileIdentifier, ProfileRecord};
pub use profile_report::render_report;
pub use profile_repository::{
    ProfileRepository, PROFILE_RECORD_FILE_NAME, PROFILE_REPORT_FILE_NAME,
    PROFILE_SCREENSHOT_FILE_NAME,
};
