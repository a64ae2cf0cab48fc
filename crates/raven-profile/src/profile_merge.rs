//! Field-by-field reconciliation of a stored profile with freshly fetched data.
//!
//! | field              | rule                                              |
//! |--------------------|---------------------------------------------------|
//! | `id`               | existing wins                                     |
//! | `first_analysis`   | existing wins; `now` for a new record             |
//! | `username`         | fresh when supplied                               |
//! | text/count/flags   | fresh when supplied                               |
//! | `last_updated`     | always `now`                                      |
//! | `analysis_count`   | existing + 1; `1` for a new record                |
//! | `username_history` | see [`reconcile_username_history`]                |
//!
//! Blank fresh text fields overwrite stored text unless
//! [`MergePolicy::keep_known_on_blank`] is set.

use chrono::{DateTime, Utc};

use crate::{
    error::{ProfileError, ProfileResult},
    profile_record::{FreshProfileFields, ProfileId, ProfileRecord},
};

/// Knobs for [`reconcile_profile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergePolicy {
    /// Keep a stored non-empty text field when the fresh value is blank.
    pub keep_known_on_blank: bool,
}

/// Produces the record to persist for `id` given the stored record, if any.
pub fn reconcile_profile(
    existing: Option<&ProfileRecord>,
    id: ProfileId,
    fresh: &FreshProfileFields,
    policy: MergePolicy,
    now: DateTime<Utc>,
) -> ProfileResult<ProfileRecord> {
    let fresh_username = fresh
        .username
        .as_deref()
        .map(str::trim)
        .filter(|username| !username.is_empty());

    let Some(existing) = existing else {
        let username = fresh_username.ok_or(ProfileError::MissingUsername { id })?;
        return Ok(ProfileRecord {
            id,
            username: username.to_string(),
            full_name: fresh.full_name.clone().unwrap_or_default(),
            biography: fresh.biography.clone().unwrap_or_default(),
            followers: fresh.followers.unwrap_or_default(),
            following: fresh.following.unwrap_or_default(),
            posts_count: fresh.posts_count.unwrap_or_default(),
            is_private: fresh.is_private.unwrap_or_default(),
            is_verified: fresh.is_verified.unwrap_or_default(),
            profile_pic_url: fresh.profile_pic_url.clone().unwrap_or_default(),
            first_analysis: now,
            last_updated: now,
            analysis_count: 1,
            username_history: vec![username.to_string()],
        });
    };

    let username = fresh_username.unwrap_or(existing.username.as_str());
    let username_history = reconcile_username_history(
        Some(existing.username.as_str()),
        &existing.username_history,
        username,
    );

    Ok(ProfileRecord {
        id: existing.id,
        username: username.to_string(),
        full_name: merge_text(&existing.full_name, fresh.full_name.as_deref(), policy),
        biography: merge_text(&existing.biography, fresh.biography.as_deref(), policy),
        followers: fresh.followers.unwrap_or(existing.followers),
        following: fresh.following.unwrap_or(existing.following),
        posts_count: fresh.posts_count.unwrap_or(existing.posts_count),
        is_private: fresh.is_private.unwrap_or(existing.is_private),
        is_verified: fresh.is_verified.unwrap_or(existing.is_verified),
        profile_pic_url: merge_text(
            &existing.profile_pic_url,
            fresh.profile_pic_url.as_deref(),
            policy,
        ),
        first_analysis: existing.first_analysis,
        last_updated: now,
        analysis_count: existing.analysis_count.saturating_add(1),
        username_history,
    })
}

fn merge_text(stored: &str, fresh: Option<&str>, policy: MergePolicy) -> String {
    match fresh {
        None => stored.to_string(),
        Some(value) if value.trim().is_empty() && policy.keep_known_on_blank => {
            stored.to_string()
        }
        Some(value) => value.to_string(),
    }
}

/// Ordered history of distinct consecutive usernames; the last entry always
/// equals `current_username`.
///
/// On a rename the previous name seeds an empty history before the new name is
/// appended. An unchanged name never adds an entry.
pub fn reconcile_username_history(
    previous_username: Option<&str>,
    history: &[String],
    current_username: &str,
) -> Vec<String> {
    let mut reconciled = history.to_vec();
    if let Some(previous) = previous_username {
        if previous != current_username && reconciled.is_empty() {
            reconciled.push(previous.to_string());
        }
    }
    push_distinct(&mut reconciled, current_username);
    reconciled
}

fn push_distinct(history: &mut Vec<String>, username: &str) {
    if history.last().map(String::as_str) != Some(username) {
        history.push(username.to_string());
    }
}
