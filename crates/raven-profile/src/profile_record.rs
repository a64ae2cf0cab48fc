use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ProfileError;

const MAX_USERNAME_CHARS: usize = 30;

/// Stable numeric identity of a remote profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProfileId(u64);

impl ProfileId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProfileId {
    type Err = ProfileError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(ProfileError::InvalidIdentifier(value.to_string()));
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ProfileError::InvalidIdentifier(value.to_string()))
    }
}

// Ids are written as decimal strings; numbers are accepted on read.
impl Serialize for ProfileId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProfileId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawProfileId {
            Number(u64),
            Text(String),
        }

        match RawProfileId::deserialize(deserializer)? {
            RawProfileId::Number(value) => Ok(Self(value)),
            RawProfileId::Text(value) => value.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// How a caller names a profile: numeric id or username (leading `@` allowed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileIdentifier {
    Id(ProfileId),
    Username(String),
}

impl ProfileIdentifier {
    pub fn parse(raw: &str) -> Result<Self, ProfileError> {
        let cleaned = raw.trim().trim_start_matches('@');
        if cleaned.is_empty() {
            return Err(ProfileError::InvalidIdentifier(raw.to_string()));
        }
        if cleaned.chars().all(|ch| ch.is_ascii_digit()) {
            return cleaned.parse().map(Self::Id);
        }
        let valid_username = cleaned.chars().count() <= MAX_USERNAME_CHARS
            && cleaned
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '.' || ch == '_');
        if !valid_username {
            return Err(ProfileError::InvalidIdentifier(raw.to_string()));
        }
        Ok(Self::Username(cleaned.to_ascii_lowercase()))
    }
}

impl fmt::Display for ProfileIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::Username(username) => write!(f, "@{username}"),
        }
    }
}

/// Persisted, versioned record of one identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileRecord {
    pub id: ProfileId,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub biography: String,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub posts_count: u64,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub profile_pic_url: String,
    pub first_analysis: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub analysis_count: u64,
    #[serde(default)]
    pub username_history: Vec<String>,
}

impl ProfileRecord {
    /// True when `username` is the current name or any earlier one.
    pub fn answers_to(&self, username: &str) -> bool {
        self.username.eq_ignore_ascii_case(username)
            || self
                .username_history
                .iter()
                .any(|previous| previous.eq_ignore_ascii_case(username))
    }
}

/// Freshly fetched profile fields. `None` means the fetch did not supply the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreshProfileFields {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub biography: Option<String>,
    pub followers: Option<u64>,
    pub following: Option<u64>,
    pub posts_count: Option<u64>,
    pub is_private: Option<bool>,
    pub is_verified: Option<bool>,
    pub profile_pic_url: Option<String>,
}

impl FreshProfileFields {
    pub fn with_username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Self::default()
        }
    }
}
