use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Duration, Utc};
use raven_core::{age_at, is_older_than};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SESSION_MAX_AGE_HOURS: i64 = 24;

/// Maximum age before a session is considered expired.
pub fn session_max_age() -> Duration {
    Duration::hours(SESSION_MAX_AGE_HOURS)
}

/// One cookie captured from the browser. Attributes other than name/value are kept verbatim.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl BrowserCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            attributes: BTreeMap::new(),
        }
    }
}

impl fmt::Debug for BrowserCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserCookie")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .field("attributes", &self.attributes.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Snapshot of one authenticated browser session.
///
/// Field names on disk match the plaintext session layout so legacy
/// unencrypted files still load.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    #[serde(rename = "login_timestamp")]
    pub issued_at: DateTime<Utc>,
    #[serde(rename = "Cookie")]
    pub cookie_header: String,
    #[serde(rename = "User-Agent")]
    pub user_agent: String,
    #[serde(default)]
    pub cookies: Vec<BrowserCookie>,
}

impl SessionRecord {
    /// Builds a record from captured cookies, joining them into a `Cookie` header.
    pub fn from_browser_cookies(
        cookies: Vec<BrowserCookie>,
        user_agent: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let cookie_header = cookies
            .iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            issued_at,
            cookie_header,
            user_agent: user_agent.into(),
            cookies,
        }
    }

    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        age_at(self.issued_at, now)
    }

    /// True when more than 24h have passed since login.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        is_older_than(self.issued_at, now, session_max_age())
    }
}

impl fmt::Debug for SessionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRecord")
            .field("issued_at", &self.issued_at)
            .field("cookie_header", &"[REDACTED]")
            .field("user_agent", &self.user_agent)
            .field("cookies", &self.cookies.len())
            .finish()
    }
}
