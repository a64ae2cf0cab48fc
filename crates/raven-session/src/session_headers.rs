use std::fmt;

use reqwest::blocking::RequestBuilder;

use crate::session_record::SessionRecord;

pub const DEFAULT_APP_ID: &str = "936619743392459";

/// Request headers that replay a stored browser session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionHeaders {
    pub user_agent: String,
    pub cookie: String,
    pub app_id: String,
}

impl SessionHeaders {
    pub fn from_record(record: &SessionRecord) -> Self {
        Self {
            user_agent: record.user_agent.clone(),
            cookie: record.cookie_header.clone(),
            app_id: DEFAULT_APP_ID.to_string(),
        }
    }

    /// Header name/value pairs in the order they are sent.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("User-Agent", self.user_agent.clone()),
            ("Cookie", self.cookie.clone()),
            ("X-IG-App-ID", self.app_id.clone()),
            ("X-IG-WWW-Claim", "0".to_string()),
            ("Accept", "application/json".to_string()),
        ]
    }

    pub fn apply(&self, mut request: RequestBuilder) -> RequestBuilder {
        for (name, value) in self.pairs() {
            request = request.header(name, value);
        }
        request
    }
}

impl fmt::Debug for SessionHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHeaders")
            .field("user_agent", &self.user_agent)
            .field("cookie", &"[REDACTED]")
            .field("app_id", &self.app_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{SessionHeaders, DEFAULT_APP_ID};
    use crate::session_record::{BrowserCookie, SessionRecord};

    #[test]
    fn unit_headers_carry_stored_credentials_and_app_id() {
        let record = SessionRecord::from_browser_cookies(
            vec![BrowserCookie::new("sessionid", "abc")],
            "UA/1.0",
            Utc::now(),
        );
        let headers = SessionHeaders::from_record(&record);
        let pairs = headers.pairs();
        assert!(pairs.contains(&("Cookie", "sessionid=abc".to_string())));
        assert!(pairs.contains(&("User-Agent", "UA/1.0".to_string())));
        assert!(pairs.contains(&("X-IG-App-ID", DEFAULT_APP_ID.to_string())));
        assert!(!format!("{headers:?}").contains("sessionid=abc"));
    }
}
