//! Remote validation probe for stored sessions.
//!
//! A probe replays the stored credential headers against a lightweight
//! authenticated endpoint. Every failure is an outcome, never an error: an
//! unreachable service and a rejected session both just mean "not active".

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::session_headers::SessionHeaders;

pub const DEFAULT_API_BASE: &str = "https://www.instagram.com/api/v1";
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;
const PROBE_USERNAME: &str = "instagram";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `ProbeOutcome` values.
pub enum ProbeOutcome {
    Accepted,
    Rejected { status: u16 },
    Unreachable { reason: String },
}

impl ProbeOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn reason_code(&self) -> String {
        match self {
            Self::Accepted => "probe_accepted".to_string(),
            Self::Rejected { status } => format!("probe_rejected_http_{status}"),
            Self::Unreachable { reason } => format!("probe_unreachable: {reason}"),
        }
    }
}

/// Trait contract for remote session validation.
pub trait SessionProbe {
    fn probe(&self, headers: &SessionHeaders) -> ProbeOutcome;
}

/// Probe backed by one bounded-timeout HTTP request.
#[derive(Debug, Clone)]
pub struct HttpSessionProbe {
    client: Client,
    api_base: String,
}

impl HttpSessionProbe {
    pub fn new(api_base: impl Into<String>, timeout_ms: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms.max(1)))
            .build()
            .context("failed to build session probe http client")?;
        Ok(Self {
            client,
            api_base: api_base.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/users/web_profile_info/",
            self.api_base.trim_end_matches('/')
        )
    }
}

impl SessionProbe for HttpSessionProbe {
    fn probe(&self, headers: &SessionHeaders) -> ProbeOutcome {
        let request = self
            .client
            .get(self.endpoint())
            .query(&[("username", PROBE_USERNAME)]);
        let response = match headers.apply(request).send() {
            Ok(response) => response,
            Err(error) => {
                let reason = if error.is_timeout() {
                    "timeout".to_string()
                } else {
                    format!("transport_error: {error}")
                };
                tracing::debug!(reason = %reason, "session probe unreachable");
                return ProbeOutcome::Unreachable { reason };
            }
        };
        let status = response.status();
        tracing::debug!(status = status.as_u16(), "session probe completed");
        if status.is_success() {
            ProbeOutcome::Accepted
        } else {
            ProbeOutcome::Rejected {
                status: status.as_u16(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;

    use super::{HttpSessionProbe, ProbeOutcome, SessionProbe};
    use crate::session_headers::SessionHeaders;

    fn headers() -> SessionHeaders {
        SessionHeaders {
            user_agent: "UA/1.0".to_string(),
            cookie: "sessionid=abc".to_string(),
            app_id: "936619743392459".to_string(),
        }
    }

    #[test]
    fn functional_probe_accepts_success_and_sends_stored_headers() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/users/web_profile_info/")
                .query_param("username", "instagram")
                .header("cookie", "sessionid=abc")
                .header("x-ig-app-id", "936619743392459");
            then.status(200).json_body(json!({"data": {"user": {"id": "25025320"}}}));
        });

        let probe = HttpSessionProbe::new(server.base_url(), 2_000).expect("probe");
        assert_eq!(probe.probe(&headers()), ProbeOutcome::Accepted);
        mock.assert_calls(1);
    }

    #[test]
    fn functional_probe_maps_non_success_status_to_rejected() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/users/web_profile_info/");
            then.status(401).json_body(json!({"message": "login_required"}));
        });

        let probe = HttpSessionProbe::new(server.base_url(), 2_000).expect("probe");
        let outcome = probe.probe(&headers());
        assert_eq!(outcome, ProbeOutcome::Rejected { status: 401 });
        assert_eq!(outcome.reason_code(), "probe_rejected_http_401");
        mock.assert_calls(1);
    }

    #[test]
    fn regression_probe_transport_failure_is_an_outcome_not_a_panic() {
        let probe = HttpSessionProbe::new("http://127.0.0.1:9", 500).expect("probe");
        assert!(matches!(
            probe.probe(&headers()),
            ProbeOutcome::Unreachable { .. }
        ));
    }
}
