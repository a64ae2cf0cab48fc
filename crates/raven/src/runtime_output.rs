use anyhow::{anyhow, Error};
use chrono::SecondsFormat;
use raven_browser_automation::BrowserLoginError;
use raven_profile::ProfileRecord;
use raven_provider::FetchError;
use raven_session::SessionError;

pub(crate) fn session_failure(error: &SessionError) -> Error {
    anyhow!("{error}\nhint: {}", error.remediation())
}

pub(crate) fn fetch_failure(error: &FetchError) -> Error {
    anyhow!("{error}\nhint: {}", error.remediation())
}

pub(crate) fn login_failure(error: &BrowserLoginError) -> Error {
    let hint = match error {
        BrowserLoginError::LoginTimeout { .. } => {
            "nothing was saved; run `raven login` again and finish signing in before the timeout"
        }
        BrowserLoginError::Backend(_) => {
            "check that RAVEN_BROWSER_CLI points to a working browser automation executable"
        }
        BrowserLoginError::InvalidCapture(_) => {
            "nothing was saved; complete the sign-in in the browser window"
        }
        BrowserLoginError::Session(session_error) => session_error.remediation(),
    };
    anyhow!("{error}\nhint: {hint}")
}

/// One-line summary used by `fetch` and `list`.
pub(crate) fn profile_summary_line(record: &ProfileRecord) -> String {
    format!(
        "id={} username=@{} followers={} following={} posts={} analyses={} last_updated={}",
        record.id,
        record.username,
        record.followers,
        record.following,
        record.posts_count,
        record.analysis_count,
        record
            .last_updated
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}
