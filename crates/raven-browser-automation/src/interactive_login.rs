//! Interactive login: open the browser, wait for the user, persist on success.
//!
//! A session is written only after the executor reports a capture that
//! carries the required authentication cookie. Timeouts, backend failures and
//! unusable captures leave the session store untouched.

use chrono::{DateTime, Utc};
use raven_session::{SavedSession, SessionRecord, SessionStore};

use crate::{
    browser_executor::{
        BrowserLoginCapture, BrowserLoginRequest, BrowserSessionExecutor, DEFAULT_LOGIN_TIMEOUT_MS,
        DEFAULT_LOGIN_URL,
    },
    error::BrowserLoginError,
};

pub const DEFAULT_REQUIRED_COOKIE: &str = "sessionid";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserLoginConfig {
    pub login_url: String,
    pub timeout_ms: u64,
    /// Cookie that must be present for the capture to count as signed in.
    pub required_cookie: Option<String>,
}

impl Default for BrowserLoginConfig {
    fn default() -> Self {
        Self {
            login_url: DEFAULT_LOGIN_URL.to_string(),
            timeout_ms: DEFAULT_LOGIN_TIMEOUT_MS,
            required_cookie: Some(DEFAULT_REQUIRED_COOKIE.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub saved: SavedSession,
    pub issued_at: DateTime<Utc>,
    pub cookie_count: usize,
}

/// Runs the login flow and saves the captured session stamped with `now`.
pub fn run_interactive_login(
    executor: &dyn BrowserSessionExecutor,
    store: &SessionStore,
    config: &BrowserLoginConfig,
    now: DateTime<Utc>,
) -> Result<LoginOutcome, BrowserLoginError> {
    let request = BrowserLoginRequest {
        login_url: config.login_url.clone(),
        timeout_ms: config.timeout_ms,
    };
    let capture = executor.login(&request)?;
    validate_capture(&capture, config.required_cookie.as_deref())?;

    let cookie_count = capture.cookies.len();
    let record = SessionRecord::from_browser_cookies(capture.cookies, capture.user_agent, now);
    let saved = store.save(&record)?;
    tracing::info!(
        cookies = cookie_count,
        degraded_key = saved.degraded_key,
        "interactive login completed"
    );
    Ok(LoginOutcome {
        saved,
        issued_at: now,
        cookie_count,
    })
}

fn validate_capture(
    capture: &BrowserLoginCapture,
    required_cookie: Option<&str>,
) -> Result<(), BrowserLoginError> {
    if capture.cookies.is_empty() {
        return Err(BrowserLoginError::InvalidCapture(
            "browser reported no cookies".to_string(),
        ));
    }
    if capture.user_agent.trim().is_empty() {
        return Err(BrowserLoginError::InvalidCapture(
            "browser reported an empty user agent".to_string(),
        ));
    }
    if let Some(required) = required_cookie {
        let signed_in = capture
            .cookies
            .iter()
            .any(|cookie| cookie.name == required && !cookie.value.is_empty());
        if !signed_in {
            return Err(BrowserLoginError::InvalidCapture(format!(
                "required cookie '{required}' missing; login was not completed"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use chrono::{TimeZone, Utc};
    use raven_session::{BrowserCookie, SessionStore, SessionStoreConfig};

    use super::{run_interactive_login, BrowserLoginConfig};
    use crate::{
        browser_executor::{
            BrowserLoginCapture, BrowserLoginRequest, BrowserSessionExecutor, ScreenshotRequest,
        },
        error::BrowserLoginError,
    };

    #[derive(Default)]
    struct ExecutorCounters {
        logins: usize,
        last_request: Option<BrowserLoginRequest>,
    }

    enum Scripted {
        Capture(BrowserLoginCapture),
        TimeOut,
    }

    struct ScriptedExecutor {
        counters: Arc<Mutex<ExecutorCounters>>,
        scripted: Scripted,
    }

    impl BrowserSessionExecutor for ScriptedExecutor {
        fn login(
            &self,
            request: &BrowserLoginRequest,
        ) -> Result<BrowserLoginCapture, BrowserLoginError> {
            let mut counters = self.counters.lock().expect("counter lock");
            counters.logins += 1;
            counters.last_request = Some(request.clone());
            match &self.scripted {
                Scripted::Capture(capture) => Ok(capture.clone()),
                Scripted::TimeOut => Err(BrowserLoginError::LoginTimeout {
                    timeout_ms: request.timeout_ms,
                }),
            }
        }

        fn capture_screenshot(&self, _request: &ScreenshotRequest) -> Option<Vec<u8>> {
            None
        }
    }

    fn executor(scripted: Scripted) -> (ScriptedExecutor, Arc<Mutex<ExecutorCounters>>) {
        let counters = Arc::new(Mutex::new(ExecutorCounters::default()));
        (
            ScriptedExecutor {
                counters: counters.clone(),
                scripted,
            },
            counters,
        )
    }

    fn signed_in_capture() -> BrowserLoginCapture {
        BrowserLoginCapture {
            cookies: vec![
                BrowserCookie::new("csrftoken", "c1"),
                BrowserCookie::new("sessionid", "s1"),
            ],
            user_agent: "MockUA/1.0".to_string(),
        }
    }

    #[test]
    fn functional_successful_login_persists_loadable_session() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(SessionStoreConfig::in_dir(temp.path()));
        let (executor, counters) = executor(Scripted::Capture(signed_in_capture()));
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).single().expect("ts");

        let outcome = run_interactive_login(&executor, &store, &BrowserLoginConfig::default(), now)
            .expect("login");
        assert_eq!(outcome.cookie_count, 2);
        assert_eq!(outcome.issued_at, now);

        let loaded = store.load().expect("load");
        assert_eq!(loaded.issued_at, now);
        assert_eq!(loaded.cookie_header, "csrftoken=c1; sessionid=s1");
        assert_eq!(loaded.user_agent, "MockUA/1.0");

        let counters = counters.lock().expect("counter lock");
        assert_eq!(counters.logins, 1);
        assert_eq!(
            counters.last_request.as_ref().map(|request| request.timeout_ms),
            Some(300_000)
        );
    }

    #[test]
    fn regression_login_timeout_persists_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(SessionStoreConfig::in_dir(temp.path()));
        let (executor, _) = executor(Scripted::TimeOut);
        let config = BrowserLoginConfig {
            timeout_ms: 50,
            ..BrowserLoginConfig::default()
        };

        let error = run_interactive_login(&executor, &store, &config, Utc::now())
            .expect_err("timeout");
        assert!(matches!(error, BrowserLoginError::LoginTimeout { timeout_ms: 50 }));
        assert!(!store.exists());
        assert!(!store.session_path().exists());
    }

    #[test]
    fn regression_capture_without_session_cookie_is_rejected_unsaved() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(SessionStoreConfig::in_dir(temp.path()));
        let (executor, _) = executor(Scripted::Capture(BrowserLoginCapture {
            cookies: vec![BrowserCookie::new("csrftoken", "c1")],
            user_agent: "MockUA/1.0".to_string(),
        }));

        let error = run_interactive_login(
            &executor,
            &store,
            &BrowserLoginConfig::default(),
            Utc::now(),
        )
        .expect_err("incomplete login");
        assert!(matches!(error, BrowserLoginError::InvalidCapture(_)));
        assert!(!store.session_path().exists());
    }

    #[test]
    fn unit_required_cookie_can_be_disabled() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::new(SessionStoreConfig::in_dir(temp.path()));
        let (executor, _) = executor(Scripted::Capture(BrowserLoginCapture {
            cookies: vec![BrowserCookie::new("token", "t")],
            user_agent: "MockUA/1.0".to_string(),
        }));
        let config = BrowserLoginConfig {
            required_cookie: None,
            ..BrowserLoginConfig::default()
        };

        run_interactive_login(&executor, &store, &config, Utc::now()).expect("login");
        assert!(store.exists());
    }
}
