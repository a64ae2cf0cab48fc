use chrono::{Duration, TimeZone, Utc};
use httpmock::prelude::*;
use raven_browser_automation::{
    run_interactive_login, BrowserLoginCapture, BrowserLoginConfig, BrowserLoginError,
    BrowserLoginRequest, BrowserSessionExecutor, ScreenshotRequest,
};
use raven_profile::{ProfileIdentifier, ProfileRepository};
use raven_provider::{ProfileClient, ProfileSource};
use raven_session::{
    BrowserCookie, SessionError, SessionHeaders, SessionStore, SessionStoreConfig,
};
use serde_json::json;

struct SignedInBrowser;

impl BrowserSessionExecutor for SignedInBrowser {
    fn login(
        &self,
        _request: &BrowserLoginRequest,
    ) -> Result<BrowserLoginCapture, BrowserLoginError> {
        Ok(BrowserLoginCapture {
            cookies: vec![
                BrowserCookie::new("sessionid", "live-session"),
                BrowserCookie::new("ds_user_id", "1"),
            ],
            user_agent: "IntegrationUA/1.0".to_string(),
        })
    }

    fn capture_screenshot(&self, _request: &ScreenshotRequest) -> Option<Vec<u8>> {
        Some(b"PNG".to_vec())
    }
}

#[test]
fn integration_login_then_fetch_twice_across_rename_tracks_identity() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = SessionStore::new(SessionStoreConfig::in_dir(&temp.path().join("auth")));
    let repository = ProfileRepository::new(temp.path().join("profiles"));
    let login_at = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).single().expect("ts");

    run_interactive_login(
        &SignedInBrowser,
        &store,
        &BrowserLoginConfig::default(),
        login_at,
    )
    .expect("login");

    let server = MockServer::start();
    let before_rename = server.mock(|when, then| {
        when.method(GET)
            .path("/users/web_profile_info/")
            .query_param("username", "grace")
            .header("cookie", "sessionid=live-session; ds_user_id=1");
        then.status(200).json_body(json!({"data": {"user": {
            "id": "31337", "username": "grace", "edge_followed_by": {"count": 10}
        }}}));
    });
    let after_rename = server.mock(|when, then| {
        when.method(GET).path("/users/31337/info/");
        then.status(200).json_body(json!({"user": {
            "pk": "31337", "username": "admiral_grace", "follower_count": 20
        }}));
    });
    let client = ProfileClient::new(server.base_url(), 2_000).expect("client");

    let session = store
        .require_fresh_at(login_at + Duration::hours(1))
        .expect("fresh session");
    let headers = SessionHeaders::from_record(&session);

    let first = client
        .fetch(&headers, &ProfileIdentifier::parse("@grace").expect("identifier"))
        .expect("first fetch");
    repository
        .merge_at(first.id, &first.fields, login_at + Duration::hours(1))
        .expect("first merge");

    let second = client
        .fetch(&headers, &ProfileIdentifier::parse("31337").expect("identifier"))
        .expect("second fetch");
    let merged = repository
        .merge_at(second.id, &second.fields, login_at + Duration::hours(2))
        .expect("second merge");

    before_rename.assert_calls(1);
    after_rename.assert_calls(1);
    assert_eq!(merged.analysis_count, 2);
    assert_eq!(merged.followers, 20);
    assert_eq!(
        merged.username_history,
        vec!["grace".to_string(), "admiral_grace".to_string()]
    );
    assert_eq!(merged.first_analysis, login_at + Duration::hours(1));

    let by_old_name = repository
        .find(&ProfileIdentifier::parse("grace").expect("identifier"))
        .expect("find")
        .expect("present");
    assert_eq!(by_old_name.id, merged.id);

    assert!(matches!(
        store.require_fresh_at(login_at + Duration::hours(25)),
        Err(SessionError::SessionExpired { .. })
    ));
}
