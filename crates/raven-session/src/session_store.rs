//! Encrypted session persistence, expiry, and validation.
//!
//! The store owns one envelope file and one key file, both at fixed paths
//! supplied by configuration. Expiry is a local fact (age over 24h) and is
//! decided before any remote call; remote validation never deletes the
//! session, only an explicit [`SessionStore::clear`] does.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use raven_core::{remove_file_if_exists, write_text_atomic};

use crate::{
    error::{SessionError, SessionResult},
    key_manager::{KeyManager, ResolvedKey},
    session_cipher::{PersistedSession, SessionCipher, SessionEnvelope},
    session_headers::SessionHeaders,
    session_probe::{ProbeOutcome, SessionProbe},
    session_record::SessionRecord,
};

pub const SESSION_FILE_NAME: &str = "session_data.json";
pub const SESSION_KEY_FILE_NAME: &str = "session_key.bin";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `SessionStoreConfig` used across raven components.
pub struct SessionStoreConfig {
    pub session_path: PathBuf,
    pub key_path: PathBuf,
}

impl SessionStoreConfig {
    /// Standard file names inside one auth directory.
    pub fn in_dir(auth_dir: &Path) -> Self {
        Self {
            session_path: auth_dir.join(SESSION_FILE_NAME),
            key_path: auth_dir.join(SESSION_KEY_FILE_NAME),
        }
    }
}

/// Result of a detailed session check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCheck {
    Active { age: Duration },
    Expired { age: Duration },
    Rejected { age: Duration, outcome: ProbeOutcome },
}

impl SessionCheck {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Public struct `SavedSession` used across raven components.
pub struct SavedSession {
    pub session_path: PathBuf,
    pub degraded_key: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Public struct `ClearOutcome` used across raven components.
pub struct ClearOutcome {
    pub session_removed: bool,
    pub key_removed: bool,
    pub failures: Vec<String>,
}

impl ClearOutcome {
    pub fn removed_anything(&self) -> bool {
        self.session_removed || self.key_removed
    }
}

#[derive(Debug)]
/// Public struct `SessionStore` used across raven components.
pub struct SessionStore {
    session_path: PathBuf,
    keys: KeyManager,
}

impl SessionStore {
    pub fn new(config: SessionStoreConfig) -> Self {
        Self {
            session_path: config.session_path,
            keys: KeyManager::new(config.key_path),
        }
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    pub fn key_path(&self) -> &Path {
        self.keys.key_path()
    }

    /// Resolves the encryption key, exposing whether it is the degraded fallback.
    pub fn resolve_key(&self) -> SessionResult<ResolvedKey> {
        self.keys.get_key()
    }

    fn cipher(&self) -> SessionResult<(SessionCipher, bool)> {
        let resolved = self.keys.get_key()?;
        Ok((SessionCipher::new(resolved.key), resolved.degraded))
    }

    pub fn encrypt(
        &self,
        record: &SessionRecord,
        now: DateTime<Utc>,
    ) -> SessionResult<SessionEnvelope> {
        let (cipher, _) = self.cipher()?;
        cipher.encrypt(record, now)
    }

    pub fn decrypt(&self, envelope: &SessionEnvelope) -> SessionResult<SessionRecord> {
        let (cipher, _) = self.cipher()?;
        cipher.decrypt(envelope)
    }

    /// Encrypts and atomically writes the envelope.
    pub fn save(&self, record: &SessionRecord) -> SessionResult<SavedSession> {
        let (cipher, degraded_key) = self.cipher()?;
        let envelope = cipher.encrypt(record, Utc::now())?;
        let mut encoded = serde_json::to_string_pretty(&envelope)
            .map_err(|error| SessionError::Crypto(format!("failed to encode envelope: {error}")))?;
        encoded.push('\n');
        write_text_atomic(&self.session_path, &encoded)
            .map_err(|error| SessionError::io(&self.session_path, format!("{error:#}")))?;
        tracing::info!(
            session_file = %self.session_path.display(),
            degraded_key,
            cookies = record.cookies.len(),
            "saved encrypted session"
        );
        Ok(SavedSession {
            session_path: self.session_path.clone(),
            degraded_key,
        })
    }

    pub fn load(&self) -> SessionResult<SessionRecord> {
        let raw = match std::fs::read_to_string(&self.session_path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(SessionError::SessionNotFound {
                    path: self.session_path.clone(),
                });
            }
            Err(error) => return Err(SessionError::io(&self.session_path, error)),
        };
        let persisted = PersistedSession::parse(&raw)?;
        let record = match &persisted {
            PersistedSession::Plaintext(record) => {
                tracing::warn!(
                    session_file = %self.session_path.display(),
                    "loaded legacy plaintext session"
                );
                record.clone()
            }
            PersistedSession::Encrypted(_) => {
                let (cipher, _) = self.cipher()?;
                cipher.open(&persisted)?
            }
        };
        tracing::debug!(session_file = %self.session_path.display(), "loaded session");
        Ok(record)
    }

    /// True iff [`SessionStore::load`] would succeed.
    pub fn exists(&self) -> bool {
        self.load().is_ok()
    }

    /// Loads the session and fails with [`SessionError::SessionExpired`] past 24h.
    pub fn require_fresh_at(&self, now: DateTime<Utc>) -> SessionResult<SessionRecord> {
        let record = self.load()?;
        if record.is_expired_at(now) {
            return Err(SessionError::SessionExpired {
                issued_at: record.issued_at,
            });
        }
        Ok(record)
    }

    pub fn validate(&self, probe: &dyn SessionProbe) -> SessionResult<bool> {
        self.validate_at(probe, Utc::now())
    }

    /// Expired sessions return `false` without contacting `probe`.
    pub fn validate_at(&self, probe: &dyn SessionProbe, now: DateTime<Utc>) -> SessionResult<bool> {
        Ok(self.check_at(probe, now)?.is_active())
    }

    pub fn check_at(
        &self,
        probe: &dyn SessionProbe,
        now: DateTime<Utc>,
    ) -> SessionResult<SessionCheck> {
        let record = self.load()?;
        let age = record.age_at(now);
        if record.is_expired_at(now) {
            tracing::debug!(
                issued_at = %record.issued_at,
                "session expired, skipping remote probe"
            );
            return Ok(SessionCheck::Expired { age });
        }
        let outcome = probe.probe(&SessionHeaders::from_record(&record));
        if outcome.is_accepted() {
            return Ok(SessionCheck::Active { age });
        }
        tracing::info!(reason = %outcome.reason_code(), "session rejected by remote probe");
        Ok(SessionCheck::Rejected { age, outcome })
    }

    /// Best-effort removal of envelope and key. Never fails; repeated calls are no-ops.
    pub fn clear(&mut self) -> ClearOutcome {
        let mut outcome = ClearOutcome::default();
        match remove_file_if_exists(&self.session_path) {
            Ok(removed) => outcome.session_removed = removed,
            Err(error) => outcome.failures.push(format!("{error:#}")),
        }
        match remove_file_if_exists(self.keys.key_path()) {
            Ok(removed) => outcome.key_removed = removed,
            Err(error) => outcome.failures.push(format!("{error:#}")),
        }
        self.keys.forget();
        for failure in &outcome.failures {
            tracing::warn!(failure = %failure, "session clear left material behind");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    use super::{SessionCheck, SessionStore, SessionStoreConfig};
    use crate::{
        error::SessionError,
        session_headers::SessionHeaders,
        session_probe::{ProbeOutcome, SessionProbe},
        session_record::{BrowserCookie, SessionRecord},
    };

    struct CountingProbe {
        outcome: ProbeOutcome,
        calls: Cell<usize>,
    }

    impl CountingProbe {
        fn new(outcome: ProbeOutcome) -> Self {
            Self {
                outcome,
                calls: Cell::new(0),
            }
        }
    }

    impl SessionProbe for CountingProbe {
        fn probe(&self, _headers: &SessionHeaders) -> ProbeOutcome {
            self.calls.set(self.calls.get() + 1);
            self.outcome.clone()
        }
    }

    fn record_issued_hours_ago(hours: i64) -> SessionRecord {
        SessionRecord::from_browser_cookies(
            vec![BrowserCookie::new("sessionid", "abc")],
            "UA/1.0",
            Utc::now() - Duration::hours(hours),
        )
    }

    fn store_in(root: &std::path::Path) -> SessionStore {
        SessionStore::new(SessionStoreConfig::in_dir(&root.join("auth")))
    }

    #[test]
    fn functional_save_then_load_roundtrips_and_creates_key() {
        let temp = tempdir().expect("tempdir");
        let store = store_in(temp.path());
        let record = record_issued_hours_ago(1);

        let saved = store.save(&record).expect("save");
        assert!(!saved.degraded_key);
        assert!(store.key_path().exists());
        assert_eq!(store.load().expect("load"), record);
        assert!(store.exists());

        let raw = std::fs::read_to_string(store.session_path()).expect("read envelope");
        assert!(raw.contains("\"encrypted\": true"));
        assert!(!raw.contains("sessionid=abc"));
    }

    #[test]
    fn regression_load_without_envelope_is_session_not_found() {
        let temp = tempdir().expect("tempdir");
        let store = store_in(temp.path());
        assert!(matches!(
            store.load(),
            Err(SessionError::SessionNotFound { .. })
        ));
        assert!(!store.exists());
    }

    #[test]
    fn regression_tampered_envelope_on_disk_is_corrupt_session() {
        let temp = tempdir().expect("tempdir");
        let store = store_in(temp.path());
        store.save(&record_issued_hours_ago(1)).expect("save");

        let raw = std::fs::read_to_string(store.session_path()).expect("read");
        let mut envelope: serde_json::Value = serde_json::from_str(&raw).expect("json");
        let tag = envelope["authTag"].as_str().expect("tag").to_string();
        let flipped = if tag.starts_with('0') {
            format!("1{}", &tag[1..])
        } else {
            format!("0{}", &tag[1..])
        };
        envelope["authTag"] = serde_json::Value::String(flipped);
        std::fs::write(store.session_path(), envelope.to_string()).expect("write tampered");

        assert!(matches!(
            store.load(),
            Err(SessionError::CorruptSession(_))
        ));
        assert!(!store.exists());
    }

    #[test]
    fn unit_legacy_plaintext_session_loads_without_key() {
        let temp = tempdir().expect("tempdir");
        let store = store_in(temp.path());
        let record = record_issued_hours_ago(2);
        std::fs::create_dir_all(store.session_path().parent().expect("parent")).expect("mkdir");
        std::fs::write(
            store.session_path(),
            serde_json::to_string(&record).expect("encode"),
        )
        .expect("write plaintext");

        assert_eq!(store.load().expect("load"), record);
        assert!(!store.key_path().exists());
    }

    #[test]
    fn functional_expired_session_validates_false_without_remote_call() {
        let temp = tempdir().expect("tempdir");
        let store = store_in(temp.path());
        store.save(&record_issued_hours_ago(25)).expect("save");
        let probe = CountingProbe::new(ProbeOutcome::Accepted);

        assert!(!store.validate(&probe).expect("validate"));
        assert_eq!(probe.calls.get(), 0);
        assert!(matches!(
            store.check_at(&probe, Utc::now()).expect("check"),
            SessionCheck::Expired { .. }
        ));
        assert_eq!(probe.calls.get(), 0);
    }

    #[test]
    fn functional_fresh_session_uses_exactly_one_probe() {
        let temp = tempdir().expect("tempdir");
        let store = store_in(temp.path());
        store.save(&record_issued_hours_ago(1)).expect("save");
        let probe = CountingProbe::new(ProbeOutcome::Accepted);

        assert!(store.validate(&probe).expect("validate"));
        assert_eq!(probe.calls.get(), 1);
    }

    #[test]
    fn regression_rejected_or_unreachable_probe_returns_false_and_keeps_session() {
        let temp = tempdir().expect("tempdir");
        let store = store_in(temp.path());
        store.save(&record_issued_hours_ago(1)).expect("save");

        let rejected = CountingProbe::new(ProbeOutcome::Rejected { status: 401 });
        assert!(!store.validate(&rejected).expect("validate"));
        let unreachable = CountingProbe::new(ProbeOutcome::Unreachable {
            reason: "timeout".to_string(),
        });
        assert!(!store.validate(&unreachable).expect("validate"));

        assert_eq!(rejected.calls.get(), 1);
        assert_eq!(unreachable.calls.get(), 1);
        assert!(store.session_path().exists());
    }

    #[test]
    fn regression_validate_propagates_missing_session() {
        let temp = tempdir().expect("tempdir");
        let store = store_in(temp.path());
        let probe = CountingProbe::new(ProbeOutcome::Accepted);
        assert!(matches!(
            store.validate(&probe),
            Err(SessionError::SessionNotFound { .. })
        ));
        assert_eq!(probe.calls.get(), 0);
    }

    #[test]
    fn unit_require_fresh_distinguishes_expired_sessions() {
        let temp = tempdir().expect("tempdir");
        let store = store_in(temp.path());
        store.save(&record_issued_hours_ago(30)).expect("save");
        assert!(matches!(
            store.require_fresh_at(Utc::now()),
            Err(SessionError::SessionExpired { .. })
        ));
        assert!(store
            .require_fresh_at(Utc::now() - Duration::hours(10))
            .is_ok());
    }

    #[test]
    fn functional_clear_is_idempotent() {
        let temp = tempdir().expect("tempdir");
        let mut store = store_in(temp.path());
        store.save(&record_issued_hours_ago(1)).expect("save");

        let first = store.clear();
        assert!(first.session_removed);
        assert!(first.key_removed);
        assert!(first.failures.is_empty());
        assert!(!store.session_path().exists());
        assert!(!store.key_path().exists());

        let second = store.clear();
        assert!(!second.removed_anything());
        assert!(second.failures.is_empty());
    }

    #[test]
    fn regression_failed_save_leaves_no_envelope_behind() {
        let temp = tempdir().expect("tempdir");
        let blocker = temp.path().join("auth");
        std::fs::write(&blocker, "file where the auth dir should be").expect("write blocker");
        let store = SessionStore::new(SessionStoreConfig::in_dir(&blocker));

        let error = store
            .save(&record_issued_hours_ago(1))
            .expect_err("save must fail");
        assert!(matches!(error, SessionError::Io { .. }));
        assert!(!store.session_path().exists());
        assert!(matches!(
            store.load(),
            Err(SessionError::SessionNotFound { .. }) | Err(SessionError::Io { .. })
        ));
    }
}
