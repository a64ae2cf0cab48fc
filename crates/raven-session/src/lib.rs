//! Encrypted session storage for authenticated browser sessions.
//!
//! Holds the key manager, the AES-256-GCM envelope cipher, the session store
//! with its expiry/validation rules, and the header/probe plumbing used to
//! replay a stored session against the remote service.

pub mod error;
pub mod key_manager;
pub mod session_cipher;
pub mod session_headers;
pub mod session_probe;
pub mod session_record;
pub mod session_store;

pub use error::{SessionError, SessionResult};
pub use key_manager::{derive_fallback_key, EncryptionKey, KeyManager, ResolvedKey};
pub use session_cipher::{PersistedSession, SessionCipher, SessionEnvelope};
pub use session_headers::{SessionHeaders, DEFAULT_APP_ID};
pub use session_probe::{
    HttpSessionProbe, ProbeOutcome, SessionProbe, DEFAULT_API_BASE, DEFAULT_PROBE_TIMEOUT_MS,
};
pub use session_record::{session_max_age, BrowserCookie, SessionRecord, SESSION_MAX_AGE_HOURS};
pub use session_store::{
    ClearOutcome, SavedSession, SessionCheck, SessionStore, SessionStoreConfig,
    SESSION_FILE_NAME, SESSION_KEY_FILE_NAME,
};
