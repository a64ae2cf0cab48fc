//! Session encryption key lifecycle.
//!
//! The key is created lazily on first use, persisted once as raw bytes, and
//! reused for the lifetime of the installation. When the key file cannot be
//! read or written the manager falls back to a deterministic key derived from
//! platform attributes and the installation anchor; that key is always tagged
//! as degraded so callers can warn about reduced protection.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use aes_gcm::aead::{rand_core::RngCore as _, OsRng};
use raven_core::write_secret_atomic;
use sha2::{Digest, Sha256};

use crate::error::{SessionError, SessionResult};

pub const ENCRYPTION_KEY_BYTES: usize = 32;
const FALLBACK_KEY_CONTEXT: &str = "raven-session-fallback-key-v1";

/// 256-bit symmetric key protecting the session envelope.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; ENCRYPTION_KEY_BYTES]);

impl EncryptionKey {
    pub fn from_bytes(bytes: [u8; ENCRYPTION_KEY_BYTES]) -> Self {
        Self(bytes)
    }

    /// Returns `None` unless `bytes` is exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let material: [u8; ENCRYPTION_KEY_BYTES] = bytes.try_into().ok()?;
        Some(Self(material))
    }

    /// Draws a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut material = [0u8; ENCRYPTION_KEY_BYTES];
        OsRng.fill_bytes(&mut material);
        Self(material)
    }

    pub fn as_bytes(&self) -> &[u8; ENCRYPTION_KEY_BYTES] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey([REDACTED])")
    }
}

/// Key returned by [`KeyManager::get_key`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    pub key: EncryptionKey,
    /// True when the key is the deterministic fallback rather than persisted random bytes.
    pub degraded: bool,
}

/// Obtains or creates the persistent session key at a fixed path.
#[derive(Debug)]
pub struct KeyManager {
    key_path: PathBuf,
    cached: OnceLock<ResolvedKey>,
}

impl KeyManager {
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
            cached: OnceLock::new(),
        }
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Returns the persisted key, creating it on first use.
    ///
    /// I/O failures switch to the degraded fallback key. A key file with the
    /// wrong length is a [`SessionError::Crypto`] and is never overwritten.
    pub fn get_key(&self) -> SessionResult<ResolvedKey> {
        if let Some(resolved) = self.cached.get() {
            return Ok(resolved.clone());
        }
        let resolved = self.resolve()?;
        let _ = self.cached.set(resolved.clone());
        Ok(resolved)
    }

    /// Drops the in-process cache so the next call re-reads the key file.
    pub fn forget(&mut self) {
        self.cached.take();
    }

    fn resolve(&self) -> SessionResult<ResolvedKey> {
        match std::fs::read(&self.key_path) {
            Ok(bytes) => {
                let key = EncryptionKey::from_slice(&bytes).ok_or_else(|| {
                    SessionError::Crypto(format!(
                        "key file {} holds {} bytes, expected {ENCRYPTION_KEY_BYTES}",
                        self.key_path.display(),
                        bytes.len()
                    ))
                })?;
                tracing::debug!(key_file = %self.key_path.display(), "loaded session key");
                return Ok(ResolvedKey {
                    key,
                    degraded: false,
                });
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => {
                tracing::warn!(
                    key_file = %self.key_path.display(),
                    error = %error,
                    "session key unreadable, using degraded fallback key"
                );
                return Ok(self.degraded_key());
            }
        }

        let key = EncryptionKey::generate();
        match write_secret_atomic(&self.key_path, key.as_bytes()) {
            Ok(()) => {
                tracing::info!(key_file = %self.key_path.display(), "generated new session key");
                Ok(ResolvedKey {
                    key,
                    degraded: false,
                })
            }
            Err(error) => {
                tracing::warn!(
                    key_file = %self.key_path.display(),
                    error = %format!("{error:#}"),
                    "session key could not be persisted, using degraded fallback key"
                );
                Ok(self.degraded_key())
            }
        }
    }

    fn degraded_key(&self) -> ResolvedKey {
        ResolvedKey {
            key: derive_fallback_key(&installation_anchor(&self.key_path)),
            degraded: true,
        }
    }
}

/// Directory the fallback key is bound to; absolute when the platform allows it.
fn installation_anchor(key_path: &Path) -> PathBuf {
    let parent = key_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::path::absolute(parent).unwrap_or_else(|_| parent.to_path_buf())
}

/// Deterministic key from platform, architecture, and installation anchor.
pub fn derive_fallback_key(anchor: &Path) -> EncryptionKey {
    let seed = [
        FALLBACK_KEY_CONTEXT.to_string(),
        format!("os={}", std::env::consts::OS),
        format!("arch={}", std::env::consts::ARCH),
        format!("install={}", anchor.display()),
    ]
    .join("|");
    let digest = Sha256::digest(seed.as_bytes());
    let mut material = [0u8; ENCRYPTION_KEY_BYTES];
    material.copy_from_slice(&digest);
    EncryptionKey(material)
}
