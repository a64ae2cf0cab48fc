//! Authenticated encryption of session records.
//!
//! Records are sealed with AES-256-GCM using a 16-byte IV and a detached
//! 16-byte tag, hex-encoded into a [`SessionEnvelope`]. Any tag mismatch or
//! malformed field is reported as [`SessionError::CorruptSession`]; plaintext
//! is only returned after the tag verifies.

use aes_gcm::{
    aead::{consts::U16, rand_core::RngCore as _, AeadInPlace, KeyInit, OsRng},
    aes::Aes256,
    AesGcm, Nonce, Tag,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{SessionError, SessionResult},
    key_manager::EncryptionKey,
    session_record::SessionRecord,
};

pub const SESSION_IV_BYTES: usize = 16;
pub const SESSION_TAG_BYTES: usize = 16;

type SessionAes = AesGcm<Aes256, U16>;

/// On-disk form of an encrypted [`SessionRecord`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionEnvelope {
    pub iv: String,
    pub data: String,
    #[serde(rename = "authTag")]
    pub auth_tag: String,
    pub encrypted: bool,
    pub timestamp: DateTime<Utc>,
}

/// A persisted session document: sealed envelope or legacy plaintext record.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistedSession {
    Encrypted(SessionEnvelope),
    Plaintext(SessionRecord),
}

impl PersistedSession {
    /// Classifies a document by its `encrypted` flag; anything not flagged `true` is plaintext.
    pub fn parse(raw: &str) -> SessionResult<Self> {
        let document = serde_json::from_str::<Value>(raw).map_err(|error| {
            SessionError::CorruptSession(format!("session document is not valid JSON: {error}"))
        })?;
        let flagged = document.get("encrypted").and_then(Value::as_bool) == Some(true);
        if flagged {
            let envelope = serde_json::from_value::<SessionEnvelope>(document).map_err(|error| {
                SessionError::CorruptSession(format!("session envelope is malformed: {error}"))
            })?;
            return Ok(Self::Encrypted(envelope));
        }
        let record = serde_json::from_value::<SessionRecord>(document).map_err(|error| {
            SessionError::CorruptSession(format!("plaintext session is malformed: {error}"))
        })?;
        Ok(Self::Plaintext(record))
    }
}

/// AES-256-GCM sealing bound to one key.
#[derive(Debug, Clone)]
pub struct SessionCipher {
    key: EncryptionKey,
}

impl SessionCipher {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    fn cipher(&self) -> SessionResult<SessionAes> {
        SessionAes::new_from_slice(self.key.as_bytes())
            .map_err(|_| {
                SessionError::Crypto("session key material has invalid length".to_string())
            })
    }

    pub fn encrypt(
        &self,
        record: &SessionRecord,
        now: DateTime<Utc>,
    ) -> SessionResult<SessionEnvelope> {
        let cipher = self.cipher()?;
        let mut iv = [0u8; SESSION_IV_BYTES];
        OsRng.fill_bytes(&mut iv);

        let mut buffer = serde_json::to_vec(record)
            .map_err(|error| SessionError::Crypto(format!("failed to encode session: {error}")))?;
        let tag = cipher
            .encrypt_in_place_detached(Nonce::<U16>::from_slice(&iv), b"", &mut buffer)
            .map_err(|_| SessionError::Crypto("session payload encryption failed".to_string()))?;

        Ok(SessionEnvelope {
            iv: hex::encode(iv),
            data: hex::encode(&buffer),
            auth_tag: hex::encode(tag),
            encrypted: true,
            timestamp: now,
        })
    }

    /// Verifies the tag, then decodes the record. Never yields unverified bytes.
    pub fn decrypt(&self, envelope: &SessionEnvelope) -> SessionResult<SessionRecord> {
        if !envelope.encrypted {
            return Err(SessionError::CorruptSession(
                "envelope is not marked as encrypted".to_string(),
            ));
        }
        let iv = decode_hex_field("iv", &envelope.iv, Some(SESSION_IV_BYTES))?;
        let tag = decode_hex_field("authTag", &envelope.auth_tag, Some(SESSION_TAG_BYTES))?;
        let mut buffer = decode_hex_field("data", &envelope.data, None)?;

        let cipher = self.cipher()?;
        cipher
            .decrypt_in_place_detached(
                Nonce::<U16>::from_slice(&iv),
                b"",
                &mut buffer,
                Tag::<U16>::from_slice(&tag),
            )
            .map_err(|_| {
                SessionError::CorruptSession("session payload integrity check failed".to_string())
            })?;

        serde_json::from_slice::<SessionRecord>(&buffer).map_err(|error| {
            SessionError::CorruptSession(format!("decrypted session is malformed: {error}"))
        })
    }

    /// Opens any persisted document; plaintext documents pass through unchanged.
    pub fn open(&self, persisted: &PersistedSession) -> SessionResult<SessionRecord> {
        match persisted {
            PersistedSession::Encrypted(envelope) => self.decrypt(envelope),
            PersistedSession::Plaintext(record) => Ok(record.clone()),
        }
    }
}

fn decode_hex_field(
    field: &str,
    value: &str,
    expected_len: Option<usize>,
) -> SessionResult<Vec<u8>> {
    let bytes = hex::decode(value.trim()).map_err(|_| {
        SessionError::CorruptSession(format!("envelope field '{field}' is not valid hex"))
    })?;
    if let Some(expected) = expected_len {
        if bytes.len() != expected {
            return Err(SessionError::CorruptSession(format!(
                "envelope field '{field}' has {} bytes, expected {expected}",
                bytes.len()
            )));
        }
    }
    Ok(bytes)
}
