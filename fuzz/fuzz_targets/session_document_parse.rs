#![no_main]

use libfuzzer_sys::fuzz_target;
use raven_session::{EncryptionKey, PersistedSession, SessionCipher, SessionError};

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    let cipher = SessionCipher::new(EncryptionKey::from_bytes([7u8; 32]));

    match PersistedSession::parse(&raw) {
        Ok(PersistedSession::Plaintext(record)) => {
            let opened = cipher
                .open(&PersistedSession::Plaintext(record.clone()))
                .expect("plaintext passes through");
            assert_eq!(opened, record);
        }
        Ok(PersistedSession::Encrypted(envelope)) => {
            assert!(envelope.encrypted);
            if let Err(error) = cipher.decrypt(&envelope) {
                assert!(matches!(error, SessionError::CorruptSession(_)));
            }
        }
        Err(error) => assert!(matches!(error, SessionError::CorruptSession(_))),
    }
});
