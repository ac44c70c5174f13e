use crate::encryption::{EncryptionError, EncryptionKey};
use keyring::Entry;
use thiserror::Error;
use tracing::info;

const SERVICE: &str = "fog-ingest";
const ENCRYPTION_KEY_ID: &str = "encryption_key";

#[derive(Error, Debug)]
pub enum SecureConfigError {
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
    #[error("No encryption key: pass --encryption-key, set FOG_ENCRYPTION_KEY, or store it in the system keyring under fog-ingest/encryption_key")]
    MissingKey,
    #[error("Invalid encryption key: {0}")]
    InvalidKey(#[from] EncryptionError),
}

/// Where a stored secret can come from
trait KeyStorage {
    fn load_secret(&self, key_id: &str) -> Result<Option<String>, SecureConfigError>;
}

/// Production storage using the system keyring
struct KeyringStorage;

impl KeyStorage for KeyringStorage {
    fn load_secret(&self, key_id: &str) -> Result<Option<String>, SecureConfigError> {
        let entry = Entry::new(SERVICE, key_id)?;
        match entry.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SecureConfigError::Keyring(e)),
        }
    }
}

/// Resolve the shared encryption key at startup.
///
/// An explicitly supplied secret (flag or environment) wins; otherwise the
/// keyring is consulted. The tool never generates a key: a new key would make
/// every previously uploaded song unplayable.
pub fn load_encryption_key(explicit: Option<&str>) -> Result<EncryptionKey, SecureConfigError> {
    load_with_storage(explicit, &KeyringStorage)
}

fn load_with_storage(
    explicit: Option<&str>,
    storage: &dyn KeyStorage,
) -> Result<EncryptionKey, SecureConfigError> {
    let key = match explicit.filter(|s| !s.trim().is_empty()) {
        Some(secret) => {
            info!("SecureConfig: Using encryption key from configuration");
            EncryptionKey::parse(secret)?
        }
        None => {
            let secret = storage
                .load_secret(ENCRYPTION_KEY_ID)?
                .ok_or(SecureConfigError::MissingKey)?;
            info!("SecureConfig: Loaded encryption key from keyring");
            EncryptionKey::parse(&secret)?
        }
    };

    info!("SecureConfig: Key fingerprint {}", key.fingerprint());
    Ok(key)
}
