use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use thiserror::Error;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;

/// AES block size, also the IV length
pub const BLOCK_SIZE: usize = 16;
pub const IV_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 256-bit symmetric key shared with the playback clients.
///
/// Accepted encodings:
/// - 64 hex characters
/// - a raw 32-byte secret (the format the existing clients were provisioned with)
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        EncryptionKey(bytes)
    }

    pub fn parse(secret: &str) -> Result<Self, EncryptionError> {
        let secret = secret.trim();

        if secret.len() == KEY_LEN * 2 && secret.chars().all(|c| c.is_ascii_hexdigit()) {
            let bytes = hex::decode(secret)
                .map_err(|e| EncryptionError::InvalidKey(format!("Invalid hex: {}", e)))?;
            let mut key = [0u8; KEY_LEN];
            key.copy_from_slice(&bytes);
            return Ok(EncryptionKey(key));
        }

        let raw = secret.as_bytes();
        if raw.len() == KEY_LEN {
            let mut key = [0u8; KEY_LEN];
            key.copy_from_slice(raw);
            return Ok(EncryptionKey(key));
        }

        Err(EncryptionError::InvalidKey(format!(
            "expected 64 hex characters or a 32-byte secret, got {} bytes",
            raw.len()
        )))
    }

    /// First 8 bytes of SHA-256(key), hex. Safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0);
        hex::encode(&digest[..8])
    }

    fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Encrypted audio as stored in the bucket.
///
/// The IV is not secret; it travels in front of the ciphertext so the object
/// is self-describing for the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub iv: [u8; IV_LEN],
    pub ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    /// Serialize to the object format: [iv(16)][ciphertext]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(IV_LEN + self.ciphertext.len());
        bytes.extend_from_slice(&self.iv);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Parse an object back into IV and ciphertext
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EncryptionError> {
        if bytes.len() < IV_LEN + BLOCK_SIZE {
            return Err(EncryptionError::InvalidPayload(format!(
                "payload too short: {} bytes",
                bytes.len()
            )));
        }

        let (iv_bytes, ciphertext) = bytes.split_at(IV_LEN);
        if ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(EncryptionError::InvalidPayload(format!(
                "ciphertext length {} is not a multiple of {}",
                ciphertext.len(),
                BLOCK_SIZE
            )));
        }

        let mut iv = [0u8; IV_LEN];
        iv.copy_from_slice(iv_bytes);

        Ok(EncryptedPayload {
            iv,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

/// AES-256-CBC encryption with PKCS#7 padding and a fresh random IV per call.
///
/// The service never decides where its key comes from; see `secure_config`.
#[derive(Clone)]
pub struct EncryptionService {
    key: EncryptionKey,
}

impl fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionService")
            .field("key", &self.key)
            .finish()
    }
}

impl EncryptionService {
    pub fn new(key: EncryptionKey) -> Self {
        EncryptionService { key }
    }

    /// Encrypt bytes. Padding always adds 1..=16 bytes, so the ciphertext is a
    /// non-empty multiple of the block size even for empty input.
    pub fn encrypt(&self, plaintext: &[u8]) -> EncryptedPayload {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new(self.key.as_bytes().into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        EncryptedPayload { iv, ciphertext }
    }

    /// Read a whole file and encrypt it
    pub async fn encrypt_file(&self, path: &Path) -> Result<EncryptedPayload, EncryptionError> {
        let data = tokio::fs::read(path).await?;
        Ok(self.encrypt(&data))
    }

    pub fn key_fingerprint(&self) -> String {
        self.key.fingerprint()
    }

    /// Decrypt a payload. Playback clients own decryption; this only exists to
    /// check round-trips in tests.
    #[cfg(test)]
    pub(crate) fn decrypt(&self, payload: &EncryptedPayload) -> Result<Vec<u8>, EncryptionError> {
        use cbc::cipher::BlockDecryptMut;
        type Aes256CbcDec = cbc::Decryptor<Aes256>;

        Aes256CbcDec::new(self.key.as_bytes().into(), &payload.iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&payload.ciphertext)
            .map_err(|e| EncryptionError::InvalidPayload(format!("unpad failed: {}", e)))
    }
}
