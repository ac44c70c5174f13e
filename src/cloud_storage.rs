use crate::aws_session::format_error_details;
use crate::content_id::SongId;
use crate::encryption::EncryptedPayload;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub const SONGS_PREFIX: &str = "songs";
pub const THUMBNAILS_PREFIX: &str = "thumbnails";
pub const SONG_CONTENT_TYPE: &str = "application/octet-stream";
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Error, Debug)]
pub enum CloudStorageError {
    #[error("S3 SDK error: {0}")]
    SdkError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for object storage operations (allows mocking for tests)
#[async_trait::async_trait]
pub trait CloudStorage: Send + Sync {
    /// Store `data` under `key`, overwriting any existing object.
    /// Returns the key on success.
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String, CloudStorageError>;
}

/// Production S3 storage implementation
pub struct S3CloudStorage {
    client: Client,
    bucket_name: String,
}

impl S3CloudStorage {
    /// Create a client for an existing bucket. The bucket is provisioned
    /// elsewhere; nothing is created here.
    pub fn new(sdk_config: &SdkConfig, bucket_name: String, force_path_style: bool) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(force_path_style)
            .build();

        S3CloudStorage {
            client: Client::from_conf(s3_config),
            bucket_name,
        }
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }
}

#[async_trait::async_trait]
impl CloudStorage for S3CloudStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String, CloudStorageError> {
        debug!(
            "Uploading s3://{}/{} ({} bytes, {})",
            self.bucket_name,
            key,
            data.len(),
            content_type
        );

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(data.to_vec().into())
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                CloudStorageError::SdkError(format!(
                    "Put object {} failed: {}",
                    key,
                    format_error_details(&e)
                ))
            })?;

        debug!("Successfully uploaded s3://{}/{}", self.bucket_name, key);
        Ok(key.to_string())
    }
}

/// Object key for an encrypted song: `songs/{song_id}.enc`
pub fn song_key(song_id: &SongId) -> String {
    format!("{}/{}.enc", SONGS_PREFIX, song_id)
}

/// Object key for a song's cover art: `thumbnails/{song_id}.jpg`
pub fn thumbnail_key(song_id: &SongId) -> String {
    format!("{}/{}.jpg", THUMBNAILS_PREFIX, song_id)
}

/// Shapes the two kinds of objects the ingest writes. Storage errors are
/// passed through untouched; there is no retry.
#[derive(Clone)]
pub struct MediaUploader {
    storage: Arc<dyn CloudStorage>,
}

impl std::fmt::Debug for MediaUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaUploader")
            .field("storage", &"<dyn CloudStorage>")
            .finish()
    }
}

impl MediaUploader {
    pub fn new(storage: Arc<dyn CloudStorage>) -> Self {
        MediaUploader { storage }
    }

    /// Upload encrypted audio as `iv || ciphertext`
    pub async fn upload_song(
        &self,
        song_id: &SongId,
        payload: &EncryptedPayload,
    ) -> Result<String, CloudStorageError> {
        let key = song_key(song_id);
        self.storage
            .upload(&key, &payload.to_bytes(), SONG_CONTENT_TYPE)
            .await
    }

    /// Upload cover art as-is (artwork is not encrypted)
    pub async fn upload_thumbnail(
        &self,
        song_id: &SongId,
        thumbnail_path: &Path,
    ) -> Result<String, CloudStorageError> {
        let data = tokio::fs::read(thumbnail_path).await?;
        let key = thumbnail_key(song_id);
        self.storage
            .upload(&key, &data, THUMBNAIL_CONTENT_TYPE)
            .await
    }
}
