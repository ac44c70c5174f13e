// Test support utilities for both unit and integration tests

use crate::catalog::{Catalog, CatalogError, CatalogRecord};
use crate::cloud_storage::{CloudStorage, CloudStorageError};
use std::collections::HashMap;
use std::sync::Mutex;

/// An object held by `MockCloudStorage`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Mock cloud storage for testing
///
/// Stores objects in memory instead of uploading to S3. Keys starting with a
/// registered prefix fail, to exercise the per-track error path.
#[derive(Default)]
pub struct MockCloudStorage {
    objects: Mutex<HashMap<String, StoredObject>>,
    upload_log: Mutex<Vec<String>>,
    failing_prefixes: Mutex<Vec<String>>,
}

impl MockCloudStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every upload whose key starts with `prefix` fail
    pub fn fail_uploads_with_prefix(&self, prefix: &str) {
        self.failing_prefixes
            .lock()
            .unwrap()
            .push(prefix.to_string());
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    /// Keys currently stored, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Every attempted upload in call order, including failed ones
    pub fn upload_log(&self) -> Vec<String> {
        self.upload_log.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CloudStorage for MockCloudStorage {
    async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String, CloudStorageError> {
        self.upload_log.lock().unwrap().push(key.to_string());

        let failing = self
            .failing_prefixes
            .lock()
            .unwrap()
            .iter()
            .any(|p| key.starts_with(p.as_str()));
        if failing {
            return Err(CloudStorageError::SdkError(format!(
                "Put object {} failed: AccessDenied: mock failure",
                key
            )));
        }

        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                data: data.to_vec(),
                content_type: content_type.to_string(),
            },
        );

        Ok(key.to_string())
    }
}

/// Mock catalog for testing
///
/// Keeps records keyed by song ID, with the same overwrite semantics as the
/// real table.
#[derive(Default)]
pub struct MockCatalog {
    records: Mutex<HashMap<String, CatalogRecord>>,
    put_log: Mutex<Vec<String>>,
    failing_ids: Mutex<Vec<String>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes for this song ID fail
    pub fn fail_song(&self, song_id: &str) {
        self.failing_ids.lock().unwrap().push(song_id.to_string());
    }

    pub fn record(&self, song_id: &str) -> Option<CatalogRecord> {
        self.records.lock().unwrap().get(song_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Song IDs of every attempted write, in call order
    pub fn put_log(&self) -> Vec<String> {
        self.put_log.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Catalog for MockCatalog {
    async fn put_record(&self, record: &CatalogRecord) -> Result<(), CatalogError> {
        self.put_log.lock().unwrap().push(record.song_id.clone());

        if self.failing_ids.lock().unwrap().contains(&record.song_id) {
            return Err(CatalogError::SdkError(format!(
                "PutItem {} failed: ProvisionedThroughputExceededException",
                record.song_id
            )));
        }

        self.records
            .lock()
            .unwrap()
            .insert(record.song_id.clone(), record.clone());
        Ok(())
    }

    fn table_name(&self) -> &str {
        "test-songs"
    }
}
