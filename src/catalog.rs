use crate::aws_session::format_error_details;
use aws_config::SdkConfig;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("DynamoDB SDK error: {0}")]
    SdkError(String),
}

/// One catalog entry per ingested song, keyed by `song_id`.
///
/// Field names match the table schema the playback clients read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub song_id: String,
    pub titulo: String,
    pub artista: String,
    pub genero: String,
    pub s3_song_key: String,
    /// Empty when the song has no artwork
    pub s3_thumbnail_key: String,
    pub bucket: String,
    pub region: String,
}

impl CatalogRecord {
    /// All attributes are stored as strings
    fn to_item(&self) -> HashMap<String, AttributeValue> {
        [
            ("song_id", &self.song_id),
            ("titulo", &self.titulo),
            ("artista", &self.artista),
            ("genero", &self.genero),
            ("s3_song_key", &self.s3_song_key),
            ("s3_thumbnail_key", &self.s3_thumbnail_key),
            ("bucket", &self.bucket),
            ("region", &self.region),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), AttributeValue::S(value.clone())))
        .collect()
    }
}

/// Trait for the remote catalog (allows mocking for tests)
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Write a record, replacing any existing record with the same song ID.
    async fn put_record(&self, record: &CatalogRecord) -> Result<(), CatalogError>;

    fn table_name(&self) -> &str;
}

/// Production catalog backed by an existing DynamoDB table
pub struct DynamoCatalog {
    client: Client,
    table_name: String,
}

impl DynamoCatalog {
    pub fn new(sdk_config: &SdkConfig, table_name: String) -> Self {
        DynamoCatalog {
            client: Client::new(sdk_config),
            table_name,
        }
    }
}

#[async_trait::async_trait]
impl Catalog for DynamoCatalog {
    async fn put_record(&self, record: &CatalogRecord) -> Result<(), CatalogError> {
        debug!("PutItem {} into {}", record.song_id, self.table_name);

        // PutItem replaces the whole item; attributes are never merged
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record.to_item()))
            .send()
            .await
            .map_err(|e| {
                CatalogError::SdkError(format!(
                    "PutItem {} failed: {}",
                    record.song_id,
                    format_error_details(&e)
                ))
            })?;

        Ok(())
    }

    fn table_name(&self) -> &str {
        &self.table_name
    }
}
