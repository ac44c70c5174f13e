use crate::catalog::CatalogError;
use crate::cloud_storage::CloudStorageError;
use crate::content_id::SongId;
use crate::encryption::EncryptionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One manifest entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    #[serde(rename = "titulo")]
    pub title: String,
    /// Comma-separated; see `primary_artist`
    #[serde(rename = "artista")]
    pub artist: String,
    #[serde(rename = "genero")]
    pub genre: String,
}

/// Where a track is in the ingest sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStage {
    Pending,
    Matched,
    Encrypted,
    Uploaded,
    Registered,
}

impl fmt::Display for TrackStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TrackStage::Pending => "pending",
            TrackStage::Matched => "matched",
            TrackStage::Encrypted => "encrypted",
            TrackStage::Uploaded => "uploaded",
            TrackStage::Registered => "registered",
        };
        f.write_str(name)
    }
}

/// Why a single track was abandoned. Never aborts the run.
#[derive(Error, Debug)]
pub enum TrackFailure {
    #[error("No audio file found for '{title}'")]
    MatchNotFound { title: String },
    #[error("Encryption failed: {0}")]
    Encryption(#[from] EncryptionError),
    #[error("Upload failed: {0}")]
    Upload(#[from] CloudStorageError),
    #[error("Registration failed: {0}")]
    Registration(#[from] CatalogError),
}

impl TrackFailure {
    /// Last stage the track reached before failing. Steps up to that stage are
    /// not rolled back, so an `Uploaded` failure can leave orphaned objects.
    pub fn reached_stage(&self) -> TrackStage {
        match self {
            TrackFailure::MatchNotFound { .. } => TrackStage::Pending,
            TrackFailure::Encryption(_) => TrackStage::Matched,
            TrackFailure::Upload(_) => TrackStage::Encrypted,
            TrackFailure::Registration(_) => TrackStage::Uploaded,
        }
    }
}

/// A track that went all the way to the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredTrack {
    pub song_id: SongId,
    pub song_key: String,
    pub thumbnail_key: Option<String>,
}

/// Terminal result of processing one manifest entry
#[derive(Debug)]
pub enum TrackOutcome {
    Registered(RegisteredTrack),
    Failed(TrackFailure),
}

impl TrackOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TrackOutcome::Registered(_))
    }
}

/// Counts for one run, plus where the data went
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub processed: usize,
    pub errors: usize,
    pub bucket: String,
    pub table: String,
}

impl RunSummary {
    pub fn new(bucket: &str, table: &str) -> Self {
        RunSummary {
            bucket: bucket.to_string(),
            table: table.to_string(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &TrackOutcome) {
        self.total += 1;
        if outcome.is_success() {
            self.processed += 1;
        } else {
            self.errors += 1;
        }
    }

    /// Console summary printed at the end of a run
    pub fn report(&self) -> String {
        format!(
            "SUMMARY\nProcessed successfully: {}\nErrors: {}\nS3 bucket: {}\nCatalog table: {}",
            self.processed, self.errors, self.bucket, self.table
        )
    }
}
