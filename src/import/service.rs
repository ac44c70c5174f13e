// # Ingest Service - Orchestrator
//
// Drives every manifest entry through the same sequence:
// - match: find the audio file (and optional artwork) by name
// - identify: derive the song ID from the audio file name
// - encrypt: AES-256-CBC over the whole file
// - upload: encrypted song, then artwork if present
// - register: write the catalog record
//
// A track that fails at any step is logged and counted; the run moves on.
// Nothing already uploaded for that track is rolled back.

use crate::catalog::{Catalog, CatalogRecord};
use crate::cloud_storage::{CloudStorage, MediaUploader};
use crate::content_id::SongId;
use crate::encryption::EncryptionService;
use crate::import::manifest::LibrarySource;
use crate::import::track_to_file_mapper::{find_artwork, match_audio_file, MatchPhase};
use crate::import::types::{
    RegisteredTrack, RunSummary, TrackFailure, TrackMetadata, TrackOutcome, TrackStage,
};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Where ingested data is recorded as living, copied into each catalog record
#[derive(Debug, Clone)]
pub struct IngestTarget {
    pub bucket: String,
    pub region: String,
}

/// Runs the ingest with injected storage and catalog clients
pub struct IngestService {
    uploader: MediaUploader,
    catalog: Arc<dyn Catalog>,
    encryption: EncryptionService,
    target: IngestTarget,
    max_concurrent_tracks: usize,
}

impl IngestService {
    pub fn new(
        storage: Arc<dyn CloudStorage>,
        catalog: Arc<dyn Catalog>,
        encryption: EncryptionService,
        target: IngestTarget,
    ) -> Self {
        IngestService {
            uploader: MediaUploader::new(storage),
            catalog,
            encryption,
            target,
            max_concurrent_tracks: 1,
        }
    }

    /// How many tracks may be in flight at once. 1 (the default) processes
    /// the manifest strictly in order, one track at a time.
    pub fn with_max_concurrent_tracks(mut self, max_concurrent_tracks: usize) -> Self {
        self.max_concurrent_tracks = max_concurrent_tracks.max(1);
        self
    }

    /// Process every manifest entry and tally the outcomes.
    ///
    /// Each entry yields exactly one outcome. Within a track, registration
    /// always waits for that track's uploads.
    pub async fn run(&self, source: &LibrarySource) -> RunSummary {
        let total = source.tracks.len();
        let mut summary = RunSummary::new(&self.target.bucket, self.catalog.table_name());

        info!(
            "Starting ingest of {} songs into s3://{} / {} (key {})",
            total,
            self.target.bucket,
            self.catalog.table_name(),
            self.encryption.key_fingerprint()
        );

        let mut outcomes = stream::iter(source.tracks.iter().enumerate())
            .map(|(index, track)| async move {
                info!(
                    "[{}/{}] Processing: {} - {}",
                    index + 1,
                    total,
                    track.title,
                    track.artist
                );
                let outcome = self.process_track(track, source).await;
                (index, track, outcome)
            })
            .buffered(self.max_concurrent_tracks);

        while let Some((index, track, outcome)) = outcomes.next().await {
            match &outcome {
                TrackOutcome::Registered(registered) => {
                    info!(
                        "[{}/{}] Registered {} as {}",
                        index + 1,
                        total,
                        track.title,
                        registered.song_id
                    );
                }
                TrackOutcome::Failed(failure) => {
                    error!(
                        "[{}/{}] {} failed after stage '{}': {}",
                        index + 1,
                        total,
                        track.title,
                        failure.reached_stage(),
                        failure
                    );
                }
            }
            summary.record(&outcome);
        }

        info!(
            "Ingest finished: {} processed, {} errors",
            summary.processed, summary.errors
        );
        summary
    }

    /// Open the local library and ingest it.
    ///
    /// A library that cannot be opened (missing audio folder or manifest,
    /// unreadable manifest) is logged and reported as a run with no tracks.
    pub async fn run_library(
        &self,
        audio_dir: &Path,
        thumbnails_dir: &Path,
        manifest_path: &Path,
        audio_extensions: &[String],
    ) -> RunSummary {
        match LibrarySource::open(audio_dir, thumbnails_dir, manifest_path, audio_extensions) {
            Ok(source) => self.run(&source).await,
            Err(e) => {
                error!("Cannot start ingest: {}", e);
                RunSummary::new(&self.target.bucket, self.catalog.table_name())
            }
        }
    }

    /// Run one track to a terminal outcome
    pub async fn process_track(
        &self,
        track: &TrackMetadata,
        source: &LibrarySource,
    ) -> TrackOutcome {
        match self.ingest_track(track, source).await {
            Ok(registered) => TrackOutcome::Registered(registered),
            Err(failure) => TrackOutcome::Failed(failure),
        }
    }

    async fn ingest_track(
        &self,
        track: &TrackMetadata,
        source: &LibrarySource,
    ) -> Result<RegisteredTrack, TrackFailure> {
        let audio = match_audio_file(&track.title, &track.artist, &source.audio_files).ok_or_else(
            || TrackFailure::MatchNotFound {
                title: track.title.clone(),
            },
        )?;

        if audio.phase == MatchPhase::TitleOnly {
            debug!("'{}' matched by title only", track.title);
        }
        if audio.is_ambiguous() {
            warn!(
                "'{}' matched {} files, using {} (also matched: {:?})",
                track.title,
                audio.alternatives.len() + 1,
                audio.path.display(),
                audio.alternatives
            );
        }

        let file_name = audio
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let song_id = SongId::from_file_name(&file_name);
        debug!("{} -> {} ({})", file_name, song_id, TrackStage::Matched);

        let payload = self.encryption.encrypt_file(&audio.path).await?;
        debug!(
            "{}: {} bytes of ciphertext ({})",
            song_id,
            payload.ciphertext.len(),
            TrackStage::Encrypted
        );

        let song_key = self.uploader.upload_song(&song_id, &payload).await?;
        info!("Uploaded {}", song_key);

        let thumbnail_key = match find_artwork(&source.thumbnails_dir, &audio.path) {
            Some(artwork) => {
                let key = self.uploader.upload_thumbnail(&song_id, &artwork).await?;
                info!("Uploaded {}", key);
                Some(key)
            }
            None => {
                warn!("No thumbnail found for {}", file_name);
                None
            }
        };
        debug!("{} ({})", song_id, TrackStage::Uploaded);

        let record = CatalogRecord {
            song_id: song_id.to_string(),
            titulo: track.title.clone(),
            artista: track.artist.clone(),
            genero: track.genre.clone(),
            s3_song_key: song_key.clone(),
            s3_thumbnail_key: thumbnail_key.clone().unwrap_or_default(),
            bucket: self.target.bucket.clone(),
            region: self.target.region.clone(),
        };
        self.catalog.put_record(&record).await?;
        debug!("{} ({})", song_id, TrackStage::Registered);

        Ok(RegisteredTrack {
            song_id,
            song_key,
            thumbnail_key,
        })
    }
}
