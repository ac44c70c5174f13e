use crate::import::track_to_file_mapper::list_audio_files;
use crate::import::types::TrackMetadata;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Problems that stop a run before any track is touched
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Audio directory does not exist: {0}")]
    MissingAudioDir(PathBuf),
    #[error("Manifest file does not exist: {0}")]
    MissingManifest(PathBuf),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything a run reads from local disk, validated up front
#[derive(Debug, Clone)]
pub struct LibrarySource {
    pub tracks: Vec<TrackMetadata>,
    /// Candidate audio files, sorted by file name
    pub audio_files: Vec<PathBuf>,
    pub thumbnails_dir: PathBuf,
}

impl LibrarySource {
    /// Check the audio folder and manifest exist, then load both.
    ///
    /// A missing thumbnails folder is only a warning: every track is then
    /// ingested without artwork.
    pub fn open(
        audio_dir: &Path,
        thumbnails_dir: &Path,
        manifest_path: &Path,
        audio_extensions: &[String],
    ) -> Result<Self, ManifestError> {
        if !audio_dir.is_dir() {
            return Err(ManifestError::MissingAudioDir(audio_dir.to_path_buf()));
        }
        if !manifest_path.is_file() {
            return Err(ManifestError::MissingManifest(manifest_path.to_path_buf()));
        }
        if !thumbnails_dir.is_dir() {
            warn!(
                "Thumbnail directory {} not found, songs will have no artwork",
                thumbnails_dir.display()
            );
        }

        let tracks = load_manifest(manifest_path)?;
        info!(
            "Loaded {} songs from {}",
            tracks.len(),
            manifest_path.display()
        );

        let audio_files =
            list_audio_files(audio_dir, audio_extensions).map_err(|source| ManifestError::Read {
                path: audio_dir.to_path_buf(),
                source,
            })?;

        Ok(LibrarySource {
            tracks,
            audio_files,
            thumbnails_dir: thumbnails_dir.to_path_buf(),
        })
    }
}

/// Parse a JSON array of `{titulo, artista, genero}` entries
pub fn load_manifest(path: &Path) -> Result<Vec<TrackMetadata>, ManifestError> {
    let json = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&json).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
