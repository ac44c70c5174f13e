// # Import Module
//
// Batch ingest of a local music library:
//
// - **Manifest**: Loads the track list and validates local folders
// - **TrackToFileMapper**: Matches manifest entries to audio files and artwork
// - **IngestService**: Orchestrates match -> encrypt -> upload -> register
//
// Public API:
// - `LibrarySource`: Validated local input for one run
// - `IngestService`: Runs the ingest against injected storage and catalog
// - `RunSummary`: Processed/error counts reported at the end of a run

mod manifest;
mod service;
mod track_to_file_mapper;
mod types;

// Public API exports
pub use manifest::{load_manifest, LibrarySource, ManifestError};
pub use service::{IngestService, IngestTarget};
pub use track_to_file_mapper::{
    find_artwork, list_audio_files, match_audio_file, primary_artist, AudioMatch, MatchPhase,
};
pub use types::{
    RegisteredTrack, RunSummary, TrackFailure, TrackMetadata, TrackOutcome, TrackStage,
};
