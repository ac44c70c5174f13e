use std::path::{Path, PathBuf};
use tracing::debug;

/// Cover art is looked up by exact stem with this extension
pub const ARTWORK_EXTENSION: &str = "jpg";

/// Which heuristic produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Primary artist and title both appear in the file name
    Strict,
    /// Only the title appears
    TitleOnly,
}

/// Result of matching one manifest entry against the audio folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioMatch {
    pub path: PathBuf,
    pub phase: MatchPhase,
    /// Other files that qualified in the same phase. Non-empty means the
    /// choice was ambiguous and `path` won only by sort order.
    pub alternatives: Vec<PathBuf>,
}

impl AudioMatch {
    pub fn is_ambiguous(&self) -> bool {
        !self.alternatives.is_empty()
    }
}

/// List audio files in `dir`, sorted by file name.
///
/// Only regular files whose extension is in `extensions` (case-insensitive)
/// are returned. Sorting makes matching independent of directory order.
pub fn list_audio_files(dir: &Path, extensions: &[String]) -> std::io::Result<Vec<PathBuf>> {
    let mut audio_files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            audio_files.push(path);
        }
    }

    audio_files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!("Found {} audio files in {}", audio_files.len(), dir.display());
    Ok(audio_files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

fn lowercase_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// First comma-separated name of an artist credit, trimmed
pub fn primary_artist(artist: &str) -> &str {
    artist.split(',').next().unwrap_or("").trim()
}

/// Match a track to an audio file by name.
///
/// Phase 1 requires the primary artist and the title to both appear in the
/// file name; phase 2 falls back to the title alone. Comparison is
/// case-insensitive substring matching on the title exactly as given, with
/// surrounding whitespace kept. Within a phase the first file in
/// `audio_files` order wins.
pub fn match_audio_file(title: &str, artist: &str, audio_files: &[PathBuf]) -> Option<AudioMatch> {
    let title = title.to_lowercase();
    if title.is_empty() {
        return None;
    }

    let artist = primary_artist(artist).to_lowercase();
    let names: Vec<String> = audio_files.iter().map(|p| lowercase_name(p)).collect();

    if !artist.is_empty() {
        let strict = select(audio_files, &names, |name| {
            name.contains(&artist) && name.contains(&title)
        });
        if let Some((path, alternatives)) = strict {
            return Some(AudioMatch {
                path,
                phase: MatchPhase::Strict,
                alternatives,
            });
        }
    }

    select(audio_files, &names, |name| name.contains(&title)).map(|(path, alternatives)| {
        AudioMatch {
            path,
            phase: MatchPhase::TitleOnly,
            alternatives,
        }
    })
}

fn select(
    audio_files: &[PathBuf],
    names: &[String],
    predicate: impl Fn(&str) -> bool,
) -> Option<(PathBuf, Vec<PathBuf>)> {
    let mut hits = audio_files
        .iter()
        .zip(names)
        .filter(|(_, name)| predicate(name.as_str()))
        .map(|(path, _)| path.clone());

    let first = hits.next()?;
    Some((first, hits.collect()))
}

/// Cover art for an audio file: `{thumbnails_dir}/{stem}.jpg` if it exists
pub fn find_artwork(thumbnails_dir: &Path, audio_path: &Path) -> Option<PathBuf> {
    let stem = audio_path.file_stem()?;
    let mut file_name = stem.to_os_string();
    file_name.push(".");
    file_name.push(ARTWORK_EXTENSION);

    let artwork = thumbnails_dir.join(file_name);
    if artwork.is_file() {
        Some(artwork)
    } else {
        None
    }
}
