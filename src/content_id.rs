use md5::{Digest, Md5};
use std::fmt;

/// Number of hex characters kept from the MD5 digest
pub const SONG_ID_LEN: usize = 12;

/// Deterministic identifier for a song, derived from its audio file name.
///
/// The same file name always yields the same ID, so re-running an ingest
/// overwrites the previous objects and catalog record instead of creating
/// new ones. Renamed files get a new ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SongId(String);

impl SongId {
    /// Hash the file name (not the full path) and keep the first 12 hex chars
    pub fn from_file_name(file_name: &str) -> Self {
        let digest = Md5::digest(file_name.as_bytes());
        let mut id = hex::encode(digest);
        id.truncate(SONG_ID_LEN);
        SongId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
