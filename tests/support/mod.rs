use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Initialize tracing for tests with proper test output handling
pub fn tracing_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// On-disk library laid out the way the ingest tool expects it
pub struct LibraryDir {
    dir: TempDir,
}

impl LibraryDir {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("audios")).unwrap();
        fs::create_dir(dir.path().join("miniaturas")).unwrap();
        LibraryDir { dir }
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.dir.path().join("audios")
    }

    pub fn thumbnails_dir(&self) -> PathBuf {
        self.dir.path().join("miniaturas")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.path().join("metadata.json")
    }

    pub fn add_audio(&self, name: &str, data: &[u8]) {
        fs::write(self.audio_dir().join(name), data).unwrap();
    }

    pub fn add_artwork(&self, name: &str) {
        fs::write(self.thumbnails_dir().join(name), b"\xff\xd8\xff\xe0jpeg").unwrap();
    }

    pub fn write_manifest(&self, json: &str) {
        fs::write(self.manifest_path(), json).unwrap();
    }
}
