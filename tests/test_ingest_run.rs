#![cfg(feature = "test-utils")]

mod support;
use std::sync::Arc;

use crate::support::{tracing_init, LibraryDir};
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use fog_ingest::cloud_storage::{song_key, thumbnail_key};
use fog_ingest::content_id::SongId;
use fog_ingest::encryption::{EncryptedPayload, EncryptionKey, EncryptionService, IV_LEN};
use fog_ingest::import::{IngestService, IngestTarget, LibrarySource, ManifestError};
use fog_ingest::test_support::{MockCatalog, MockCloudStorage};

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const KEY: [u8; 32] = [7u8; 32];

const MANIFEST: &str = r#"[
    {"titulo": "Creep", "artista": "Radiohead, Thom Yorke", "genero": "Rock"},
    {"titulo": "Does Not Exist", "artista": "Nobody", "genero": "Pop"},
    {"titulo": "Lithium", "artista": "Nirvana", "genero": "Grunge"}
]"#;

fn build_service() -> (IngestService, Arc<MockCloudStorage>, Arc<MockCatalog>) {
    let storage = Arc::new(MockCloudStorage::new());
    let catalog = Arc::new(MockCatalog::new());
    let service = IngestService::new(
        storage.clone(),
        catalog.clone(),
        EncryptionService::new(EncryptionKey::from_bytes(KEY)),
        IngestTarget {
            bucket: "fog-music-media".to_string(),
            region: "us-east-1".to_string(),
        },
    );
    (service, storage, catalog)
}

fn open(library: &LibraryDir) -> Result<LibrarySource, ManifestError> {
    LibrarySource::open(
        &library.audio_dir(),
        &library.thumbnails_dir(),
        &library.manifest_path(),
        &["mp3".to_string()],
    )
}

/// Decrypt the way a playback client does: split the IV off the front
fn client_decrypt(bytes: &[u8]) -> Vec<u8> {
    let (iv, ciphertext) = bytes.split_at(IV_LEN);
    Aes256CbcDec::new(&KEY.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .unwrap()
}

#[tokio::test]
async fn test_full_run_with_one_unmatched_entry() {
    tracing_init();

    let library = LibraryDir::new();
    library.add_audio("Radiohead - Creep.mp3", b"creep audio bytes");
    library.add_audio("Creep (live).mp3", b"live bootleg");
    library.add_audio("Nirvana - Lithium.mp3", b"lithium audio bytes");
    library.add_artwork("Radiohead - Creep.jpg");
    library.write_manifest(MANIFEST);

    let source = open(&library).unwrap();
    let (service, storage, catalog) = build_service();

    let summary = service.run(&source).await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(summary.bucket, "fog-music-media");

    let creep = SongId::from_file_name("Radiohead - Creep.mp3");
    let lithium = SongId::from_file_name("Nirvana - Lithium.mp3");

    assert_eq!(
        storage.upload_log(),
        vec![song_key(&creep), thumbnail_key(&creep), song_key(&lithium)]
    );
    assert_eq!(
        catalog.put_log(),
        vec![creep.to_string(), lithium.to_string()]
    );

    let creep_record = catalog.record(creep.as_str()).unwrap();
    assert_eq!(creep_record.titulo, "Creep");
    assert_eq!(creep_record.artista, "Radiohead, Thom Yorke");
    assert_eq!(creep_record.s3_thumbnail_key, thumbnail_key(&creep));

    let lithium_record = catalog.record(lithium.as_str()).unwrap();
    assert_eq!(lithium_record.s3_thumbnail_key, "");
    assert_eq!(lithium_record.bucket, "fog-music-media");
    assert_eq!(lithium_record.region, "us-east-1");
}

#[tokio::test]
async fn test_uploaded_song_is_iv_then_ciphertext() {
    tracing_init();

    let library = LibraryDir::new();
    let audio = vec![0xABu8; 1000];
    library.add_audio("Nirvana - Lithium.mp3", &audio);
    library.write_manifest(r#"[{"titulo": "Lithium", "artista": "Nirvana", "genero": "Grunge"}]"#);

    let source = open(&library).unwrap();
    let (service, storage, _catalog) = build_service();
    service.run(&source).await;

    let id = SongId::from_file_name("Nirvana - Lithium.mp3");
    let object = storage.object(&song_key(&id)).unwrap();
    assert_eq!(object.content_type, "application/octet-stream");

    let ciphertext_len = object.data.len() - IV_LEN;
    assert_eq!(ciphertext_len % 16, 0);
    assert_eq!(ciphertext_len, 1008);

    let payload = EncryptedPayload::from_bytes(&object.data).unwrap();
    assert_eq!(payload.iv.as_slice(), &object.data[..IV_LEN]);
    assert_eq!(client_decrypt(&object.data), audio);
}

#[tokio::test]
async fn test_rerun_overwrites_with_fresh_iv() {
    tracing_init();

    let library = LibraryDir::new();
    library.add_audio("Nirvana - Lithium.mp3", b"lithium");
    library.write_manifest(r#"[{"titulo": "Lithium", "artista": "Nirvana", "genero": "Grunge"}]"#);

    let source = open(&library).unwrap();
    let (service, storage, catalog) = build_service();
    let key = song_key(&SongId::from_file_name("Nirvana - Lithium.mp3"));

    service.run(&source).await;
    let first = storage.object(&key).unwrap().data;
    service.run(&source).await;
    let second = storage.object(&key).unwrap().data;

    assert_ne!(first, second);
    assert_eq!(client_decrypt(&first), client_decrypt(&second));
    assert_eq!(storage.keys(), vec![key]);
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.put_log().len(), 2);
}

#[tokio::test]
async fn test_missing_audio_dir_reports_empty_run() {
    tracing_init();

    let library = LibraryDir::new();
    library.write_manifest(MANIFEST);
    std::fs::remove_dir(library.audio_dir()).unwrap();
    assert!(matches!(
        open(&library),
        Err(ManifestError::MissingAudioDir(_))
    ));

    let (service, storage, catalog) = build_service();
    let summary = service
        .run_library(
            &library.audio_dir(),
            &library.thumbnails_dir(),
            &library.manifest_path(),
            &["mp3".to_string()],
        )
        .await;

    assert_eq!(summary.total, 0);
    assert_eq!(summary.processed, 0);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.bucket, "fog-music-media");
    assert_eq!(summary.table, "test-songs");
    assert!(storage.upload_log().is_empty());
    assert!(catalog.put_log().is_empty());
}

#[tokio::test]
async fn test_run_library_ingests_from_disk() {
    tracing_init();

    let library = LibraryDir::new();
    library.add_audio("Radiohead - Creep.mp3", b"creep audio bytes");
    library.add_audio("Nirvana - Lithium.mp3", b"lithium audio bytes");
    library.write_manifest(MANIFEST);

    let (service, _storage, catalog) = build_service();
    let summary = service
        .run_library(
            &library.audio_dir(),
            &library.thumbnails_dir(),
            &library.manifest_path(),
            &["mp3".to_string()],
        )
        .await;

    assert_eq!(summary.total, 3);
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(catalog.len(), 2);
}

#[tokio::test]
async fn test_concurrent_run_counts_every_entry() {
    tracing_init();

    let library = LibraryDir::new();
    let mut entries = Vec::new();
    for i in 0..12 {
        library.add_audio(
            &format!("Artist {i} - Song {i:02}.mp3"),
            format!("audio {i}").as_bytes(),
        );
        entries.push(format!(
            r#"{{"titulo": "Song {i:02}", "artista": "Artist {i}", "genero": "Test"}}"#
        ));
    }
    entries.push(r#"{"titulo": "Absent", "artista": "Nobody", "genero": "Test"}"#.to_string());
    library.write_manifest(&format!("[{}]", entries.join(",")));

    let source = open(&library).unwrap();
    let (service, storage, catalog) = build_service();
    let service = service.with_max_concurrent_tracks(4);

    let summary = service.run(&source).await;

    assert_eq!(summary.total, 13);
    assert_eq!(summary.processed, 12);
    assert_eq!(summary.errors, 1);
    assert_eq!(storage.keys().len(), 12);
    assert_eq!(catalog.len(), 12);
}
