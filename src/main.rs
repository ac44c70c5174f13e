use fog_ingest::aws_session::load_sdk_config;
use fog_ingest::catalog::{Catalog, DynamoCatalog};
use fog_ingest::cloud_storage::{CloudStorage, S3CloudStorage};
use fog_ingest::config::Config;
use fog_ingest::encryption::EncryptionService;
use fog_ingest::import::{IngestService, IngestTarget, RunSummary};
use fog_ingest::secure_config::load_encryption_key;
use std::sync::Arc;
use tracing::{debug, error, info};

fn configure_logging() {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_line_number(true)
        .with_target(false)
        .with_file(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() {
    configure_logging();

    // The summary is printed and the process exits 0 even when the run
    // cannot start; failures are reported through the logs and counts.
    let summary = match Config::load() {
        Ok(config) => run(&config).await,
        Err(e) => {
            error!("Configuration error: {e}");
            RunSummary::default()
        }
    };

    println!("{}", summary.report());
}

async fn run(config: &Config) -> RunSummary {
    info!("fog-ingest starting");
    debug!("{:?}", config);

    let key = match load_encryption_key(config.encryption_key.as_deref()) {
        Ok(key) => key,
        Err(e) => {
            error!("{e}");
            return RunSummary::new(&config.bucket, &config.table);
        }
    };

    let sdk_config = load_sdk_config(&config.aws).await;
    let s3 = S3CloudStorage::new(
        &sdk_config,
        config.bucket.clone(),
        config.aws.force_path_style(),
    );
    info!("Uploading to bucket {}", s3.bucket_name());
    let storage: Arc<dyn CloudStorage> = Arc::new(s3);
    let catalog: Arc<dyn Catalog> = Arc::new(DynamoCatalog::new(&sdk_config, config.table.clone()));

    let service = IngestService::new(
        storage,
        catalog,
        EncryptionService::new(key),
        IngestTarget {
            bucket: config.bucket.clone(),
            region: config.aws.region.clone(),
        },
    )
    .with_max_concurrent_tracks(config.max_concurrent_tracks);

    service
        .run_library(
            &config.audio_dir,
            &config.thumbnails_dir,
            &config.manifest_path,
            &config.audio_extensions,
        )
        .await
}
