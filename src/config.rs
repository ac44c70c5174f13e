use crate::aws_session::AwsConfig;
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid arguments: {0}")]
    Args(#[from] clap::Error),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("Concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("Static AWS credentials need both an access key and a secret key")]
    PartialCredentials,
}

/// fog-ingest: encrypt a local music library and publish it to S3 and DynamoDB.
#[derive(Parser, Debug)]
#[command(name = "fog-ingest", version)]
pub struct ConfigArgs {
    /// Folder holding the source audio files.
    #[arg(long, default_value = "audios", env = "FOG_AUDIO_DIR")]
    pub audio_dir: PathBuf,

    /// Folder holding `{stem}.jpg` cover art.
    #[arg(long, default_value = "miniaturas", env = "FOG_THUMBNAILS_DIR")]
    pub thumbnails_dir: PathBuf,

    /// JSON manifest of `{titulo, artista, genero}` entries.
    #[arg(long = "manifest", default_value = "metadata.json", env = "FOG_MANIFEST")]
    pub manifest_path: PathBuf,

    /// Audio file extensions to consider, comma-separated.
    #[arg(
        long = "audio-ext",
        default_value = "mp3",
        env = "FOG_AUDIO_EXTENSIONS",
        value_delimiter = ','
    )]
    pub audio_extensions: Vec<String>,

    /// S3 bucket receiving encrypted songs and thumbnails.
    #[arg(long, default_value = "fog-music-media", env = "FOG_S3_BUCKET")]
    pub bucket: String,

    /// DynamoDB table receiving catalog records.
    #[arg(long, default_value = "fog-music-songs", env = "FOG_CATALOG_TABLE")]
    pub table: String,

    #[arg(long, default_value = "us-east-1", env = "FOG_AWS_REGION")]
    pub region: String,

    /// Named AWS profile.
    #[arg(long, env = "FOG_AWS_PROFILE")]
    pub profile: Option<String>,

    /// Endpoint override for S3-compatible services and local DynamoDB.
    #[arg(long, env = "FOG_AWS_ENDPOINT")]
    pub endpoint: Option<String>,

    #[arg(long, env = "FOG_AWS_ACCESS_KEY_ID")]
    pub access_key: Option<String>,

    #[arg(long, env = "FOG_AWS_SECRET_ACCESS_KEY")]
    pub secret_key: Option<String>,

    /// Tracks processed at once. 1 keeps manifest order.
    #[arg(long, default_value_t = 1, env = "FOG_MAX_CONCURRENT_TRACKS")]
    pub concurrency: usize,

    /// Shared AES-256 key, 64 hex chars. Falls back to the system keyring.
    #[arg(long, env = "FOG_ENCRYPTION_KEY", hide_env_values = true)]
    pub encryption_key: Option<String>,
}

/// Resolved settings for one run
#[derive(Clone)]
pub struct Config {
    pub audio_dir: PathBuf,
    pub thumbnails_dir: PathBuf,
    pub manifest_path: PathBuf,
    pub audio_extensions: Vec<String>,
    pub bucket: String,
    pub table: String,
    pub aws: AwsConfig,
    pub max_concurrent_tracks: usize,
    pub encryption_key: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("audio_dir", &self.audio_dir)
            .field("thumbnails_dir", &self.thumbnails_dir)
            .field("manifest_path", &self.manifest_path)
            .field("audio_extensions", &self.audio_extensions)
            .field("bucket", &self.bucket)
            .field("table", &self.table)
            .field("region", &self.aws.region)
            .field("endpoint_url", &self.aws.endpoint_url)
            .field("max_concurrent_tracks", &self.max_concurrent_tracks)
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    /// Load `.env` if present, then parse flags (with environment fallbacks)
    pub fn load() -> Result<Self, ConfigError> {
        if dotenvy::dotenv().is_ok() {
            info!("Config: Loaded .env file");
        } else {
            info!("Config: No .env file found, using flags and environment");
        }

        let args = match ConfigArgs::try_parse() {
            Ok(args) => args,
            Err(e) if is_informational(&e) => e.exit(),
            Err(e) => return Err(e.into()),
        };
        Self::from_args(args)
    }

    pub fn from_args(args: ConfigArgs) -> Result<Self, ConfigError> {
        let audio_extensions = args
            .audio_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();

        let config = Config {
            audio_dir: args.audio_dir,
            thumbnails_dir: args.thumbnails_dir,
            manifest_path: args.manifest_path,
            audio_extensions,
            bucket: args.bucket.trim().to_string(),
            table: args.table.trim().to_string(),
            aws: AwsConfig {
                region: args.region.trim().to_string(),
                profile: non_empty(args.profile),
                access_key_id: non_empty(args.access_key),
                secret_access_key: non_empty(args.secret_key),
                endpoint_url: non_empty(args.endpoint),
            },
            max_concurrent_tracks: args.concurrency,
            encryption_key: non_empty(args.encryption_key),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.is_empty() {
            return Err(ConfigError::Empty("Bucket"));
        }
        if self.table.is_empty() {
            return Err(ConfigError::Empty("Table"));
        }
        if self.aws.region.is_empty() {
            return Err(ConfigError::Empty("Region"));
        }
        if self.audio_extensions.is_empty() {
            return Err(ConfigError::Empty("Audio extension list"));
        }
        if self.max_concurrent_tracks == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.aws.access_key_id.is_some() != self.aws.secret_access_key.is_some() {
            return Err(ConfigError::PartialCredentials);
        }
        Ok(())
    }
}

/// `--help` and `--version` surface as clap errors but are not failures
fn is_informational(e: &clap::Error) -> bool {
    matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Each flag may appear once; tests that vary a flag leave it out of the base
    fn parse(extra: &[&str]) -> Result<Config, ConfigError> {
        let mut argv = vec![
            "fog-ingest",
            "--audio-dir",
            "audios",
            "--table",
            "fog-music-songs",
            "--region",
            "us-east-1",
        ];
        argv.extend_from_slice(extra);
        Config::from_args(ConfigArgs::try_parse_from(argv)?)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.audio_dir, PathBuf::from("audios"));
        assert_eq!(config.bucket, "fog-music-media");
        assert_eq!(config.table, "fog-music-songs");
        assert_eq!(config.aws.region, "us-east-1");
        assert_eq!(config.audio_extensions, vec!["mp3"]);
        assert_eq!(config.max_concurrent_tracks, 1);
    }

    #[test]
    fn test_extension_list() {
        let config = parse(&["--audio-ext", "mp3, .FLAC,,m4a"]).unwrap();
        assert_eq!(config.audio_extensions, vec!["mp3", "FLAC", "m4a"]);
    }

    #[test]
    fn test_rejects_empty_bucket() {
        assert!(matches!(
            parse(&["--bucket", "  "]),
            Err(ConfigError::Empty("Bucket"))
        ));
    }

    #[test]
    fn test_bucket_flag() {
        let config = parse(&["--bucket", " other-bucket "]).unwrap();
        assert_eq!(config.bucket, "other-bucket");
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        assert!(matches!(
            parse(&["--concurrency", "0"]),
            Err(ConfigError::ZeroConcurrency)
        ));

        let config = parse(&["--concurrency", "4"]).unwrap();
        assert_eq!(config.max_concurrent_tracks, 4);
    }

    #[test]
    fn test_help_and_version_are_not_failures() {
        for flag in ["--help", "--version"] {
            let err = ConfigArgs::try_parse_from(["fog-ingest", flag]).unwrap_err();
            assert!(is_informational(&err), "{} should not be an error", flag);
        }

        let err = ConfigArgs::try_parse_from(["fog-ingest", "--concurrency", "many"]).unwrap_err();
        assert!(!is_informational(&err));
    }

    #[test]
    fn test_rejects_half_credentials() {
        let result = parse(&["--access-key", "AKIA", "--secret-key", ""]);
        assert!(matches!(result, Err(ConfigError::PartialCredentials)));

        let config = parse(&["--access-key", "AKIA", "--secret-key", "secret"]).unwrap();
        assert_eq!(config.aws.access_key_id.as_deref(), Some("AKIA"));
    }

    #[test]
    fn test_blank_endpoint_is_none() {
        let config = parse(&["--endpoint", " "]).unwrap();
        assert!(config.aws.endpoint_url.is_none());
        assert!(!config.aws.force_path_style());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = parse(&["--encryption-key", "supersecret"]).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("<redacted>"));
    }
}
