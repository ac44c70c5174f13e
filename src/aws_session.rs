use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use tracing::info;

/// Connection settings shared by the S3 and DynamoDB clients
#[derive(Debug, Clone, Default)]
pub struct AwsConfig {
    pub region: String,
    /// Named profile from ~/.aws/config, used when no static keys are given
    pub profile: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// For LocalStack/MinIO-style endpoints
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    /// S3-compatible endpoints generally need path-style addressing
    pub fn force_path_style(&self) -> bool {
        self.endpoint_url.is_some()
    }
}

/// Load one SDK config for both services.
///
/// Credential precedence: static keys, then the named profile, then the
/// default provider chain.
pub async fn load_sdk_config(config: &AwsConfig) -> SdkConfig {
    let mut builder = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()));

    match (&config.access_key_id, &config.secret_access_key) {
        (Some(access_key_id), Some(secret_access_key)) => {
            info!("Using static AWS credentials");
            let credentials = Credentials::new(
                access_key_id,
                secret_access_key,
                None, // session_token
                None, // expiration
                "fog-ingest-config",
            );
            builder = builder.credentials_provider(credentials);
        }
        _ => {
            if let Some(profile) = &config.profile {
                info!("Using AWS profile '{}'", profile);
                builder = builder.profile_name(profile);
            } else {
                info!("Using default AWS credential chain");
            }
        }
    }

    if let Some(endpoint) = &config.endpoint_url {
        let normalized_endpoint = endpoint.trim_end_matches('/').to_string();
        info!("Using custom AWS endpoint: {}", normalized_endpoint);
        builder = builder.endpoint_url(normalized_endpoint);
    }

    builder.load().await
}

/// Format AWS SDK error for better debugging
pub(crate) fn format_error_details(err: &dyn std::fmt::Debug) -> String {
    let err_str = format!("{:?}", err);
    if let Some(code_start) = err_str.find("code: Some(\"") {
        let code_end = err_str[code_start + 12..].find('"').unwrap_or(0);
        let code = &err_str[code_start + 12..code_start + 12 + code_end];
        if let Some(msg_start) = err_str.find("message: Some(\"") {
            let msg_end = err_str[msg_start + 15..].find('"').unwrap_or(0);
            let msg = &err_str[msg_start + 15..msg_start + 15 + msg_end];
            return format!("{}: {}", code, msg);
        }
    }
    err_str
}
