//! Configuration types.
//!
//! [`StorageTarget`] names the bucket and region files live in, and
//! [`TransferConfig`] carries signing and transport settings. Neither is
//! compiled in; both are supplied by the caller or loaded from the
//! environment.

use crate::error::{ConfigurationError, FileTransferError, RequestError};
use crate::signing::canonical::uri_encode_path;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Maximum lifetime of a presigned URL (7 days).
pub const MAX_URL_EXPIRATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default lifetime of a presigned URL (15 minutes).
pub const DEFAULT_URL_EXPIRATION: Duration = Duration::from_secs(900);

/// Largest page a single ListObjectsV2 call returns.
pub const MAX_LIST_PAGE_SIZE: u32 = 1000;

/// Bucket and region a browser operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageTarget {
    /// Bucket name.
    pub bucket: String,

    /// Region identifier (e.g., "eu-central-1").
    pub region: String,

    /// Custom endpoint URL (for S3-compatible services).
    #[serde(default)]
    pub endpoint: Option<Url>,

    /// Use path-style addressing instead of virtual-hosted style.
    ///
    /// Path-style: `https://s3.region.amazonaws.com/bucket/key`
    /// Virtual-hosted: `https://bucket.s3.region.amazonaws.com/key`
    #[serde(default)]
    pub path_style: bool,
}

impl StorageTarget {
    /// Create a target for an AWS bucket.
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            endpoint: None,
            path_style: false,
        }
    }

    /// Use a custom endpoint URL.
    pub fn with_endpoint(mut self, endpoint: impl AsRef<str>) -> Result<Self, FileTransferError> {
        let raw = endpoint.as_ref();
        let url = Url::parse(raw).map_err(|e| ConfigurationError::InvalidEndpoint {
            url: raw.to_string(),
            details: e.to_string(),
        })?;
        self.endpoint = Some(url);
        Ok(self)
    }

    /// Enable or disable path-style addressing.
    pub fn with_path_style(mut self, enabled: bool) -> Self {
        self.path_style = enabled;
        self
    }

    /// Load the target from environment variables.
    ///
    /// Reads `FILE_TRANSFER_BUCKET`, `AWS_REGION` (or `AWS_DEFAULT_REGION`),
    /// `AWS_ENDPOINT_URL_S3` (or `AWS_ENDPOINT_URL`) and
    /// `FILE_TRANSFER_PATH_STYLE`.
    pub fn from_env() -> Result<Self, FileTransferError> {
        let bucket = std::env::var("FILE_TRANSFER_BUCKET")
            .map_err(|_| ConfigurationError::MissingBucket)?;

        let region = std::env::var("AWS_REGION")
            .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
            .map_err(|_| ConfigurationError::MissingRegion)?;

        let mut target = Self::new(bucket, region);

        if let Ok(endpoint) = std::env::var("AWS_ENDPOINT_URL_S3")
            .or_else(|_| std::env::var("AWS_ENDPOINT_URL"))
        {
            target = target.with_endpoint(endpoint)?;
        }

        if let Ok(val) = std::env::var("FILE_TRANSFER_PATH_STYLE") {
            target.path_style = val.eq_ignore_ascii_case("true");
        }

        target.validate()?;
        Ok(target)
    }

    /// Short identifier handed to credential providers.
    pub fn identifier(&self) -> String {
        format!("{}@{}", self.bucket, self.region)
    }

    /// Check bucket and region against naming rules.
    pub fn validate(&self) -> Result<(), FileTransferError> {
        validate_bucket_name(&self.bucket)?;

        if self.region.is_empty() {
            return Err(ConfigurationError::MissingRegion.into());
        }
        if !self
            .region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ConfigurationError::InvalidConfiguration {
                field: "region".to_string(),
                message: format!("'{}' is not a valid region identifier", self.region),
            }
            .into());
        }

        Ok(())
    }

    /// Resolve the endpoint base URL for this target.
    pub fn resolve_endpoint(&self) -> Result<Url, FileTransferError> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.clone());
        }

        let host = format!("s3.{}.amazonaws.com", self.region);
        let url_str = if self.path_style {
            format!("https://{}", host)
        } else {
            format!("https://{}.{}", self.bucket, host)
        };

        Url::parse(&url_str).map_err(|e| {
            ConfigurationError::InvalidEndpoint {
                url: url_str.clone(),
                details: e.to_string(),
            }
            .into()
        })
    }

    /// Build the encoded request path for an object (or the bucket root).
    ///
    /// Custom endpoints always use path-style addressing.
    pub fn build_path(&self, key: Option<&str>) -> String {
        let encoded_key = key.map(uri_encode_path);
        if self.path_style || self.endpoint.is_some() {
            match encoded_key {
                Some(k) => format!("/{}/{}", self.bucket, k),
                None => format!("/{}", self.bucket),
            }
        } else {
            match encoded_key {
                Some(k) => format!("/{}", k),
                None => "/".to_string(),
            }
        }
    }

    /// Build the unsigned URL for an object or for the bucket.
    pub fn object_url(
        &self,
        key: Option<&str>,
        query: &[(&str, String)],
    ) -> Result<Url, FileTransferError> {
        let mut url = self.resolve_endpoint()?;
        let base_path = url.path().trim_end_matches('/').to_string();
        url.set_path(&format!("{}{}", base_path, self.build_path(key)));

        if query.is_empty() {
            url.set_query(None);
        } else {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }

        Ok(url)
    }
}

fn validate_bucket_name(bucket: &str) -> Result<(), RequestError> {
    let invalid = |reason: &str| RequestError::InvalidBucketName {
        bucket: bucket.to_string(),
        reason: reason.to_string(),
    };

    if bucket.len() < 3 || bucket.len() > 63 {
        return Err(invalid("must be between 3 and 63 characters"));
    }
    if !bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(invalid(
            "may only contain lowercase letters, digits, '.' and '-'",
        ));
    }
    let first = bucket.chars().next().unwrap_or('-');
    let last = bucket.chars().last().unwrap_or('-');
    if !first.is_ascii_alphanumeric() || !last.is_ascii_alphanumeric() {
        return Err(invalid("must start and end with a letter or digit"));
    }
    if bucket.contains("..") {
        return Err(invalid("must not contain consecutive dots"));
    }

    Ok(())
}

/// Signing and transport settings.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Lifetime of generated signed URLs.
    pub url_expiration: Duration,

    /// Default `max-keys` for listing requests.
    pub list_page_size: u32,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Read timeout for individual HTTP requests.
    pub read_timeout: Duration,

    /// Deadline for one whole credential → sign → transfer chain.
    pub operation_timeout: Duration,

    /// Maximum idle connections kept per host.
    pub max_idle_connections: usize,

    /// Idle connection timeout.
    pub idle_timeout: Duration,

    /// Verify TLS certificates.
    pub verify_ssl: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            url_expiration: DEFAULT_URL_EXPIRATION,
            list_page_size: MAX_LIST_PAGE_SIZE,
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
            operation_timeout: Duration::from_secs(300),
            max_idle_connections: 16,
            idle_timeout: Duration::from_secs(90),
            verify_ssl: true,
        }
    }
}

impl TransferConfig {
    /// Create a new configuration builder.
    pub fn builder() -> TransferConfigBuilder {
        TransferConfigBuilder::default()
    }
}

/// Builder for [`TransferConfig`].
#[derive(Debug, Default)]
pub struct TransferConfigBuilder {
    url_expiration: Option<Duration>,
    list_page_size: Option<u32>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    operation_timeout: Option<Duration>,
    max_idle_connections: Option<usize>,
    idle_timeout: Option<Duration>,
    verify_ssl: Option<bool>,
}

impl TransferConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signed URL lifetime.
    pub fn url_expiration(mut self, expiration: Duration) -> Self {
        self.url_expiration = Some(expiration);
        self
    }

    /// Set the default listing page size.
    pub fn list_page_size(mut self, size: u32) -> Self {
        self.list_page_size = Some(size);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the read timeout.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Set the per-operation deadline.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Set the maximum idle connections per host.
    pub fn max_idle_connections(mut self, max: usize) -> Self {
        self.max_idle_connections = Some(max);
        self
    }

    /// Set the idle connection timeout.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = Some(verify);
        self
    }

    /// Load overrides from environment variables.
    pub fn from_env(mut self) -> Self {
        if let Some(secs) = env_parse::<u64>("FILE_TRANSFER_URL_EXPIRATION_SECS") {
            self.url_expiration = Some(Duration::from_secs(secs));
        }
        if let Some(size) = env_parse::<u32>("FILE_TRANSFER_LIST_PAGE_SIZE") {
            self.list_page_size = Some(size);
        }
        if let Some(ms) = env_parse::<u64>("FILE_TRANSFER_TIMEOUT_MS") {
            self.operation_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = env_parse::<u64>("FILE_TRANSFER_CONNECT_TIMEOUT_MS") {
            self.connect_timeout = Some(Duration::from_millis(ms));
        }
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<TransferConfig, FileTransferError> {
        let defaults = TransferConfig::default();

        let url_expiration = self.url_expiration.unwrap_or(defaults.url_expiration);
        if url_expiration.as_secs() == 0 || url_expiration > MAX_URL_EXPIRATION {
            return Err(ConfigurationError::InvalidConfiguration {
                field: "url_expiration".to_string(),
                message: format!(
                    "must be between 1 and {} seconds",
                    MAX_URL_EXPIRATION.as_secs()
                ),
            }
            .into());
        }

        let list_page_size = self.list_page_size.unwrap_or(defaults.list_page_size);
        if list_page_size == 0 || list_page_size > MAX_LIST_PAGE_SIZE {
            return Err(ConfigurationError::InvalidConfiguration {
                field: "list_page_size".to_string(),
                message: format!("must be between 1 and {}", MAX_LIST_PAGE_SIZE),
            }
            .into());
        }

        let operation_timeout = self.operation_timeout.unwrap_or(defaults.operation_timeout);
        if operation_timeout.is_zero() {
            return Err(ConfigurationError::InvalidConfiguration {
                field: "operation_timeout".to_string(),
                message: "must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(TransferConfig {
            url_expiration,
            list_page_size,
            connect_timeout: self.connect_timeout.unwrap_or(defaults.connect_timeout),
            read_timeout: self.read_timeout.unwrap_or(defaults.read_timeout),
            operation_timeout,
            max_idle_connections: self
                .max_idle_connections
                .unwrap_or(defaults.max_idle_connections),
            idle_timeout: self.idle_timeout.unwrap_or(defaults.idle_timeout),
            verify_ssl: self.verify_ssl.unwrap_or(defaults.verify_ssl),
        })
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
