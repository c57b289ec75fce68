//! AWS Signature V4 query-string presigning.
//!
//! A [`SignerFactory`] turns freshly fetched [`Credentials`] into an
//! immutable [`UrlSigner`] scoped to one operation. The signer never holds
//! mutable state, so concurrent operations can't observe each other's
//! credentials.

pub(crate) mod canonical;
mod signer;

pub use signer::SigV4Signer;

use crate::credentials::Credentials;
use crate::error::{ConfigurationError, FileTransferError, SigningError};
use crate::types::{Operation, SignedUrl};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// AWS Signature V4 algorithm identifier.
pub const AWS_ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Service name for S3.
pub const S3_SERVICE: &str = "s3";

/// Payload hash used by presigned URLs.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Signs storage URLs for one operation.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    /// Presign `url` for `operation`.
    ///
    /// `headers` are signed into the URL and must be sent verbatim with the
    /// request.
    async fn presign(
        &self,
        operation: Operation,
        url: &Url,
        expires_in: Duration,
        headers: &HashMap<String, String>,
    ) -> Result<SignedUrl, FileTransferError>;
}

/// Builds a [`UrlSigner`] from credentials.
pub trait SignerFactory: Send + Sync {
    /// Configure a signer bound to `credentials` and `region`.
    fn configure(
        &self,
        credentials: Credentials,
        region: &str,
    ) -> Result<Arc<dyn UrlSigner>, FileTransferError>;
}

/// Factory producing [`SigV4Signer`]s for S3.
#[derive(Debug, Clone, Default)]
pub struct SigV4SignerFactory;

impl SigV4SignerFactory {
    /// Create a new factory.
    pub fn new() -> Self {
        Self
    }
}

impl SignerFactory for SigV4SignerFactory {
    fn configure(
        &self,
        credentials: Credentials,
        region: &str,
    ) -> Result<Arc<dyn UrlSigner>, FileTransferError> {
        if region.is_empty() {
            return Err(ConfigurationError::MissingRegion.into());
        }
        if credentials.access_key_id().is_empty() || credentials.secret_access_key().is_empty() {
            return Err(SigningError::InvalidCredentials {
                message: "access key ID and secret access key must be non-empty".to_string(),
            }
            .into());
        }
        if credentials.is_expired() {
            return Err(SigningError::InvalidCredentials {
                message: "credentials expired before signing".to_string(),
            }
            .into());
        }

        Ok(Arc::new(SigV4Signer::new(credentials, region)))
    }
}

/// Calculate SHA-256 hash of data.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Calculate HMAC-SHA256.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Generate the signing key for AWS Signature V4.
///
/// kDate = HMAC("AWS4" + SecretKey, Date)
/// kRegion = HMAC(kDate, Region)
/// kService = HMAC(kRegion, Service)
/// kSigning = HMAC(kService, "aws4_request")
pub fn derive_signing_key(
    secret_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Vec<u8> {
    let k_secret = format!("AWS4{}", secret_key);
    let k_date = hmac_sha256(k_secret.as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// Build the credential scope string.
///
/// Format: `{date}/{region}/{service}/aws4_request`
pub fn build_credential_scope(date_stamp: &str, region: &str, service: &str) -> String {
    format!("{}/{}/{}/aws4_request", date_stamp, region, service)
}

/// Build the credential string.
///
/// Format: `{access_key_id}/{credential_scope}`
pub fn build_credential_string(access_key_id: &str, credential_scope: &str) -> String {
    format!("{}/{}", access_key_id, credential_scope)
}

/// Format a timestamp for AWS signatures (`YYYYMMDD'T'HHMMSS'Z'`).
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Format a date stamp for AWS signatures (`YYYYMMDD`).
pub fn format_date_stamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y%m%d").to_string()
}

/// Compute the hex signature of a canonical request.
pub fn compute_signature(
    secret_key: &str,
    timestamp: &DateTime<Utc>,
    region: &str,
    service: &str,
    canonical_request: &str,
) -> String {
    let date_stamp = format_date_stamp(timestamp);
    let credential_scope = build_credential_scope(&date_stamp, region, service);

    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        AWS_ALGORITHM,
        format_datetime(timestamp),
        credential_scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let signing_key = derive_signing_key(secret_key, &date_stamp, region, service);
    hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()))
}

/// Host header value for a URL, including a non-default port.
pub fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Check if a header should be signed.
pub fn should_sign_header(header_name: &str) -> bool {
    let name_lower = header_name.to_lowercase();

    if name_lower == "host" || name_lower.starts_with("x-amz-") {
        return true;
    }

    name_lower == "content-type" || name_lower == "content-md5" || name_lower == "content-length"
}
