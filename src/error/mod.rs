//! Error types for the signed-URL transfer client.
//!
//! Errors are grouped by the stage of the credential → sign → transfer chain
//! that produced them. Every error is terminal for the action that triggered
//! it; nothing here is retried.

pub(crate) mod mapping;

pub use mapping::{parse_error_body, StorageErrorResponse};

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum FileTransferError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Credential lookup failed.
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialError),

    /// The request was rejected before any network call.
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    /// URL signing failed.
    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    /// The HTTP transfer against a signed URL failed.
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// A listing body could not be parsed.
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),

    /// The object inventory could not be read.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// The operation was cancelled by the caller.
    #[error("Operation cancelled during {stage}")]
    Cancelled {
        /// Stage that was running when cancellation was observed.
        stage: OperationStage,
    },

    /// The operation exceeded its deadline.
    #[error("Operation timed out after {duration:?}")]
    Timeout {
        /// The configured operation timeout.
        duration: Duration,
    },
}

impl FileTransferError {
    /// Returns the HTTP status code if the error came from a storage response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FileTransferError::Transfer(e) => e.status_code(),
            _ => None,
        }
    }

    /// Returns the storage service error code (e.g. `NoSuchKey`), if any.
    pub fn storage_error_code(&self) -> Option<&str> {
        match self {
            FileTransferError::Transfer(e) => e.error_code(),
            _ => None,
        }
    }

    /// Returns true if the storage service rejected the request signature.
    pub fn is_signature_mismatch(&self) -> bool {
        matches!(self, FileTransferError::Transfer(e) if e.is_signature_mismatch())
    }

    /// Returns true if the operation was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FileTransferError::Cancelled { .. })
    }
}

/// Stage of the credential → sign → transfer chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStage {
    /// Fetching credentials from the provider.
    Credentials,
    /// Configuring the signer and signing the URL.
    Signing,
    /// Performing the HTTP transfer.
    Transfer,
    /// Reading the object inventory.
    Inventory,
}

impl fmt::Display for OperationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationStage::Credentials => "credential fetch",
            OperationStage::Signing => "signing",
            OperationStage::Transfer => "transfer",
            OperationStage::Inventory => "inventory fetch",
        };
        f.write_str(name)
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// No bucket was configured.
    #[error("Missing bucket: bucket must be specified via config or environment")]
    MissingBucket,

    /// No region was configured.
    #[error("Missing region: region must be specified via config or environment")]
    MissingRegion,

    /// Invalid endpoint URL.
    #[error("Invalid endpoint URL: {url} ({details})")]
    InvalidEndpoint {
        /// The invalid URL.
        url: String,
        /// Details about the validation error.
        details: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {field} - {message}")]
    InvalidConfiguration {
        /// The configuration field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// No object inventory is attached to the browser.
    #[error("No object inventory configured")]
    MissingInventory,
}

/// Credential provider errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// No credentials could be found.
    #[error("Credentials not found: {message}")]
    NotFound {
        /// Where the lookup looked.
        message: String,
    },

    /// Credentials have expired.
    #[error("Credentials expired at {expiration}")]
    Expired {
        /// When the credentials expired.
        expiration: String,
    },

    /// Credentials are malformed.
    #[error("Invalid credentials: {message}")]
    Invalid {
        /// Details about why credentials are invalid.
        message: String,
    },

    /// The provider itself failed.
    #[error("Credential provider '{provider}' failed: {message}")]
    Provider {
        /// Provider name.
        provider: String,
        /// Opaque provider error message.
        message: String,
    },
}

/// Request validation errors raised before any network call.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Object key is required for the operation but absent or empty.
    #[error("Missing object key: {operation} requires a non-empty key")]
    MissingKey {
        /// Operation name.
        operation: &'static str,
    },

    /// Object key is present but not acceptable.
    #[error("Invalid object key '{key}': {reason}")]
    InvalidKey {
        /// The rejected key.
        key: String,
        /// Reason why the key is invalid.
        reason: String,
    },

    /// Content type is required for uploads.
    #[error("Missing content type: putObject requires a content type")]
    MissingContentType,

    /// Content type is not a MIME type.
    #[error("Invalid content type '{content_type}': {reason}")]
    InvalidContentType {
        /// The rejected content type.
        content_type: String,
        /// Parser message.
        reason: String,
    },

    /// Page size is out of the accepted range.
    #[error("Invalid max results {value}: must be between 1 and {max}")]
    InvalidMaxResults {
        /// Requested value.
        value: u32,
        /// Upper bound.
        max: u32,
    },

    /// Bucket name does not follow naming rules.
    #[error("Invalid bucket name '{bucket}': {reason}")]
    InvalidBucketName {
        /// The rejected bucket name.
        bucket: String,
        /// Reason why the name is invalid.
        reason: String,
    },

    /// A parameter was given to an operation that doesn't accept it.
    #[error("Unexpected parameter '{parameter}' for {operation}")]
    UnexpectedParameter {
        /// Parameter name.
        parameter: &'static str,
        /// Operation name.
        operation: &'static str,
    },
}

/// URL signing errors.
#[derive(Debug, Error)]
pub enum SigningError {
    /// Requested URL lifetime is out of range.
    #[error("Invalid expiration: {seconds}s is outside 1..={max}s")]
    InvalidExpiration {
        /// Requested lifetime in seconds.
        seconds: u64,
        /// Maximum lifetime in seconds.
        max: u64,
    },

    /// Credentials can't be used for signing.
    #[error("Invalid signing credentials: {message}")]
    InvalidCredentials {
        /// Details.
        message: String,
    },

    /// The URL to sign could not be built.
    #[error("Invalid URL: {message}")]
    InvalidUrl {
        /// Details.
        message: String,
    },

    /// The signer doesn't support the operation.
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation {
        /// Operation name.
        operation: String,
    },

    /// The underlying signer failed.
    #[error("Signer failed: {message}")]
    Signer {
        /// Wrapped signer error message.
        message: String,
    },
}

/// HTTP transfer errors.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The storage service answered with a non-2xx status.
    #[error("{method} failed with status {status}{}", code_suffix(.code))]
    Status {
        /// HTTP method of the request.
        method: String,
        /// HTTP status code.
        status: u16,
        /// Storage error code, when the body carried one.
        code: Option<String>,
        /// Storage error message, when the body carried one.
        message: Option<String>,
        /// Request ID assigned by the storage service.
        request_id: Option<String>,
    },

    /// The signed URL is bound to a different method than the call.
    #[error("Method mismatch: signed for {signed}, used for {requested}")]
    MethodMismatch {
        /// Method bound into the signed URL.
        signed: String,
        /// Method the executor was asked to use.
        requested: String,
    },

    /// Connection could not be established or was dropped.
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        /// Error message.
        message: String,
    },

    /// Request timed out at the transport level.
    #[error("Request timed out: {message}")]
    Timeout {
        /// Error message.
        message: String,
    },

    /// TLS/client construction error.
    #[error("TLS error: {message}")]
    Tls {
        /// Error message.
        message: String,
    },

    /// Response body could not be read.
    #[error("Failed to read response body: {message}")]
    BodyRead {
        /// Error message.
        message: String,
    },
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_ref().map(|c| format!(" ({})", c)).unwrap_or_default()
}

impl TransferError {
    /// Returns the HTTP status code, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TransferError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the storage error code, if any.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            TransferError::Status { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Returns the storage request ID, if any.
    pub fn request_id(&self) -> Option<&str> {
        match self {
            TransferError::Status { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    /// Returns true if the storage service rejected the signature.
    pub fn is_signature_mismatch(&self) -> bool {
        self.error_code() == Some("SignatureDoesNotMatch")
    }
}

/// Listing body parse errors.
#[derive(Debug, Error)]
pub enum ListingError {
    /// The body isn't well-formed XML.
    #[error("Malformed listing XML: {message}")]
    Malformed {
        /// Parser message.
        message: String,
    },

    /// The body isn't a ListObjectsV2 result.
    #[error("Unexpected listing root element '{element}'")]
    UnexpectedRoot {
        /// Root element found.
        element: String,
    },

    /// An entry is missing a required field.
    #[error("Listing entry is missing '{field}'")]
    MissingField {
        /// Field name.
        field: &'static str,
    },

    /// A field value couldn't be parsed.
    #[error("Invalid value '{value}' for '{field}'")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Raw value.
        value: String,
    },
}

/// Object inventory errors.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The inventory source could not be reached.
    #[error("Inventory unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },

    /// The inventory returned data that couldn't be decoded.
    #[error("Malformed inventory data: {message}")]
    Malformed {
        /// Error message.
        message: String,
    },
}
