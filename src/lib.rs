//! Signed-URL File Transfer
//!
//! Browse, upload and preview files held in an S3-compatible bucket without
//! routing bytes through an application server. Every action fetches fresh
//! credentials, configures a signer scoped to that action, obtains a
//! short-lived presigned URL and performs one HTTP request against it.
//!
//! # Features
//!
//! - **Three operations**: list (ListObjectsV2), put and get
//! - **AWS Signature V4**: native query-string presigning
//! - **Cancellation**: every stage observes a `CancellationToken`
//! - **Testable seams**: credential provider, signer factory, transport and
//!   inventory are traits with mocks in [`mocks`]
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use signed_transfer::{
//!     Credentials, FileBrowser, FileUpload, StaticCredentialProvider, StorageTarget,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), signed_transfer::FileTransferError> {
//!     let browser = FileBrowser::builder()
//!         .target(StorageTarget::new("team-files", "eu-central-1"))
//!         .credentials(Arc::new(StaticCredentialProvider::new(Credentials::new(
//!             "AKID", "SECRET",
//!         ))))
//!         .build()?;
//!
//!     for entry in browser.list_files().await? {
//!         println!("{} ({} bytes)", entry.key, entry.size);
//!     }
//!
//!     let upload = FileUpload::new("report.pdf", vec![0u8; 1024])
//!         .with_content_type("application/pdf");
//!     browser.upload_file(upload).await?;
//!
//!     let preview = browser.get_preview_url("report.pdf").await?;
//!     println!("preview until {}: {}", preview.expires_at, preview.url);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod inventory;
pub mod listing;
pub mod mocks;
pub mod services;
pub mod signing;
pub mod transfer;
pub mod transport;
pub mod types;

// Re-export main types at crate root
pub use client::{FileBrowser, FileBrowserBuilder};
pub use config::{StorageTarget, TransferConfig, TransferConfigBuilder};
pub use credentials::{
    CredentialProvider, Credentials, EnvCredentialProvider, StaticCredentialProvider,
};
pub use error::{
    ConfigurationError, CredentialError, FileTransferError, InventoryError, ListingError,
    OperationStage, RequestError, SigningError, TransferError,
};
pub use inventory::{JsonInventory, ObjectInventory, StaticInventory};
pub use listing::{parse_listing, parse_listing_page};
pub use services::SignedUrlClient;
pub use signing::{SigV4Signer, SigV4SignerFactory, SignerFactory, UrlSigner};
pub use transfer::TransferExecutor;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{
    DownloadedObject, FileRecord, FileUpload, ListingPage, ObjectEntry, Operation, RawListing,
    SignRequest, SignedUrl, UploadAck,
};
pub use tokio_util::sync::CancellationToken;

/// Create a browser from environment variables.
///
/// Reads the target and settings described on [`StorageTarget::from_env`]
/// and [`TransferConfigBuilder::from_env`], and credentials from
/// `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`.
pub fn create_browser_from_env() -> Result<FileBrowser> {
    FileBrowserBuilder::new().from_env().build()
}

/// Result type alias for file transfer operations.
pub type Result<T> = std::result::Result<T, FileTransferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_exports() {
        let _ = std::any::type_name::<FileTransferError>();
        let _ = std::any::type_name::<FileBrowser>();
        let _ = std::any::type_name::<Credentials>();
        let _ = std::any::type_name::<SignRequest>();
        let _ = std::any::type_name::<SignedUrl>();
    }
}
