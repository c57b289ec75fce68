//! File browser: the caller-facing entry points.
//!
//! Every action runs one sequential chain:
//!
//! ```text
//! credential provider -> signer factory -> signed-URL client -> transfer executor
//! ```
//!
//! Credentials and signers are created per action and dropped with it. Each
//! stage observes a [`CancellationToken`], and the whole chain is bounded by
//! [`TransferConfig::operation_timeout`].

use crate::config::{StorageTarget, TransferConfig};
use crate::credentials::{CredentialProvider, EnvCredentialProvider};
use crate::error::{ConfigurationError, FileTransferError, ListingError, OperationStage};
use crate::inventory::ObjectInventory;
use crate::listing::parse_listing_page;
use crate::services::SignedUrlClient;
use crate::signing::{SigV4SignerFactory, SignerFactory};
use crate::transfer::TransferExecutor;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::*;
use bytes::Bytes;
use futures::stream::{self, Stream, TryStreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, warn};
use tracing_futures::Instrument;

/// Browses, uploads and previews files in one storage bucket.
#[derive(Clone)]
pub struct FileBrowser {
    target: Arc<StorageTarget>,
    config: Arc<TransferConfig>,
    credentials: Arc<dyn CredentialProvider>,
    signers: Arc<dyn SignerFactory>,
    executor: TransferExecutor,
    inventory: Option<Arc<dyn ObjectInventory>>,
}

impl FileBrowser {
    /// Create a builder.
    pub fn builder() -> FileBrowserBuilder {
        FileBrowserBuilder::new()
    }

    /// The storage target.
    pub fn target(&self) -> &StorageTarget {
        &self.target
    }

    /// The transfer configuration.
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// List the first page of objects in the bucket.
    pub async fn list_files(&self) -> Result<Vec<ObjectEntry>, FileTransferError> {
        self.list_files_with_cancel(&CancellationToken::new()).await
    }

    /// [`list_files`](Self::list_files) with a cancellation token.
    pub async fn list_files_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ObjectEntry>, FileTransferError> {
        let page = self.list_page_with_cancel(SignRequest::list(), cancel).await?;
        Ok(page.entries)
    }

    /// Fetch one listing page described by `request`.
    pub async fn list_page(&self, request: SignRequest) -> Result<ListingPage, FileTransferError> {
        self.list_page_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// [`list_page`](Self::list_page) with a cancellation token.
    pub async fn list_page_with_cancel(
        &self,
        request: SignRequest,
        cancel: &CancellationToken,
    ) -> Result<ListingPage, FileTransferError> {
        let span = debug_span!("list_files", bucket = %self.target.bucket);
        self.bounded(async {
            let signed = self.sign(&request, cancel).await?;
            let raw = stage(cancel, OperationStage::Transfer, self.executor.list(&signed)).await?;
            let page = parse_listing_page(&raw)?;
            debug!(
                entries = page.entries.len(),
                truncated = page.is_truncated,
                "Listed objects"
            );
            Ok(page)
        })
        .instrument(span)
        .await
    }

    /// Stream every listing page, following continuation tokens.
    ///
    /// Each page is fetched by its own credential, sign and transfer chain.
    pub fn list_pages(&self) -> impl Stream<Item = Result<ListingPage, FileTransferError>> + Send {
        self.list_pages_with_cancel(CancellationToken::new())
    }

    /// [`list_pages`](Self::list_pages) with a cancellation token.
    pub fn list_pages_with_cancel(
        &self,
        cancel: CancellationToken,
    ) -> impl Stream<Item = Result<ListingPage, FileTransferError>> + Send {
        let browser = self.clone();
        stream::try_unfold(Some(None), move |state| {
            next_page(browser.clone(), cancel.clone(), state)
        })
    }

    /// List every object in the bucket.
    pub async fn list_all_files(&self) -> Result<Vec<ObjectEntry>, FileTransferError> {
        self.list_all_files_with_cancel(&CancellationToken::new())
            .await
    }

    /// [`list_all_files`](Self::list_all_files) with a cancellation token.
    pub async fn list_all_files_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ObjectEntry>, FileTransferError> {
        self.list_pages_with_cancel(cancel.clone())
            .map_ok(|page| page.entries)
            .try_concat()
            .await
    }

    /// Upload a file under its own name.
    pub async fn upload_file(&self, upload: FileUpload) -> Result<UploadAck, FileTransferError> {
        self.upload_file_with_cancel(upload, &CancellationToken::new())
            .await
    }

    /// [`upload_file`](Self::upload_file) with a cancellation token.
    pub async fn upload_file_with_cancel(
        &self,
        upload: FileUpload,
        cancel: &CancellationToken,
    ) -> Result<UploadAck, FileTransferError> {
        let span = debug_span!(
            "upload_file",
            bucket = %self.target.bucket,
            key = %upload.name,
            size = upload.len()
        );
        self.bounded(async {
            let request = SignRequest::put(upload.name.clone(), upload.content_type.clone());
            let signed = self.sign(&request, cancel).await?;
            let ack = stage(
                cancel,
                OperationStage::Transfer,
                self.executor
                    .upload(&signed, upload.body.clone(), &upload.content_type),
            )
            .await?;
            debug!(e_tag = ack.e_tag.as_deref().unwrap_or(""), "Uploaded file");
            Ok(ack)
        })
        .instrument(span)
        .await
    }

    /// Upload raw bytes under `name`.
    pub async fn upload_bytes(
        &self,
        name: impl Into<String>,
        body: impl Into<Bytes>,
        content_type: impl Into<String>,
    ) -> Result<UploadAck, FileTransferError> {
        self.upload_file(FileUpload::new(name, body).with_content_type(content_type))
            .await
    }

    /// Get a signed URL for previewing `key` without downloading it.
    pub async fn get_preview_url(&self, key: &str) -> Result<SignedUrl, FileTransferError> {
        self.get_preview_url_with_cancel(key, &CancellationToken::new())
            .await
    }

    /// [`get_preview_url`](Self::get_preview_url) with a cancellation token.
    pub async fn get_preview_url_with_cancel(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<SignedUrl, FileTransferError> {
        let span = debug_span!("get_preview_url", bucket = %self.target.bucket, key = %key);
        self.bounded(async {
            let signed = self.sign(&SignRequest::get(key), cancel).await?;
            debug!(url = %signed.redacted(), expires_at = %signed.expires_at, "Signed preview URL");
            Ok(signed)
        })
        .instrument(span)
        .await
    }

    /// Download `key`.
    pub async fn download_file(&self, key: &str) -> Result<DownloadedObject, FileTransferError> {
        self.download_file_with_cancel(key, &CancellationToken::new())
            .await
    }

    /// [`download_file`](Self::download_file) with a cancellation token.
    pub async fn download_file_with_cancel(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<DownloadedObject, FileTransferError> {
        let span = debug_span!("download_file", bucket = %self.target.bucket, key = %key);
        self.bounded(async {
            let signed = self.sign(&SignRequest::get(key), cancel).await?;
            stage(cancel, OperationStage::Transfer, self.executor.download(&signed)).await
        })
        .instrument(span)
        .await
    }

    /// Fetch file records from the configured inventory.
    pub async fn file_records(&self) -> Result<Vec<FileRecord>, FileTransferError> {
        self.file_records_with_cancel(&CancellationToken::new())
            .await
    }

    /// [`file_records`](Self::file_records) with a cancellation token.
    pub async fn file_records_with_cancel(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<FileRecord>, FileTransferError> {
        let inventory = self
            .inventory
            .as_ref()
            .ok_or(ConfigurationError::MissingInventory)?;

        self.bounded(stage(
            cancel,
            OperationStage::Inventory,
            inventory.fetch_file_records(),
        ))
        .instrument(debug_span!("file_records"))
        .await
    }

    /// Validate, fetch credentials, configure a signer and sign.
    async fn sign(
        &self,
        request: &SignRequest,
        cancel: &CancellationToken,
    ) -> Result<SignedUrl, FileTransferError> {
        request.validate()?;

        let credentials = stage(
            cancel,
            OperationStage::Credentials,
            self.credentials.fetch_credentials(&self.target),
        )
        .await?;
        debug!(provider = self.credentials.name(), "Fetched credentials");

        stage(cancel, OperationStage::Signing, async {
            let signer = self.signers.configure(credentials, &self.target.region)?;
            SignedUrlClient::new(self.config.clone(), signer)
                .sign(&self.target, request)
                .await
        })
        .await
    }

    async fn bounded<T>(
        &self,
        chain: impl Future<Output = Result<T, FileTransferError>>,
    ) -> Result<T, FileTransferError> {
        let duration = self.config.operation_timeout;
        match tokio::time::timeout(duration, chain).await {
            Ok(result) => result,
            Err(_) => {
                warn!(?duration, "Operation timed out");
                Err(FileTransferError::Timeout { duration })
            }
        }
    }
}

/// Pagination state: `None` once done, `Some(token)` while pages remain.
type PageCursor = Option<Option<String>>;

async fn next_page(
    browser: FileBrowser,
    cancel: CancellationToken,
    cursor: PageCursor,
) -> Result<Option<(ListingPage, PageCursor)>, FileTransferError> {
    let token = match cursor {
        Some(token) => token,
        None => return Ok(None),
    };

    let mut request = SignRequest::list();
    if let Some(token) = &token {
        request = request.with_continuation_token(token.clone());
    }
    let page = browser.list_page_with_cancel(request, &cancel).await?;

    let next = match (&page.next_continuation_token, page.is_truncated) {
        (Some(next), true) if Some(next) == token.as_ref() => {
            return Err(ListingError::InvalidField {
                field: "NextContinuationToken",
                value: next.clone(),
            }
            .into());
        }
        (Some(next), true) => Some(Some(next.clone())),
        (None, true) => {
            return Err(ListingError::MissingField {
                field: "NextContinuationToken",
            }
            .into())
        }
        _ => None,
    };
    Ok(Some((page, next)))
}

/// Run one stage, giving up as soon as `cancel` fires.
async fn stage<T>(
    cancel: &CancellationToken,
    stage: OperationStage,
    fut: impl Future<Output = Result<T, FileTransferError>>,
) -> Result<T, FileTransferError> {
    if cancel.is_cancelled() {
        return Err(FileTransferError::Cancelled { stage });
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(%stage, "Cancelled");
            Err(FileTransferError::Cancelled { stage })
        }
        result = fut => result,
    }
}

impl std::fmt::Debug for FileBrowser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBrowser")
            .field("target", &self.target)
            .field("config", &self.config)
            .field("credentials", &self.credentials.name())
            .field("inventory", &self.inventory.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`FileBrowser`].
#[derive(Default)]
pub struct FileBrowserBuilder {
    target: Option<StorageTarget>,
    config: Option<TransferConfig>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    signers: Option<Arc<dyn SignerFactory>>,
    transport: Option<Arc<dyn HttpTransport>>,
    inventory: Option<Arc<dyn ObjectInventory>>,
    from_env: bool,
}

impl FileBrowserBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage target.
    pub fn target(mut self, target: StorageTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the transfer configuration.
    pub fn config(mut self, config: TransferConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load target and configuration from environment variables when not
    /// set explicitly.
    pub fn from_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Use a credential provider. Defaults to [`EnvCredentialProvider`].
    pub fn credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Use a signer factory. Defaults to [`SigV4SignerFactory`].
    pub fn signer_factory(mut self, factory: Arc<dyn SignerFactory>) -> Self {
        self.signers = Some(factory);
        self
    }

    /// Use a custom HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Attach an object inventory.
    pub fn inventory(mut self, inventory: Arc<dyn ObjectInventory>) -> Self {
        self.inventory = Some(inventory);
        self
    }

    /// Build the browser.
    pub fn build(self) -> Result<FileBrowser, FileTransferError> {
        let target = match self.target {
            Some(target) => target,
            None if self.from_env => StorageTarget::from_env()?,
            None => return Err(ConfigurationError::MissingBucket.into()),
        };
        target.validate()?;

        let config = match self.config {
            Some(config) => config,
            None if self.from_env => TransferConfig::builder().from_env().build()?,
            None => TransferConfig::default(),
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::from_config(&config)?),
        };

        Ok(FileBrowser {
            target: Arc::new(target),
            config: Arc::new(config),
            credentials: self
                .credentials
                .unwrap_or_else(|| Arc::new(EnvCredentialProvider::new())),
            signers: self
                .signers
                .unwrap_or_else(|| Arc::new(SigV4SignerFactory::new())),
            executor: TransferExecutor::new(transport),
            inventory: self.inventory,
        })
    }
}
