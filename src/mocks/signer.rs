//! Mock signer and signer factory for testing.

use crate::credentials::Credentials;
use crate::error::{FileTransferError, SigningError};
use crate::signing::{SignerFactory, UrlSigner};
use crate::types::{Operation, SignedUrl};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// One recorded `presign` call.
#[derive(Debug, Clone)]
pub struct PresignCall {
    /// Operation signed for.
    pub operation: Operation,
    /// Unsigned URL.
    pub url: Url,
    /// Requested lifetime.
    pub expires_in: Duration,
    /// Headers to sign.
    pub headers: HashMap<String, String>,
}

/// Mock URL signer.
///
/// Appends a fixed `X-Amz-Signature=mock` parameter instead of signing.
pub struct MockSigner {
    failure: Mutex<Option<String>>,
    presign_count: AtomicUsize,
    calls: Mutex<Vec<PresignCall>>,
}

impl MockSigner {
    /// Create a new mock signer.
    pub fn new() -> Self {
        Self {
            failure: Mutex::new(None),
            presign_count: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make every presign call fail with a signer error.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        *self.failure.lock() = Some(message.into());
        self
    }

    /// Number of presign calls.
    pub fn presign_count(&self) -> usize {
        self.presign_count.load(Ordering::SeqCst)
    }

    /// Recorded presign calls.
    pub fn calls(&self) -> Vec<PresignCall> {
        self.calls.lock().clone()
    }
}

impl Default for MockSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlSigner for MockSigner {
    async fn presign(
        &self,
        operation: Operation,
        url: &Url,
        expires_in: Duration,
        headers: &HashMap<String, String>,
    ) -> Result<SignedUrl, FileTransferError> {
        self.presign_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(PresignCall {
            operation,
            url: url.clone(),
            expires_in,
            headers: headers.clone(),
        });

        if let Some(message) = self.failure.lock().clone() {
            return Err(SigningError::Signer { message }.into());
        }

        let mut signed = url.clone();
        signed
            .query_pairs_mut()
            .append_pair("X-Amz-Signature", "mock");

        Ok(SignedUrl {
            url: signed,
            method: operation.method(),
            operation,
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in.as_secs() as i64),
            signed_headers: headers
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.clone()))
                .collect(),
        })
    }
}

/// Mock signer factory handing out one shared [`MockSigner`].
pub struct MockSignerFactory {
    signer: Arc<MockSigner>,
    configure_count: AtomicUsize,
    regions: Mutex<Vec<String>>,
    access_keys: Mutex<Vec<String>>,
}

impl MockSignerFactory {
    /// Create a factory with a fresh mock signer.
    pub fn new() -> Self {
        Self::with_signer(Arc::new(MockSigner::new()))
    }

    /// Create a factory handing out `signer`.
    pub fn with_signer(signer: Arc<MockSigner>) -> Self {
        Self {
            signer,
            configure_count: AtomicUsize::new(0),
            regions: Mutex::new(Vec::new()),
            access_keys: Mutex::new(Vec::new()),
        }
    }

    /// The signer handed out by `configure`.
    pub fn signer(&self) -> Arc<MockSigner> {
        self.signer.clone()
    }

    /// Number of `configure` calls.
    pub fn configure_count(&self) -> usize {
        self.configure_count.load(Ordering::SeqCst)
    }

    /// Regions passed to `configure`.
    pub fn regions(&self) -> Vec<String> {
        self.regions.lock().clone()
    }

    /// Access key IDs passed to `configure`.
    pub fn access_keys(&self) -> Vec<String> {
        self.access_keys.lock().clone()
    }
}

impl Default for MockSignerFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SignerFactory for MockSignerFactory {
    fn configure(
        &self,
        credentials: Credentials,
        region: &str,
    ) -> Result<Arc<dyn UrlSigner>, FileTransferError> {
        self.configure_count.fetch_add(1, Ordering::SeqCst);
        self.regions.lock().push(region.to_string());
        self.access_keys
            .lock()
            .push(credentials.access_key_id().to_string());
        Ok(self.signer.clone())
    }
}
