//! Signed-URL client: turns a [`SignRequest`] into a [`SignedUrl`].

use crate::config::{StorageTarget, TransferConfig, MAX_URL_EXPIRATION};
use crate::error::{FileTransferError, RequestError, SigningError};
use crate::signing::UrlSigner;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Produces time-limited URLs for list, put and get.
///
/// Holds a signer configured for one operation's credentials, so a client
/// lives no longer than the action that created it.
pub struct SignedUrlClient {
    config: Arc<TransferConfig>,
    signer: Arc<dyn UrlSigner>,
}

impl SignedUrlClient {
    /// Create a new signed-URL client.
    pub fn new(config: Arc<TransferConfig>, signer: Arc<dyn UrlSigner>) -> Self {
        Self { config, signer }
    }

    /// Sign `request` against `target`.
    ///
    /// The request is validated before the signer is invoked.
    pub async fn sign(
        &self,
        target: &StorageTarget,
        request: &SignRequest,
    ) -> Result<SignedUrl, FileTransferError> {
        request.validate()?;

        let expires_in = request.expires_in.unwrap_or(self.config.url_expiration);
        if expires_in.as_secs() == 0 || expires_in > MAX_URL_EXPIRATION {
            return Err(SigningError::InvalidExpiration {
                seconds: expires_in.as_secs(),
                max: MAX_URL_EXPIRATION.as_secs(),
            }
            .into());
        }

        let (url, headers) = match request.operation {
            Operation::ListObjects => {
                let mut query = vec![
                    ("list-type", "2".to_string()),
                    (
                        "max-keys",
                        request
                            .max_results
                            .unwrap_or(self.config.list_page_size)
                            .to_string(),
                    ),
                ];
                if let Some(prefix) = &request.prefix {
                    query.push(("prefix", prefix.clone()));
                }
                if let Some(token) = &request.continuation_token {
                    query.push(("continuation-token", token.clone()));
                }
                (target.object_url(None, &query)?, HashMap::new())
            }
            Operation::PutObject => {
                let key = required_key(request)?;
                let content_type = request
                    .content_type
                    .clone()
                    .ok_or(RequestError::MissingContentType)?;
                let mut headers = HashMap::new();
                headers.insert("content-type".to_string(), content_type);
                (target.object_url(Some(key), &[])?, headers)
            }
            Operation::GetObject => {
                let key = required_key(request)?;
                (target.object_url(Some(key), &[])?, HashMap::new())
            }
        };

        debug!(
            operation = %request.operation,
            bucket = %target.bucket,
            key = request.key.as_deref().unwrap_or(""),
            expires_in_secs = expires_in.as_secs(),
            "Signing storage URL"
        );

        let signed = self
            .signer
            .presign(request.operation, &url, expires_in, &headers)
            .await?;

        if signed.method != request.operation.method() {
            return Err(SigningError::Signer {
                message: format!(
                    "signer bound {} URL to {} instead of {}",
                    request.operation,
                    signed.method,
                    request.operation.method()
                ),
            }
            .into());
        }

        Ok(signed)
    }
}

fn required_key(request: &SignRequest) -> Result<&str, RequestError> {
    request
        .key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or(RequestError::MissingKey {
            operation: request.operation.as_str(),
        })
}

impl std::fmt::Debug for SignedUrlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedUrlClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
