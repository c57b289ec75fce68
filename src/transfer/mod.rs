//! Transfer executor: one HTTP request per signed URL.
//!
//! The executor never retries. A non-2xx response becomes a
//! [`TransferError::Status`] carrying the storage error code parsed from the
//! body.

use crate::error::mapping::status_error;
use crate::error::{FileTransferError, TransferError};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::types::{DownloadedObject, RawListing, SignedUrl, UploadAck};
use bytes::Bytes;
use http::Method;
use std::sync::Arc;
use tracing::{debug, trace};

/// Performs list, upload and download requests against signed URLs.
#[derive(Clone)]
pub struct TransferExecutor {
    transport: Arc<dyn HttpTransport>,
}

impl TransferExecutor {
    /// Create an executor on top of a transport.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Fetch a listing. The body is returned unparsed.
    pub async fn list(&self, signed: &SignedUrl) -> Result<RawListing, FileTransferError> {
        check_method(signed, Method::GET)?;

        let response = self.execute(signed, None, None).await?;

        Ok(RawListing {
            status: response.status,
            content_type: response.content_type().map(String::from),
            request_id: response.request_id().map(String::from),
            body: response.body,
        })
    }

    /// Upload `body` with the given `Content-Type`.
    ///
    /// The header is sent exactly as given; if it differs from the one signed
    /// into the URL the storage service rejects the request.
    pub async fn upload(
        &self,
        signed: &SignedUrl,
        body: Bytes,
        content_type: &str,
    ) -> Result<UploadAck, FileTransferError> {
        check_method(signed, Method::PUT)?;

        let response = self
            .execute(signed, Some(body), Some(content_type))
            .await?;

        Ok(UploadAck {
            status: response.status,
            e_tag: response.etag().map(String::from),
            version_id: response.version_id().map(String::from),
            request_id: response.request_id().map(String::from),
        })
    }

    /// Download an object.
    pub async fn download(
        &self,
        signed: &SignedUrl,
    ) -> Result<DownloadedObject, FileTransferError> {
        check_method(signed, Method::GET)?;

        let response = self.execute(signed, None, None).await?;

        Ok(DownloadedObject {
            content_type: response.content_type().map(String::from),
            content_length: response
                .content_length()
                .or(Some(response.body.len() as u64)),
            e_tag: response.etag().map(String::from),
            request_id: response.request_id().map(String::from),
            body: response.body,
        })
    }

    async fn execute(
        &self,
        signed: &SignedUrl,
        body: Option<Bytes>,
        content_type: Option<&str>,
    ) -> Result<HttpResponse, TransferError> {
        let mut request = HttpRequest::new(signed.method.clone(), signed.url.as_str());

        for (name, value) in &signed.signed_headers {
            if name.eq_ignore_ascii_case("host") || name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            request = request.with_header(name.clone(), value.clone());
        }
        if let Some(content_type) = content_type {
            request = request.with_header("content-type", content_type);
        }
        if let Some(body) = body {
            request = request.with_body(body);
        }

        debug!(
            method = %signed.method,
            url = %signed.redacted(),
            body_len = request.body_len(),
            "Sending signed request"
        );

        let response = self.transport.send(request).await?;

        trace!(
            status = response.status,
            request_id = response.request_id().unwrap_or(""),
            "Received response"
        );

        if !response.is_success() {
            return Err(status_error(
                signed.method.as_str(),
                response.status,
                response.request_id(),
                &response.body,
            ));
        }

        Ok(response)
    }
}

fn check_method(signed: &SignedUrl, expected: Method) -> Result<(), TransferError> {
    if signed.method != expected {
        return Err(TransferError::MethodMismatch {
            signed: signed.method.to_string(),
            requested: expected.to_string(),
        });
    }
    Ok(())
}

impl std::fmt::Debug for TransferExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferExecutor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockResponse, MockTransport, TestFixtures};
    use crate::types::Operation;

    fn executor(transport: &Arc<MockTransport>) -> TransferExecutor {
        TransferExecutor::new(transport.clone())
    }

    #[tokio::test]
    async fn test_list_returns_raw_body() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_response(
            MockResponse::ok()
                .with_header("content-type", "application/xml")
                .with_header("x-amz-request-id", "req-1")
                .with_body(TestFixtures::list_objects_xml()),
        );

        let listing = executor(&transport)
            .list(&TestFixtures::signed_url(Operation::ListObjects))
            .await
            .unwrap();

        assert_eq!(listing.status, 200);
        assert_eq!(listing.request_id.as_deref(), Some("req-1"));
        assert_eq!(listing.text().unwrap(), TestFixtures::list_objects_xml());
        assert_eq!(transport.request_count(), 1);
        assert_eq!(transport.requests()[0].method, Method::GET);
    }

    #[tokio::test]
    async fn test_upload_sends_body_and_content_type() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_response(MockResponse::ok().with_header("etag", "\"etag-1\""));

        let ack = executor(&transport)
            .upload(
                &TestFixtures::signed_url(Operation::PutObject),
                Bytes::from(vec![7u8; 1024]),
                "application/pdf",
            )
            .await
            .unwrap();

        assert_eq!(ack.e_tag.as_deref(), Some("\"etag-1\""));
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::PUT);
        assert_eq!(requests[0].get_header("content-type"), Some("application/pdf"));
        assert_eq!(requests[0].body_len(), 1024);
    }

    #[tokio::test]
    async fn test_download_reports_status_error_without_retry() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_response(
            MockResponse::status(404).with_body(TestFixtures::error_xml("NoSuchKey", "missing")),
        );
        transport.queue_response(MockResponse::ok());

        let err = executor(&transport)
            .download(&TestFixtures::signed_url(Operation::GetObject))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.storage_error_code(), Some("NoSuchKey"));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_method_mismatch_fails_before_network() {
        let transport = Arc::new(MockTransport::new());
        let exec = executor(&transport);

        let err = exec
            .upload(
                &TestFixtures::signed_url(Operation::GetObject),
                Bytes::from_static(b"x"),
                "text/plain",
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FileTransferError::Transfer(TransferError::MethodMismatch { .. })
        ));

        let err = exec
            .list(&TestFixtures::signed_url(Operation::PutObject))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FileTransferError::Transfer(TransferError::MethodMismatch { .. })
        ));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_error(TransferError::ConnectionFailed {
            message: "connection reset".into(),
        });

        let err = executor(&transport)
            .download(&TestFixtures::signed_url(Operation::GetObject))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FileTransferError::Transfer(TransferError::ConnectionFailed { .. })
        ));
    }
}
