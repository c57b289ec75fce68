//! Signed URLs and transfer results.

use super::common::Operation;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// A time-limited URL authorizing one request of a fixed method.
#[derive(Debug, Clone)]
pub struct SignedUrl {
    /// The signed URL.
    pub url: Url,
    /// HTTP method the signature is bound to.
    pub method: Method,
    /// Operation the URL was signed for.
    pub operation: Operation,
    /// Expiration timestamp.
    pub expires_at: DateTime<Utc>,
    /// Headers that were signed and must accompany the request.
    pub signed_headers: HashMap<String, String>,
}

impl SignedUrl {
    /// The URL as a string.
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Check if the URL has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Get remaining time until expiration.
    pub fn time_remaining(&self) -> Option<chrono::Duration> {
        let remaining = self.expires_at - Utc::now();
        if remaining.num_seconds() > 0 {
            Some(remaining)
        } else {
            None
        }
    }

    /// The content type signed into the URL, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.signed_headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .map(|(_, v)| v.as_str())
    }

    /// URL without its query string, safe to log.
    pub fn redacted(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.to_string()
    }
}

/// Raw, unparsed listing response.
#[derive(Debug, Clone)]
pub struct RawListing {
    /// HTTP status code.
    pub status: u16,
    /// Content type of the body.
    pub content_type: Option<String>,
    /// Response body.
    pub body: Bytes,
    /// Request ID assigned by the service.
    pub request_id: Option<String>,
}

impl RawListing {
    /// Body as UTF-8 text.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }
}

/// Acknowledgment of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAck {
    /// HTTP status code.
    pub status: u16,
    /// ETag of the stored object.
    pub e_tag: Option<String>,
    /// Version ID, on versioned buckets.
    pub version_id: Option<String>,
    /// Request ID assigned by the service.
    pub request_id: Option<String>,
}

/// A downloaded object.
#[derive(Debug, Clone)]
pub struct DownloadedObject {
    /// Object body.
    pub body: Bytes,
    /// Content type.
    pub content_type: Option<String>,
    /// Content length reported by the service.
    pub content_length: Option<u64>,
    /// ETag.
    pub e_tag: Option<String>,
    /// Request ID assigned by the service.
    pub request_id: Option<String>,
}

/// One object from a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// Object key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
}

/// One page of a bucket listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Entries on this page.
    pub entries: Vec<ObjectEntry>,
    /// Whether more pages follow.
    pub is_truncated: bool,
    /// Token for the next page.
    pub next_continuation_token: Option<String>,
}

/// File metadata from the object inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Object path (key).
    pub path: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn signed(expires_at: DateTime<Utc>) -> SignedUrl {
        let mut signed_headers = HashMap::new();
        signed_headers.insert("host".to_string(), "example.com".to_string());
        signed_headers.insert("content-type".to_string(), "application/pdf".to_string());
        SignedUrl {
            url: Url::parse("https://example.com/report.pdf?X-Amz-Signature=abc").unwrap(),
            method: Method::PUT,
            operation: Operation::PutObject,
            expires_at,
            signed_headers,
        }
    }

    #[test]
    fn test_signed_url_not_expired() {
        let url = signed(Utc::now() + Duration::hours(1));
        assert!(!url.is_expired());
        assert!(url.time_remaining().is_some());
        assert_eq!(url.content_type(), Some("application/pdf"));
    }

    #[test]
    fn test_signed_url_expired() {
        let url = signed(Utc::now() - Duration::hours(1));
        assert!(url.is_expired());
        assert!(url.time_remaining().is_none());
    }

    #[test]
    fn test_redacted_drops_signature() {
        let url = signed(Utc::now());
        assert_eq!(url.redacted(), "https://example.com/report.pdf");
    }

    #[test]
    fn test_file_record_json_shape() {
        let record: FileRecord = serde_json::from_str(
            r#"{"path":"docs/a.pdf","sizeBytes":42,"lastModified":"2024-01-15T10:30:00Z"}"#,
        )
        .unwrap();
        assert_eq!(record.path, "docs/a.pdf");
        assert_eq!(record.size_bytes, 42);
    }
}
