//! Mock implementations for testing.
//!
//! Every collaborator of [`crate::FileBrowser`] has a recording mock here,
//! plus [`MockStorageService`], an in-memory storage service that verifies
//! presigned URLs the way S3 does.

mod credentials;
mod inventory;
mod signer;
mod storage;
mod transport;

pub use credentials::{MockCredentialProvider, MOCK_ACCESS_KEY_ID, MOCK_SECRET_ACCESS_KEY};
pub use inventory::MockInventory;
pub use signer::{MockSigner, MockSignerFactory, PresignCall};
pub use storage::{MockStorageService, StoredObject};
pub use transport::{MockResponse, MockTransport};

use crate::config::StorageTarget;
use crate::credentials::Credentials;
use crate::types::*;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use url::Url;

/// Test fixtures.
pub struct TestFixtures;

impl TestFixtures {
    /// Example credentials accepted by [`MockStorageService::new`] fixtures.
    pub fn credentials() -> Credentials {
        Credentials::new(MOCK_ACCESS_KEY_ID, MOCK_SECRET_ACCESS_KEY)
    }

    /// Target on AWS with virtual-hosted addressing.
    pub fn target() -> StorageTarget {
        StorageTarget::new("files", "us-east-1")
    }

    /// Target on a custom endpoint with path-style addressing.
    pub fn local_target() -> StorageTarget {
        StorageTarget {
            endpoint: Url::parse("http://storage.test:9000").ok(),
            ..Self::target()
        }
    }

    /// A signed URL for `operation` carrying a mock signature.
    ///
    /// Put URLs have `application/pdf` signed in.
    pub fn signed_url(operation: Operation) -> SignedUrl {
        let path = match operation {
            Operation::ListObjects => "/?list-type=2&max-keys=1000",
            Operation::PutObject | Operation::GetObject => "/report.pdf",
        };
        let mut url = Url::parse(&format!("https://files.s3.us-east-1.amazonaws.com{}", path))
            .expect("fixture URL must parse");
        url.query_pairs_mut().append_pair("X-Amz-Signature", "mock");

        let mut signed_headers = HashMap::new();
        if operation == Operation::PutObject {
            signed_headers.insert("content-type".to_string(), "application/pdf".to_string());
        }

        SignedUrl {
            url,
            method: operation.method(),
            operation,
            expires_at: Utc::now() + chrono::Duration::minutes(15),
            signed_headers,
        }
    }

    /// Sample inventory records.
    pub fn file_records() -> Vec<FileRecord> {
        vec![
            FileRecord {
                path: "file1.txt".to_string(),
                size_bytes: 1024,
                last_modified: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            },
            FileRecord {
                path: "docs/report.pdf".to_string(),
                size_bytes: 2048,
                last_modified: Utc.with_ymd_and_hms(2024, 1, 16, 11, 30, 0).unwrap(),
            },
        ]
    }

    /// Sample ListObjectsV2 response body with two entries.
    pub fn list_objects_xml() -> &'static str {
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
    <Name>files</Name>
    <Prefix></Prefix>
    <KeyCount>2</KeyCount>
    <MaxKeys>1000</MaxKeys>
    <IsTruncated>false</IsTruncated>
    <Contents>
        <Key>file1.txt</Key>
        <LastModified>2024-01-15T10:30:00.000Z</LastModified>
        <ETag>"abc123"</ETag>
        <Size>1024</Size>
        <StorageClass>STANDARD</StorageClass>
    </Contents>
    <Contents>
        <Key>docs/report.pdf</Key>
        <LastModified>2024-01-16T11:30:00.000Z</LastModified>
        <ETag>"def456"</ETag>
        <Size>2048</Size>
        <StorageClass>STANDARD_IA</StorageClass>
    </Contents>
</ListBucketResult>"#
    }

    /// S3 error response body.
    pub fn error_xml(code: &str, message: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
    <Code>{}</Code>
    <Message>{}</Message>
    <RequestId>test-request-id</RequestId>
</Error>"#,
            code, message
        )
    }
}
