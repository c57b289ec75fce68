//! Integration tests for the transfer executor against an in-memory
//! storage service that verifies signatures.

use bytes::Bytes;
use chrono::Utc;
use signed_transfer::mocks::*;
use signed_transfer::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn signer() -> SigV4Signer {
    SigV4Signer::new(TestFixtures::credentials(), "us-east-1")
}

fn storage() -> Arc<MockStorageService> {
    Arc::new(MockStorageService::new(
        TestFixtures::local_target(),
        TestFixtures::credentials(),
    ))
}

fn presign(operation: Operation, key: Option<&str>, content_type: Option<&str>) -> SignedUrl {
    let url = TestFixtures::local_target().object_url(key, &[]).unwrap();
    let mut headers = HashMap::new();
    if let Some(content_type) = content_type {
        headers.insert("content-type".to_string(), content_type.to_string());
    }
    signer()
        .presign_at(operation, &url, Duration::from_secs(300), &headers, Utc::now())
        .unwrap()
}

#[tokio::test]
async fn test_upload_with_signed_content_type() {
    let storage = storage();
    let executor = TransferExecutor::new(storage.clone());

    let signed = presign(Operation::PutObject, Some("report.pdf"), Some("application/pdf"));
    let ack = executor
        .upload(&signed, Bytes::from(vec![7u8; 1024]), "application/pdf")
        .await
        .unwrap();

    assert_eq!(ack.status, 200);
    assert!(ack.e_tag.is_some());
    assert!(ack.request_id.is_some());

    let stored = storage.object("report.pdf").unwrap();
    assert_eq!(stored.body.len(), 1024);
    assert_eq!(stored.content_type.as_deref(), Some("application/pdf"));
}

#[tokio::test]
async fn test_content_type_mismatch_is_rejected() {
    let storage = storage();
    let executor = TransferExecutor::new(storage.clone());

    let signed = presign(Operation::PutObject, Some("report.pdf"), Some("application/pdf"));
    let err = executor
        .upload(&signed, Bytes::from_static(b"%PDF"), "text/plain")
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(403));
    assert!(err.is_signature_mismatch());
    assert_eq!(storage.object_count(), 0);
}

#[tokio::test]
async fn test_expired_url_is_rejected() {
    let storage = storage();
    let executor = TransferExecutor::new(storage.clone());

    let url = TestFixtures::local_target()
        .object_url(Some("a.txt"), &[])
        .unwrap();
    let signed = signer()
        .presign_at(
            Operation::GetObject,
            &url,
            Duration::from_secs(60),
            &HashMap::new(),
            Utc::now() - chrono::Duration::minutes(5),
        )
        .unwrap();
    assert!(signed.is_expired());

    let err = executor.download(&signed).await.unwrap_err();
    assert_eq!(err.status_code(), Some(403));
    assert_eq!(err.storage_error_code(), Some("AccessDenied"));
}

#[tokio::test]
async fn test_download_round_trip() {
    let storage = storage();
    storage.put_object("notes/todo.txt", "buy milk", "text/plain");
    let executor = TransferExecutor::new(storage.clone());

    let object = executor
        .download(&presign(Operation::GetObject, Some("notes/todo.txt"), None))
        .await
        .unwrap();

    assert_eq!(object.body, Bytes::from("buy milk"));
    assert_eq!(object.content_type.as_deref(), Some("text/plain"));
    assert_eq!(object.content_length, Some(8));
}

#[tokio::test]
async fn test_download_missing_key() {
    let executor = TransferExecutor::new(storage());

    let err = executor
        .download(&presign(Operation::GetObject, Some("missing.txt"), None))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.storage_error_code(), Some("NoSuchKey"));
}

#[tokio::test]
async fn test_list_returns_raw_body() {
    let storage = storage();
    storage.put_object("a.txt", "a", "text/plain");
    storage.put_object("b.txt", "bb", "text/plain");
    let executor = TransferExecutor::new(storage.clone());

    let url = TestFixtures::local_target()
        .object_url(None, &[("list-type", "2".to_string())])
        .unwrap();
    let signed = signer()
        .presign_at(
            Operation::ListObjects,
            &url,
            Duration::from_secs(300),
            &HashMap::new(),
            Utc::now(),
        )
        .unwrap();

    let raw = executor.list(&signed).await.unwrap();
    assert_eq!(raw.status, 200);
    assert_eq!(raw.content_type.as_deref(), Some("application/xml"));

    let entries = parse_listing(&raw).unwrap();
    let keys: Vec<&str> = entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["a.txt", "b.txt"]);
    assert_eq!(entries[1].size, 2);
}

#[tokio::test]
async fn test_method_mismatch_sends_nothing() {
    let storage = storage();
    let executor = TransferExecutor::new(storage.clone());

    let signed = presign(Operation::GetObject, Some("a.txt"), None);
    let err = executor
        .upload(&signed, Bytes::from_static(b"x"), "text/plain")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FileTransferError::Transfer(TransferError::MethodMismatch { .. })
    ));
    assert_eq!(storage.request_count(), 0);
}

#[tokio::test]
async fn test_connection_failure_surfaces() {
    let transport = Arc::new(MockTransport::new());
    transport.queue_error(TransferError::ConnectionFailed {
        message: "connection refused".to_string(),
    });
    let executor = TransferExecutor::new(transport.clone());

    let err = executor
        .download(&TestFixtures::signed_url(Operation::GetObject))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FileTransferError::Transfer(TransferError::ConnectionFailed { .. })
    ));
    assert_eq!(transport.request_count(), 1);
}
