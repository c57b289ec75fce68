//! Integration tests for the reqwest transport against a local HTTP server.

use signed_transfer::mocks::*;
use signed_transfer::*;
use std::sync::Arc;
use wiremock::matchers::{body_bytes, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn browser_for(server: &MockServer) -> FileBrowser {
    let target = StorageTarget::new("files", "us-east-1")
        .with_endpoint(server.uri())
        .unwrap();

    FileBrowser::builder()
        .target(target)
        .credentials(Arc::new(MockCredentialProvider::new()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_list_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files"))
        .and(query_param("list-type", "2"))
        .and(query_param("X-Amz-Algorithm", "AWS4-HMAC-SHA256"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml")
                .insert_header("x-amz-request-id", "REQ1")
                .set_body_string(TestFixtures::list_objects_xml()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let entries = browser_for(&server).await.list_files().await.unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].key, "docs/report.pdf");
    assert_eq!(entries[1].size, 2048);
}

#[tokio::test]
async fn test_upload_sends_body_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/files/report.pdf"))
        .and(header("content-type", "application/pdf"))
        .and(body_bytes(vec![0x25u8; 1024]))
        .respond_with(ResponseTemplate::new(200).insert_header("etag", "\"abc\""))
        .expect(1)
        .mount(&server)
        .await;

    let ack = browser_for(&server)
        .await
        .upload_bytes("report.pdf", vec![0x25u8; 1024], "application/pdf")
        .await
        .unwrap();

    assert_eq!(ack.status, 200);
    assert_eq!(ack.e_tag.as_deref(), Some("\"abc\""));
}

#[tokio::test]
async fn test_error_body_is_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/secret.txt"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-amz-request-id", "HDR-ID")
                .set_body_string(TestFixtures::error_xml(
                    "SignatureDoesNotMatch",
                    "The request signature we calculated does not match",
                )),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = browser_for(&server)
        .await
        .download_file("secret.txt")
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(403));
    assert!(err.is_signature_mismatch());
}

#[tokio::test]
async fn test_download_returns_body_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/notes.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .insert_header("etag", "\"e1\"")
                .set_body_string("hello world"),
        )
        .mount(&server)
        .await;

    let object = browser_for(&server)
        .await
        .download_file("notes.txt")
        .await
        .unwrap();

    assert_eq!(object.body.as_ref(), b"hello world");
    assert_eq!(object.content_type.as_deref(), Some("text/plain"));
    assert_eq!(object.e_tag.as_deref(), Some("\"e1\""));
}

#[tokio::test]
async fn test_connection_refused() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let target = StorageTarget::new("files", "us-east-1")
        .with_endpoint(uri)
        .unwrap();
    let browser = FileBrowser::builder()
        .target(target)
        .credentials(Arc::new(MockCredentialProvider::new()))
        .build()
        .unwrap();

    let err = browser.download_file("a.txt").await.unwrap_err();
    assert!(matches!(err, FileTransferError::Transfer(_)));
}

#[tokio::test]
async fn test_transport_from_config_sends_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/a.txt"))
        .and(header(
            "user-agent",
            concat!("s3-signed-transfer/", env!("CARGO_PKG_VERSION")),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("a"))
        .expect(1)
        .mount(&server)
        .await;

    let config = TransferConfig::builder()
        .connect_timeout(std::time::Duration::from_secs(2))
        .verify_ssl(false)
        .build()
        .unwrap();
    let transport = ReqwestTransport::from_config(&config).unwrap();

    let response = transport
        .send(HttpRequest::new(
            http::Method::GET,
            format!("{}/files/a.txt", server.uri()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body.as_ref(), b"a");
}
