//! Integration tests for the signed-URL client.

use signed_transfer::mocks::*;
use signed_transfer::*;
use std::sync::Arc;
use std::time::Duration;
use test_case::test_case;

fn create_test_client() -> (SignedUrlClient, Arc<MockSigner>) {
    let signer = Arc::new(MockSigner::new());
    let client = SignedUrlClient::new(Arc::new(TransferConfig::default()), signer.clone());
    (client, signer)
}

fn sigv4_client() -> SignedUrlClient {
    let signer = SigV4SignerFactory::new()
        .configure(TestFixtures::credentials(), "us-east-1")
        .unwrap();
    SignedUrlClient::new(Arc::new(TransferConfig::default()), signer)
}

#[test_case(SignRequest::list(), http::Method::GET ; "list signs get")]
#[test_case(SignRequest::put("report.pdf", "application/pdf"), http::Method::PUT ; "put signs put")]
#[test_case(SignRequest::get("report.pdf"), http::Method::GET ; "get signs get")]
#[tokio::test]
async fn test_method_bound_to_operation(request: SignRequest, method: http::Method) {
    let (client, _) = create_test_client();

    let signed = client
        .sign(&TestFixtures::target(), &request)
        .await
        .unwrap();

    assert_eq!(signed.method, method);
    assert_eq!(signed.operation, request.operation);
}

#[tokio::test]
async fn test_list_url_shape() {
    let (client, signer) = create_test_client();

    let request = SignRequest::list()
        .with_max_results(50)
        .with_prefix("docs/")
        .with_continuation_token("docs/a.pdf");
    let signed = client
        .sign(&TestFixtures::target(), &request)
        .await
        .unwrap();

    assert!(signed.as_str().starts_with("https://files.s3.us-east-1.amazonaws.com/?"));
    let query: Vec<(String, String)> = signed.url.query_pairs().into_owned().collect();
    assert!(query.contains(&("list-type".to_string(), "2".to_string())));
    assert!(query.contains(&("max-keys".to_string(), "50".to_string())));
    assert!(query.contains(&("prefix".to_string(), "docs/".to_string())));
    assert!(query.contains(&("continuation-token".to_string(), "docs/a.pdf".to_string())));

    assert_eq!(signer.calls()[0].expires_in, Duration::from_secs(900));
}

#[tokio::test]
async fn test_put_signs_content_type() {
    let (client, signer) = create_test_client();

    let signed = client
        .sign(
            &TestFixtures::target(),
            &SignRequest::put("report.pdf", "application/pdf"),
        )
        .await
        .unwrap();

    assert_eq!(signed.content_type(), Some("application/pdf"));
    let call = &signer.calls()[0];
    assert_eq!(call.url.path(), "/report.pdf");
    assert_eq!(
        call.headers.get("content-type").map(String::as_str),
        Some("application/pdf")
    );
}

#[test_case(SignRequest::put("", "application/pdf") ; "put")]
#[test_case(SignRequest::get("") ; "get")]
#[tokio::test]
async fn test_empty_key_never_reaches_signer(request: SignRequest) {
    let (client, signer) = create_test_client();

    let err = client
        .sign(&TestFixtures::target(), &request)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FileTransferError::InvalidRequest(RequestError::MissingKey { .. })
    ));
    assert_eq!(signer.presign_count(), 0);
}

#[test_case(Duration::from_secs(0) ; "zero")]
#[test_case(Duration::from_secs(7 * 24 * 3600 + 1) ; "beyond seven days")]
#[tokio::test]
async fn test_expiry_out_of_range(expires_in: Duration) {
    let (client, signer) = create_test_client();

    let err = client
        .sign(
            &TestFixtures::target(),
            &SignRequest::get("a.txt").with_expires_in(expires_in),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FileTransferError::Signing(SigningError::InvalidExpiration { .. })
    ));
    assert_eq!(signer.presign_count(), 0);
}

#[tokio::test]
async fn test_sigv4_url_parameters() {
    let client = sigv4_client();

    let signed = client
        .sign(
            &TestFixtures::target(),
            &SignRequest::get("docs/q1 report.pdf").with_expires_in(Duration::from_secs(60)),
        )
        .await
        .unwrap();

    assert_eq!(signed.url.path(), "/docs/q1%20report.pdf");
    let query: Vec<(String, String)> = signed.url.query_pairs().into_owned().collect();
    let param = |name: &str| {
        query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };

    assert_eq!(param("X-Amz-Algorithm").as_deref(), Some("AWS4-HMAC-SHA256"));
    assert_eq!(param("X-Amz-Expires").as_deref(), Some("60"));
    assert_eq!(param("X-Amz-SignedHeaders").as_deref(), Some("host"));
    assert!(param("X-Amz-Credential")
        .unwrap()
        .starts_with(&format!("{}/", MOCK_ACCESS_KEY_ID)));
    assert_eq!(param("X-Amz-Signature").unwrap().len(), 64);
    assert!(signed.time_remaining().unwrap() <= chrono::Duration::seconds(60));
}

#[tokio::test]
async fn test_sigv4_put_signs_content_type_header() {
    let client = sigv4_client();

    let signed = client
        .sign(
            &TestFixtures::target(),
            &SignRequest::put("report.pdf", "application/pdf"),
        )
        .await
        .unwrap();

    let signed_headers = signed
        .url
        .query_pairs()
        .find(|(k, _)| k == "X-Amz-SignedHeaders")
        .map(|(_, v)| v.into_owned());
    assert_eq!(signed_headers.as_deref(), Some("content-type;host"));
    assert_eq!(signed.content_type(), Some("application/pdf"));
}

#[tokio::test]
async fn test_path_style_target() {
    let (client, _) = create_test_client();

    let signed = client
        .sign(&TestFixtures::local_target(), &SignRequest::get("a.txt"))
        .await
        .unwrap();

    assert!(signed
        .as_str()
        .starts_with("http://storage.test:9000/files/a.txt?"));
}
