//! In-memory storage service that verifies presigned URLs.
//!
//! Recomputes the SigV4 query signature of every request from the method,
//! path, query and the headers named in `X-Amz-SignedHeaders`, then serves
//! ListObjectsV2, PutObject and GetObject from memory. Failures use the same
//! XML error bodies and status codes as S3.

use crate::config::StorageTarget;
use crate::credentials::Credentials;
use crate::error::TransferError;
use crate::signing::canonical::{build_canonical_query, build_canonical_request};
use crate::signing::{compute_signature, host_header, sha256_hex, AWS_ALGORITHM, UNSIGNED_PAYLOAD};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime, Utc};
use http::Method;
use parking_lot::Mutex;
use percent_encoding::percent_decode_str;
use std::collections::{BTreeMap, HashMap};
use url::Url;

/// An object held by [`MockStorageService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object body.
    pub body: Bytes,
    /// Content type sent with the upload.
    pub content_type: Option<String>,
    /// Upload time.
    pub last_modified: DateTime<Utc>,
    /// Quoted entity tag.
    pub e_tag: String,
}

/// In-memory S3 stand-in implementing [`HttpTransport`].
pub struct MockStorageService {
    target: StorageTarget,
    credentials: Credentials,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    requests: Mutex<Vec<HttpRequest>>,
}

struct Rejection {
    status: u16,
    code: &'static str,
    message: String,
}

impl Rejection {
    fn new(status: u16, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl MockStorageService {
    /// Create a service for `target` accepting URLs signed with `credentials`.
    pub fn new(target: StorageTarget, credentials: Credentials) -> Self {
        Self {
            target,
            credentials,
            objects: Mutex::new(BTreeMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Seed an object.
    pub fn put_object(&self, key: impl Into<String>, body: impl Into<Bytes>, content_type: &str) {
        let body = body.into();
        self.objects.lock().insert(
            key.into(),
            StoredObject {
                e_tag: format!("\"{}\"", &sha256_hex(&body)[..32]),
                body,
                content_type: Some(content_type.to_string()),
                last_modified: Utc::now(),
            },
        );
    }

    /// Look up a stored object.
    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().get(key).cloned()
    }

    /// Number of stored objects.
    pub fn object_count(&self) -> usize {
        self.objects.lock().len()
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn handle(&self, request: &HttpRequest) -> Result<HttpResponse, Rejection> {
        let url = Url::parse(&request.url)
            .map_err(|e| Rejection::new(400, "InvalidURI", e.to_string()))?;

        self.verify_signature(request, &url)?;

        let key = self.object_key(&url)?;
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();

        let is_list = query.get("list-type").map(String::as_str) == Some("2");

        if request.method == Method::GET && key.is_empty() && is_list {
            Ok(self.list(&query))
        } else if request.method == Method::PUT && !key.is_empty() {
            Ok(self.store(key, request))
        } else if request.method == Method::GET && !key.is_empty() {
            self.fetch(&key)
        } else {
            Err(Rejection::new(
                405,
                "MethodNotAllowed",
                "The specified method is not allowed against this resource.",
            ))
        }
    }

    fn verify_signature(&self, request: &HttpRequest, url: &Url) -> Result<(), Rejection> {
        let mut params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let param = |name: &str| {
            params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| {
                    Rejection::new(
                        403,
                        "AccessDenied",
                        format!("Query-string authentication requires {}", name),
                    )
                })
        };

        let algorithm = param("X-Amz-Algorithm")?;
        let credential = param("X-Amz-Credential")?;
        let amz_date = param("X-Amz-Date")?;
        let expires = param("X-Amz-Expires")?;
        let signed_headers = param("X-Amz-SignedHeaders")?;
        let provided_signature = param("X-Amz-Signature")?;

        if algorithm != AWS_ALGORITHM {
            return Err(Rejection::new(
                400,
                "AuthorizationQueryParametersError",
                "X-Amz-Algorithm only supports \"AWS4-HMAC-SHA256\"",
            ));
        }

        let scope: Vec<&str> = credential.split('/').collect();
        let (access_key, region, service) = match scope.as_slice() {
            [access_key, _date, region, service, "aws4_request"] => (*access_key, *region, *service),
            _ => {
                return Err(Rejection::new(
                    400,
                    "AuthorizationQueryParametersError",
                    "Error parsing the X-Amz-Credential parameter",
                ))
            }
        };
        if access_key != self.credentials.access_key_id() {
            return Err(Rejection::new(
                403,
                "InvalidAccessKeyId",
                "The AWS Access Key Id you provided does not exist in our records.",
            ));
        }
        if let Some(token) = self.credentials.session_token() {
            if param("X-Amz-Security-Token").ok().as_deref() != Some(token) {
                return Err(Rejection::new(
                    403,
                    "InvalidToken",
                    "The provided token is malformed or otherwise invalid.",
                ));
            }
        }

        let signed_at = NaiveDateTime::parse_from_str(&amz_date, "%Y%m%dT%H%M%SZ")
            .map_err(|_| {
                Rejection::new(
                    400,
                    "AuthorizationQueryParametersError",
                    "X-Amz-Date must be in the ISO8601 Long Format",
                )
            })?
            .and_utc();
        let expires: i64 = expires.parse().map_err(|_| {
            Rejection::new(
                400,
                "AuthorizationQueryParametersError",
                "X-Amz-Expires should be a number",
            )
        })?;
        if Utc::now() > signed_at + chrono::Duration::seconds(expires) {
            return Err(Rejection::new(403, "AccessDenied", "Request has expired"));
        }

        let mut headers: Vec<(String, String)> = Vec::new();
        for name in signed_headers.split(';') {
            let value = if name == "host" {
                host_header(url).unwrap_or_default()
            } else {
                request.get_header(name).unwrap_or_default().to_string()
            };
            headers.push((name.to_string(), value));
        }

        params.retain(|(k, _)| k != "X-Amz-Signature");
        let canonical_request = build_canonical_request(
            request.method.as_str(),
            url.path(),
            &build_canonical_query(&params),
            &headers,
            UNSIGNED_PAYLOAD,
        );
        let expected = compute_signature(
            self.credentials.secret_access_key(),
            &signed_at,
            region,
            service,
            &canonical_request,
        );

        if expected != provided_signature {
            return Err(Rejection::new(
                403,
                "SignatureDoesNotMatch",
                "The request signature we calculated does not match the signature you provided. Check your key and signing method.",
            ));
        }
        Ok(())
    }

    fn object_key(&self, url: &Url) -> Result<String, Rejection> {
        let bucket_prefix = if self.target.path_style || self.target.endpoint.is_some() {
            format!("/{}", self.target.bucket)
        } else {
            String::new()
        };

        let rest = url.path().strip_prefix(&bucket_prefix).ok_or_else(|| {
            Rejection::new(404, "NoSuchBucket", "The specified bucket does not exist")
        })?;

        Ok(percent_decode_str(rest.trim_start_matches('/'))
            .decode_utf8_lossy()
            .into_owned())
    }

    fn list(&self, query: &HashMap<String, String>) -> HttpResponse {
        let prefix = query.get("prefix").cloned().unwrap_or_default();
        let max_keys: usize = query
            .get("max-keys")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);
        let start_after = query.get("continuation-token").cloned();

        let objects = self.objects.lock();
        let matching: Vec<(&String, &StoredObject)> = objects
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| start_after.as_ref().map_or(true, |s| k.as_str() > s.as_str()))
            .collect();

        let page = &matching[..matching.len().min(max_keys)];
        let truncated = matching.len() > page.len();

        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <ListBucketResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">",
        );
        xml.push_str(&format!("<Name>{}</Name>", escape(&self.target.bucket)));
        xml.push_str(&format!("<Prefix>{}</Prefix>", escape(&prefix)));
        xml.push_str(&format!("<KeyCount>{}</KeyCount>", page.len()));
        xml.push_str(&format!("<MaxKeys>{}</MaxKeys>", max_keys));
        xml.push_str(&format!("<IsTruncated>{}</IsTruncated>", truncated));
        if truncated {
            if let Some((last, _)) = page.last() {
                xml.push_str(&format!(
                    "<NextContinuationToken>{}</NextContinuationToken>",
                    escape(last)
                ));
            }
        }
        for (key, object) in page {
            xml.push_str(&format!(
                "<Contents><Key>{}</Key><LastModified>{}</LastModified>\
                 <ETag>{}</ETag><Size>{}</Size><StorageClass>STANDARD</StorageClass></Contents>",
                escape(key),
                object.last_modified.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                escape(&object.e_tag),
                object.body.len()
            ));
        }
        xml.push_str("</ListBucketResult>");

        response(200)
            .with_header("content-type", "application/xml")
            .body(xml)
    }

    fn store(&self, key: String, request: &HttpRequest) -> HttpResponse {
        let body = request.body.clone().unwrap_or_default();
        let content_type = request
            .get_header("content-type")
            .unwrap_or("binary/octet-stream")
            .to_string();
        self.put_object(key.clone(), body, &content_type);

        let e_tag = self
            .object(&key)
            .map(|o| o.e_tag)
            .unwrap_or_default();
        response(200).with_header("etag", e_tag).body(Bytes::new())
    }

    fn fetch(&self, key: &str) -> Result<HttpResponse, Rejection> {
        let object = self.object(key).ok_or_else(|| {
            Rejection::new(404, "NoSuchKey", "The specified key does not exist.")
        })?;

        let mut builder = response(200)
            .with_header("etag", object.e_tag.clone())
            .with_header("content-length", object.body.len().to_string());
        if let Some(content_type) = &object.content_type {
            builder = builder.with_header("content-type", content_type.clone());
        }
        Ok(builder.body(object.body))
    }
}

fn escape(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}

fn request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..16].to_uppercase()
}

struct ResponseBuilder {
    status: u16,
    headers: HashMap<String, String>,
}

fn response(status: u16) -> ResponseBuilder {
    let mut headers = HashMap::new();
    headers.insert("x-amz-request-id".to_string(), request_id());
    ResponseBuilder { status, headers }
}

impl ResponseBuilder {
    fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_string(), value.into());
        self
    }

    fn body(self, body: impl Into<Bytes>) -> HttpResponse {
        HttpResponse {
            status: self.status,
            headers: self.headers,
            body: body.into(),
        }
    }
}

impl Rejection {
    fn into_response(self) -> HttpResponse {
        let builder = response(self.status).with_header("content-type", "application/xml");
        let id = builder
            .headers
            .get("x-amz-request-id")
            .cloned()
            .unwrap_or_default();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Error><Code>{}</Code><Message>{}</Message><RequestId>{}</RequestId></Error>",
            self.code,
            escape(&self.message),
            id
        );
        builder.body(xml)
    }
}

#[async_trait]
impl HttpTransport for MockStorageService {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransferError> {
        self.requests.lock().push(request.clone());

        let response = match self.handle(&request) {
            Ok(response) => response,
            Err(rejection) => {
                tracing::debug!(
                    code = rejection.code,
                    status = rejection.status,
                    "Mock storage rejected request"
                );
                rejection.into_response()
            }
        };
        Ok(response)
    }
}

impl std::fmt::Debug for MockStorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStorageService")
            .field("bucket", &self.target.bucket)
            .field("objects", &self.object_count())
            .finish_non_exhaustive()
    }
}
