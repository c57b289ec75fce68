//! Request types for signing and uploading.

use super::common::Operation;
use crate::config::MAX_LIST_PAGE_SIZE;
use crate::error::RequestError;
use bytes::Bytes;
use std::time::Duration;

/// Maximum object key length in bytes.
pub const MAX_KEY_LENGTH: usize = 1024;

/// Parameters for signing one storage operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignRequest {
    /// Operation to sign for.
    pub operation: Operation,
    /// Object key; required for put and get, absent for list.
    pub key: Option<String>,
    /// MIME type the upload will carry; put only.
    pub content_type: Option<String>,
    /// Page size; list only.
    pub max_results: Option<u32>,
    /// Key prefix filter; list only.
    pub prefix: Option<String>,
    /// Token from a previous truncated page; list only.
    pub continuation_token: Option<String>,
    /// URL lifetime overriding the configured one.
    pub expires_in: Option<Duration>,
}

impl SignRequest {
    fn empty(operation: Operation) -> Self {
        Self {
            operation,
            key: None,
            content_type: None,
            max_results: None,
            prefix: None,
            continuation_token: None,
            expires_in: None,
        }
    }

    /// Sign a bucket listing.
    pub fn list() -> Self {
        Self::empty(Operation::ListObjects)
    }

    /// Sign an upload of `key` with the given MIME type.
    pub fn put(key: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            content_type: Some(content_type.into()),
            ..Self::empty(Operation::PutObject)
        }
    }

    /// Sign a download of `key`.
    pub fn get(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::empty(Operation::GetObject)
        }
    }

    /// Set the listing page size.
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Restrict the listing to keys under `prefix`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Continue a truncated listing.
    pub fn with_continuation_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }

    /// Override the URL lifetime.
    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    /// Check that the request has the shape its operation needs.
    pub fn validate(&self) -> Result<(), RequestError> {
        let operation = self.operation.as_str();

        if self.operation.requires_key() {
            let key = match self.key.as_deref() {
                Some(k) if !k.is_empty() => k,
                _ => return Err(RequestError::MissingKey { operation }),
            };
            validate_key(key)?;

            if self.max_results.is_some() {
                return Err(unexpected("max_results", operation));
            }
            if self.prefix.is_some() {
                return Err(unexpected("prefix", operation));
            }
            if self.continuation_token.is_some() {
                return Err(unexpected("continuation_token", operation));
            }
        } else {
            if self.key.is_some() {
                return Err(unexpected("key", operation));
            }
            if let Some(value) = self.max_results {
                if value == 0 || value > MAX_LIST_PAGE_SIZE {
                    return Err(RequestError::InvalidMaxResults {
                        value,
                        max: MAX_LIST_PAGE_SIZE,
                    });
                }
            }
        }

        match (self.operation, self.content_type.as_deref()) {
            (Operation::PutObject, None) => return Err(RequestError::MissingContentType),
            (Operation::PutObject, Some(content_type)) => validate_content_type(content_type)?,
            (_, Some(_)) => return Err(unexpected("content_type", operation)),
            (_, None) => {}
        }

        Ok(())
    }
}

fn unexpected(parameter: &'static str, operation: &'static str) -> RequestError {
    RequestError::UnexpectedParameter {
        parameter,
        operation,
    }
}

fn validate_key(key: &str) -> Result<(), RequestError> {
    let invalid = |reason: &str| RequestError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.len() > MAX_KEY_LENGTH {
        return Err(invalid("exceeds 1024 bytes"));
    }
    // URL normalization would rewrite these segments and break the signature.
    if key.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(invalid("contains a '.' or '..' path segment"));
    }
    if key.chars().any(|c| c.is_control()) {
        return Err(invalid("contains control characters"));
    }

    Ok(())
}

fn validate_content_type(content_type: &str) -> Result<(), RequestError> {
    content_type
        .parse::<mime::Mime>()
        .map(|_| ())
        .map_err(|e| RequestError::InvalidContentType {
            content_type: content_type.to_string(),
            reason: e.to_string(),
        })
}

/// A file handed over by a file picker.
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// File name, used as the object key.
    pub name: String,
    /// File contents.
    pub body: Bytes,
    /// MIME type of the contents.
    pub content_type: String,
}

impl FileUpload {
    /// Create an upload with `application/octet-stream` content.
    pub fn new(name: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            content_type: mime::APPLICATION_OCTET_STREAM.to_string(),
        }
    }

    /// Set the MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Size of the body in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_list_defaults_validate() {
        assert!(SignRequest::list().validate().is_ok());
        assert!(SignRequest::list()
            .with_max_results(1000)
            .with_prefix("docs/")
            .with_continuation_token("token")
            .validate()
            .is_ok());
    }

    #[test_case(0 ; "zero")]
    #[test_case(1001 ; "above page limit")]
    fn test_list_rejects_page_size(value: u32) {
        let err = SignRequest::list().with_max_results(value).validate().unwrap_err();
        assert!(matches!(err, RequestError::InvalidMaxResults { .. }));
    }

    #[test_case(SignRequest::put("", "application/pdf") ; "put with empty key")]
    #[test_case(SignRequest::get("") ; "get with empty key")]
    fn test_empty_key_is_rejected(request: SignRequest) {
        assert!(matches!(
            request.validate(),
            Err(RequestError::MissingKey { .. })
        ));
    }

    #[test]
    fn test_get_without_key_is_rejected() {
        let mut request = SignRequest::get("x");
        request.key = None;
        assert!(matches!(
            request.validate(),
            Err(RequestError::MissingKey { operation: "getObject" })
        ));
    }

    #[test]
    fn test_put_requires_valid_content_type() {
        let mut request = SignRequest::put("report.pdf", "application/pdf");
        assert!(request.validate().is_ok());

        request.content_type = None;
        assert!(matches!(
            request.validate(),
            Err(RequestError::MissingContentType)
        ));

        request.content_type = Some("not a mime".to_string());
        assert!(matches!(
            request.validate(),
            Err(RequestError::InvalidContentType { .. })
        ));
    }

    #[test_case("a/../b" ; "parent segment")]
    #[test_case("./a" ; "current segment")]
    #[test_case("tab\there" ; "control character")]
    fn test_invalid_keys(key: &str) {
        assert!(matches!(
            SignRequest::get(key).validate(),
            Err(RequestError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_overlong_key_is_rejected() {
        let key = "k".repeat(MAX_KEY_LENGTH + 1);
        assert!(matches!(
            SignRequest::get(key).validate(),
            Err(RequestError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_parameters_bound_to_operation() {
        let mut list = SignRequest::list();
        list.key = Some("report.pdf".to_string());
        assert!(matches!(
            list.validate(),
            Err(RequestError::UnexpectedParameter { parameter: "key", .. })
        ));

        let get = SignRequest::get("report.pdf").with_max_results(10);
        assert!(matches!(
            get.validate(),
            Err(RequestError::UnexpectedParameter { parameter: "max_results", .. })
        ));

        let mut get = SignRequest::get("report.pdf");
        get.content_type = Some("text/plain".to_string());
        assert!(matches!(
            get.validate(),
            Err(RequestError::UnexpectedParameter { parameter: "content_type", .. })
        ));
    }

    #[test]
    fn test_file_upload_defaults_to_octet_stream() {
        let upload = FileUpload::new("blob.bin", vec![0u8; 4]);
        assert_eq!(upload.content_type, "application/octet-stream");
        assert_eq!(upload.len(), 4);

        let upload = upload.with_content_type("image/png");
        assert_eq!(upload.content_type, "image/png");
    }
}
