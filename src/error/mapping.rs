//! Parsing of storage service error bodies into structured fields.

use super::TransferError;
use quick_xml::events::Event;
use quick_xml::Reader;

/// Parsed S3 `<Error>` response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageErrorResponse {
    /// Error code (e.g. "SignatureDoesNotMatch").
    pub code: String,
    /// Human-readable error message.
    pub message: Option<String>,
    /// Request ID assigned by the service.
    pub request_id: Option<String>,
    /// Extended request ID.
    pub host_id: Option<String>,
}

/// Parse an S3 error body.
///
/// Returns `None` when the body is empty, not XML, or has no `<Code>`; the
/// status code alone then describes the failure.
pub fn parse_error_body(body: &[u8]) -> Option<StorageErrorResponse> {
    let text = std::str::from_utf8(body).ok()?;
    if text.trim().is_empty() {
        return None;
    }

    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut parsed = StorageErrorResponse::default();
    let mut current_element = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current_element = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
            }
            Ok(Event::Text(e)) => {
                let value = e.unescape().ok()?.to_string();
                match current_element.as_str() {
                    "Code" => parsed.code = value,
                    "Message" => parsed.message = Some(value),
                    "RequestId" => parsed.request_id = Some(value),
                    "HostId" => parsed.host_id = Some(value),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current_element.clear(),
            Ok(Event::Eof) => break,
            Err(_) => return None,
            _ => {}
        }
    }

    if parsed.code.is_empty() {
        None
    } else {
        Some(parsed)
    }
}

/// Build a [`TransferError::Status`] from a non-2xx response.
///
/// The request ID from the body wins over the header, matching what the
/// service reports in its own logs.
pub(crate) fn status_error(
    method: &str,
    status: u16,
    header_request_id: Option<&str>,
    body: &[u8],
) -> TransferError {
    let parsed = parse_error_body(body);
    let (code, message, body_request_id) = match parsed {
        Some(p) => (Some(p.code), p.message, p.request_id),
        None => (None, None, None),
    };

    TransferError::Status {
        method: method.to_string(),
        status,
        code,
        message,
        request_id: body_request_id.or_else(|| header_request_id.map(String::from)),
    }
}
