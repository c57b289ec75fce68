//! Canonical request building for AWS Signature V4.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;

/// Characters that should NOT be percent-encoded in URI paths.
const URI_PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Characters that should NOT be percent-encoded in query strings.
const QUERY_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// URI-encode an object key for use as a request path.
pub fn uri_encode_path(path: &str) -> String {
    utf8_percent_encode(path, URI_PATH_SET).to_string()
}

/// URI-encode a query parameter name or value.
pub fn uri_encode_query(value: &str) -> String {
    utf8_percent_encode(value, QUERY_SET).to_string()
}

/// Build the canonical query string from decoded pairs.
///
/// Names and values are encoded, then sorted by name and value.
pub fn build_canonical_query(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode_query(k), uri_encode_query(v)))
        .collect();
    encoded.sort();

    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build the canonical headers string.
///
/// Headers are lowercased, trimmed, sorted by name, and joined with newlines.
/// Multiple values for the same header are comma-separated.
pub fn build_canonical_headers(headers: &[(String, String)]) -> String {
    let mut header_map: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (name, value) in headers {
        let name_lower = name.to_lowercase();
        if !super::should_sign_header(&name_lower) {
            continue;
        }

        let trimmed = value.split_whitespace().collect::<Vec<_>>().join(" ");
        header_map.entry(name_lower).or_default().push(trimmed);
    }

    header_map
        .iter()
        .map(|(name, values)| format!("{}:{}\n", name, values.join(",")))
        .collect()
}

/// Build the signed headers string.
///
/// Returns a semicolon-separated list of lowercase header names.
pub fn build_signed_headers(headers: &[(String, String)]) -> String {
    let names: std::collections::BTreeSet<String> = headers
        .iter()
        .map(|(name, _)| name.to_lowercase())
        .filter(|name| super::should_sign_header(name))
        .collect();

    names.into_iter().collect::<Vec<_>>().join(";")
}

/// Build the canonical request string.
///
/// `canonical_uri` must already be encoded; `canonical_query` must come from
/// [`build_canonical_query`].
///
/// Format:
/// ```text
/// HTTPMethod\n
/// CanonicalURI\n
/// CanonicalQueryString\n
/// CanonicalHeaders\n
/// SignedHeaders\n
/// HashedPayload
/// ```
pub fn build_canonical_request(
    method: &str,
    canonical_uri: &str,
    canonical_query: &str,
    headers: &[(String, String)],
    payload_hash: &str,
) -> String {
    let uri = if canonical_uri.is_empty() { "/" } else { canonical_uri };

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method.to_uppercase(),
        uri,
        canonical_query,
        build_canonical_headers(headers),
        build_signed_headers(headers),
        payload_hash
    )
}
