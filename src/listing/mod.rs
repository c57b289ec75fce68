//! ListObjectsV2 response parsing.
//!
//! Pure functions over a [`RawListing`]; nothing here touches the network.
//! Only `Key`, `Size` and `LastModified` are extracted from each `Contents`
//! entry, plus the pagination fields from the result root.

use crate::error::ListingError;
use crate::types::{ListingPage, ObjectEntry, RawListing};
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

const ROOT_ELEMENT: &str = "ListBucketResult";

/// Parse a listing body into its object entries.
pub fn parse_listing(raw: &RawListing) -> Result<Vec<ObjectEntry>, ListingError> {
    Ok(parse_listing_page(raw)?.entries)
}

/// Parse a listing body into a page with pagination state.
pub fn parse_listing_page(raw: &RawListing) -> Result<ListingPage, ListingError> {
    let text = raw.text().map_err(|e| ListingError::Malformed {
        message: format!("body is not UTF-8: {}", e),
    })?;
    parse_listing_xml(text)
}

/// Parse ListObjectsV2 XML.
pub fn parse_listing_xml(xml: &str) -> Result<ListingPage, ListingError> {
    // Text is kept verbatim: keys may begin or end with whitespace.
    let mut reader = Reader::from_str(xml);

    let mut page = ListingPage::default();
    let mut path: Vec<String> = Vec::new();
    let mut entry = PendingEntry::default();
    let mut saw_root = false;

    loop {
        let event = reader.read_event().map_err(|e| ListingError::Malformed {
            message: format!("at byte {}: {}", reader.buffer_position(), e),
        })?;

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if path.is_empty() {
                    if name != ROOT_ELEMENT {
                        return Err(ListingError::UnexpectedRoot { element: name });
                    }
                    saw_root = true;
                }
                if path.len() == 1 && name == "Contents" {
                    entry = PendingEntry::default();
                }
                path.push(name);
            }
            Event::Empty(e) => {
                if path.is_empty() {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                    if name != ROOT_ELEMENT {
                        return Err(ListingError::UnexpectedRoot { element: name });
                    }
                    saw_root = true;
                }
            }
            Event::Text(e) => {
                let value = e
                    .unescape()
                    .map_err(|e| ListingError::Malformed {
                        message: e.to_string(),
                    })?
                    .to_string();

                match path_slice(&path).as_slice() {
                    [_, "Contents", "Key"] => append(&mut entry.key, &value),
                    [_, "Contents", "Size"] => append(&mut entry.size, &value),
                    [_, "Contents", "LastModified"] => append(&mut entry.last_modified, &value),
                    [_, "IsTruncated"] => {
                        page.is_truncated = value.trim().eq_ignore_ascii_case("true")
                    }
                    [_, "NextContinuationToken"] => {
                        append(&mut page.next_continuation_token, &value)
                    }
                    _ => {}
                }
            }
            Event::End(_) => {
                if path.len() == 2 && path[1] == "Contents" {
                    page.entries.push(std::mem::take(&mut entry).finish()?);
                }
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(ListingError::Malformed {
            message: "no ListBucketResult element".to_string(),
        });
    }
    if !path.is_empty() {
        return Err(ListingError::Malformed {
            message: format!("unclosed element '{}'", path.join("/")),
        });
    }

    Ok(page)
}

fn path_slice(path: &[String]) -> Vec<&str> {
    path.iter().map(String::as_str).collect()
}

fn append(field: &mut Option<String>, text: &str) {
    field.get_or_insert_with(String::new).push_str(text);
}

#[derive(Debug, Default)]
struct PendingEntry {
    key: Option<String>,
    size: Option<String>,
    last_modified: Option<String>,
}

impl PendingEntry {
    fn finish(self) -> Result<ObjectEntry, ListingError> {
        let key = self
            .key
            .filter(|k| !k.is_empty())
            .ok_or(ListingError::MissingField { field: "Key" })?;

        let raw_size = self.size.ok_or(ListingError::MissingField { field: "Size" })?;
        let size = raw_size
            .trim()
            .parse::<u64>()
            .map_err(|_| ListingError::InvalidField {
                field: "Size",
                value: raw_size.clone(),
            })?;

        let raw_modified = self
            .last_modified
            .ok_or(ListingError::MissingField {
                field: "LastModified",
            })?;
        let last_modified = DateTime::parse_from_rfc3339(raw_modified.trim())
            .map_err(|_| ListingError::InvalidField {
                field: "LastModified",
                value: raw_modified.clone(),
            })?
            .with_timezone(&Utc);

        Ok(ObjectEntry {
            key,
            size,
            last_modified,
        })
    }
}
