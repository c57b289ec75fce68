//! Service implementations.
//!
//! - Signed URL: turn a sign request into a time-limited URL

mod signed_url;

pub use signed_url::SignedUrlClient;
