//! Operation kinds supported by the signed-URL client.

use http::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three storage operations a URL can be signed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// ListObjectsV2 on the bucket.
    ListObjects,
    /// PutObject for one key.
    PutObject,
    /// GetObject for one key.
    GetObject,
}

impl Operation {
    /// HTTP method a URL signed for this operation is bound to.
    pub fn method(&self) -> Method {
        match self {
            Operation::ListObjects | Operation::GetObject => Method::GET,
            Operation::PutObject => Method::PUT,
        }
    }

    /// S3 API operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ListObjects => "listObjectsV2",
            Operation::PutObject => "putObject",
            Operation::GetObject => "getObject",
        }
    }

    /// Whether the operation addresses a single object key.
    pub fn requires_key(&self) -> bool {
        !matches!(self, Operation::ListObjects)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
