//! Object inventory: file metadata records from outside the storage service.

use crate::error::{FileTransferError, InventoryError};
use crate::types::FileRecord;
use async_trait::async_trait;

/// Source of [`FileRecord`]s.
#[async_trait]
pub trait ObjectInventory: Send + Sync {
    /// Fetch all known file records.
    async fn fetch_file_records(&self) -> Result<Vec<FileRecord>, FileTransferError>;
}

/// Inventory backed by a fixed set of records.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    records: Vec<FileRecord>,
}

impl StaticInventory {
    /// Create an inventory from records.
    pub fn new(records: Vec<FileRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl ObjectInventory for StaticInventory {
    async fn fetch_file_records(&self) -> Result<Vec<FileRecord>, FileTransferError> {
        Ok(self.records.clone())
    }
}

/// Inventory loaded from a JSON document.
///
/// Accepts either an array of records or an object with a `records` array:
///
/// ```json
/// {"records": [{"path": "docs/a.pdf", "sizeBytes": 42, "lastModified": "2024-01-15T10:30:00Z"}]}
/// ```
#[derive(Debug, Clone)]
pub struct JsonInventory {
    records: Vec<FileRecord>,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum InventoryDocument {
    Bare(Vec<FileRecord>),
    Wrapped { records: Vec<FileRecord> },
}

impl JsonInventory {
    /// Parse an inventory document.
    pub fn from_json(json: &str) -> Result<Self, FileTransferError> {
        let document: InventoryDocument =
            serde_json::from_str(json).map_err(|e| InventoryError::Malformed {
                message: e.to_string(),
            })?;

        let records = match document {
            InventoryDocument::Bare(records) => records,
            InventoryDocument::Wrapped { records } => records,
        };
        Ok(Self { records })
    }

    /// Parse an inventory document from bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FileTransferError> {
        let text = std::str::from_utf8(bytes).map_err(|e| InventoryError::Malformed {
            message: e.to_string(),
        })?;
        Self::from_json(text)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the inventory is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl ObjectInventory for JsonInventory {
    async fn fetch_file_records(&self) -> Result<Vec<FileRecord>, FileTransferError> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_inventory_bare_array() {
        let inventory = JsonInventory::from_json(
            r#"[{"path":"a.txt","sizeBytes":1,"lastModified":"2024-01-01T00:00:00Z"},
                {"path":"b.txt","sizeBytes":2,"lastModified":"2024-01-02T00:00:00Z"}]"#,
        )
        .unwrap();

        let records = inventory.fetch_file_records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].path, "b.txt");
        assert_eq!(records[1].size_bytes, 2);
    }

    #[tokio::test]
    async fn test_json_inventory_wrapped() {
        let inventory = JsonInventory::from_slice(
            br#"{"records":[{"path":"docs/a.pdf","sizeBytes":42,"lastModified":"2024-01-15T10:30:00Z"}]}"#,
        )
        .unwrap();
        assert_eq!(inventory.len(), 1);
        assert!(!inventory.is_empty());
    }

    #[test]
    fn test_json_inventory_malformed() {
        let result = JsonInventory::from_json(r#"{"records":[{"path":"a.txt"}]}"#);
        assert!(matches!(
            result,
            Err(FileTransferError::Inventory(InventoryError::Malformed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_static_inventory() {
        let inventory = StaticInventory::default();
        assert!(inventory.fetch_file_records().await.unwrap().is_empty());
    }
}
