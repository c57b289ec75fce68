//! Mock object inventory for testing.

use crate::error::{FileTransferError, InventoryError};
use crate::inventory::ObjectInventory;
use crate::types::FileRecord;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock inventory returning fixed records or a fixed failure.
pub struct MockInventory {
    records: Mutex<Vec<FileRecord>>,
    failure: Mutex<Option<String>>,
    call_count: AtomicUsize,
}

impl MockInventory {
    /// Create an inventory with the given records.
    pub fn new(records: Vec<FileRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            failure: Mutex::new(None),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Create an inventory whose fetches fail.
    pub fn unavailable(message: impl Into<String>) -> Self {
        let inventory = Self::new(Vec::new());
        *inventory.failure.lock() = Some(message.into());
        inventory
    }

    /// Number of fetches.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectInventory for MockInventory {
    async fn fetch_file_records(&self) -> Result<Vec<FileRecord>, FileTransferError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.lock().clone() {
            return Err(InventoryError::Unavailable { message }.into());
        }
        Ok(self.records.lock().clone())
    }
}
