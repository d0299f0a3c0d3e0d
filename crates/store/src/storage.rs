//! Durable storage slot abstraction.
//!
//! The engine persists the entire partitioned cart as one serialized blob in
//! a single string-valued key of some durable key-value store. That store's
//! implementation is outside the engine; [`StorageSlot`] is the seam. The
//! slot is the unit of atomicity - there are no partial-key updates.

use std::sync::Mutex;

use crate::error::StorageError;

/// One string-valued key in a durable key-value store.
///
/// Used as `Box<dyn StorageSlot>`; implementations bind their own key name
/// (see [`StoreConfig::storage_key`](crate::config::StoreConfig)).
pub trait StorageSlot: Send + Sync {
    /// Read the slot's current value, `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn read(&self) -> Result<Option<String>, StorageError>;

    /// Atomically replace the slot's value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::QuotaExceeded`] when the backend refuses the
    /// write for capacity reasons (the adapter reacts by pruning), or
    /// [`StorageError::Backend`] for any other failure.
    fn write(&self, value: &str) -> Result<(), StorageError>;
}

/// In-memory slot for tests and ephemeral embedders.
///
/// An optional byte quota makes quota-failure paths testable.
#[derive(Debug, Default)]
pub struct MemorySlot {
    value: Mutex<Option<String>>,
    quota_bytes: Option<usize>,
}

impl MemorySlot {
    /// Create an unbounded slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot that rejects writes larger than `quota_bytes`.
    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            value: Mutex::new(None),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Create a slot pre-seeded with a value, as if a previous process had
    /// written it.
    #[must_use]
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
            quota_bytes: None,
        }
    }

    /// The slot's current contents.
    #[must_use]
    pub fn snapshot(&self) -> Option<String> {
        match self.value.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl StorageSlot for MemorySlot {
    fn read(&self) -> Result<Option<String>, StorageError> {
        Ok(self.snapshot())
    }

    fn write(&self, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes
            && value.len() > quota
        {
            return Err(StorageError::QuotaExceeded);
        }
        match self.value.lock() {
            Ok(mut guard) => *guard = Some(value.to_owned()),
            Err(poisoned) => *poisoned.into_inner() = Some(value.to_owned()),
        }
        Ok(())
    }
}
