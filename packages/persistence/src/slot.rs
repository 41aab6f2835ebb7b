//! Key-value slot storage backends.
//!
//! The entire reference collection is serialized into one named slot;
//! there is no per-feature addressing and no schema versioning. The trait
//! mirrors the three operations the service needs: read, overwrite,
//! remove.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

/// Errors from a slot storage backend.
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    /// Underlying I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend rejected the write for lack of space.
    #[error("storage quota exceeded: {attempted} bytes over a {capacity} byte limit")]
    QuotaExceeded {
        /// Size of the rejected payload.
        attempted: usize,
        /// Backend capacity.
        capacity: usize,
    },
}

/// A single named storage slot holding one serialized document.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Reads the slot contents, `None` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError`] if the backend cannot be read.
    async fn read(&self) -> Result<Option<String>, SlotError>;

    /// Overwrites the slot contents.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError`] if the backend rejects the write (e.g. quota
    /// exceeded).
    async fn write(&self, contents: &str) -> Result<(), SlotError>;

    /// Deletes the slot. Removing an absent slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError`] if the backend cannot delete the slot.
    async fn remove(&self) -> Result<(), SlotError>;
}

/// Slot store backed by a single file on disk.
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    path: PathBuf,
}

impl FileSlotStore {
    /// Creates a store over the given file path. The file is created on
    /// first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl SlotStore for FileSlotStore {
    async fn read(&self) -> Result<Option<String>, SlotError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    async fn write(&self, contents: &str) -> Result<(), SlotError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, contents).await?;
        Ok(())
    }

    async fn remove(&self) -> Result<(), SlotError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

/// In-memory slot store for tests and isolated sessions.
///
/// An optional byte capacity simulates a quota-limited backend.
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slot: Mutex<Option<String>>,
    capacity: Option<usize>,
}

impl MemorySlotStore {
    /// Creates an empty, unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes larger than `capacity` bytes.
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            slot: Mutex::new(None),
            capacity: Some(capacity),
        }
    }
}

#[async_trait]
impl SlotStore for MemorySlotStore {
    async fn read(&self) -> Result<Option<String>, SlotError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    async fn write(&self, contents: &str) -> Result<(), SlotError> {
        if let Some(capacity) = self.capacity {
            if contents.len() > capacity {
                return Err(SlotError::QuotaExceeded {
                    attempted: contents.len(),
                    capacity,
                });
            }
        }
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(contents.to_string());
        Ok(())
    }

    async fn remove(&self) -> Result<(), SlotError> {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mangrove-map-{}-{name}.json", std::process::id()))
    }

    #[tokio::test]
    async fn file_store_roundtrip_and_remove() {
        let store = FileSlotStore::new(scratch_path("roundtrip"));

        assert_eq!(store.read().await.unwrap(), None);
        store.write("{\"features\":[]}").await.unwrap();
        assert_eq!(
            store.read().await.unwrap().as_deref(),
            Some("{\"features\":[]}")
        );

        store.remove().await.unwrap();
        assert_eq!(store.read().await.unwrap(), None);
        // Removing again is still fine.
        store.remove().await.unwrap();
    }

    #[tokio::test]
    async fn memory_store_enforces_capacity() {
        let store = MemorySlotStore::with_capacity(8);
        store.write("tiny").await.unwrap();

        let error = store.write("way past the quota").await.unwrap_err();
        assert!(matches!(error, SlotError::QuotaExceeded { .. }));
        // The previous contents survive a rejected write.
        assert_eq!(store.read().await.unwrap().as_deref(), Some("tiny"));
    }
}
