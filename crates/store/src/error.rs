use std::fmt;

/// Errors surfaced by the storage layer and the mapping gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The medium rejected a write for size. Retriable once space is freed.
    QuotaExceeded { key: String, size: usize },
    /// A save for this category is already in progress.
    SaveInFlight { category: String },
    /// Building the persisted payload failed.
    Serialize(String),
    /// Anything else the backend reported.
    Backend(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::QuotaExceeded { key, size } => {
                write!(f, "storage quota exceeded writing '{key}' ({size} bytes)")
            }
            StorageError::SaveInFlight { category } => {
                write!(f, "a save for category '{category}' is already in progress")
            }
            StorageError::Serialize(msg) => write!(f, "serialization failed: {msg}"),
            StorageError::Backend(msg) => write!(f, "storage backend error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}
