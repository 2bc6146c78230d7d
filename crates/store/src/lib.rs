//! Mapping persistence for `ledgermap`.
//!
//! A small key-value contract with in-memory and SQLite backends, and a
//! gateway that serializes one master category's slot grid per storage
//! key. The gateway owns the retry-after-cleanup policy for full media
//! and discards unreadable blobs on load rather than failing startup.

pub mod error;
pub mod gateway;
pub mod kv;
pub mod sqlite;

pub use error::StorageError;
pub use gateway::{MappingGateway, PersistedMapping, PersistedRow, PersistedSlot};
pub use kv::{KeyValueStore, MemoryStore};
pub use sqlite::SqliteStore;
