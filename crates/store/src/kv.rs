use std::collections::HashMap;

use crate::error::StorageError;

// ---------------------------------------------------------------------------
// Storage contract
// ---------------------------------------------------------------------------

/// String-keyed storage the gateway writes through. A full medium must be
/// reported as `QuotaExceeded` so callers can distinguish it from plain
/// backend failures and attempt cleanup before retrying.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// HashMap-backed store. An optional byte capacity over keys plus values
/// lets tests drive the quota path deterministically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    capacity_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    pub fn with_capacity_bytes(capacity: usize) -> MemoryStore {
        MemoryStore {
            entries: HashMap::new(),
            capacity_bytes: Some(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes held, not counting the entry about to be replaced.
    fn used_bytes_excluding(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(cap) = self.capacity_bytes {
            let projected = self.used_bytes_excluding(key) + key.len() + value.len();
            if projected > cap {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    size: value.len(),
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove_round_trip() {
        let mut store = MemoryStore::new();
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.keys().unwrap(), vec!["a", "b"]);

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn removing_a_missing_key_is_a_no_op() {
        let mut store = MemoryStore::new();
        assert!(store.remove("ghost").is_ok());
    }

    #[test]
    fn capacity_rejects_oversized_writes() {
        let mut store = MemoryStore::with_capacity_bytes(10);
        store.set("k", "12345").unwrap(); // 1 + 5 = 6 bytes

        let err = store.set("x", "123456789").unwrap_err();
        match err {
            StorageError::QuotaExceeded { key, size } => {
                assert_eq!(key, "x");
                assert_eq!(size, 9);
            }
            other => panic!("expected QuotaExceeded, got {other:?}"),
        }
        // The failed write changed nothing.
        assert_eq!(store.get("x").unwrap(), None);
    }

    #[test]
    fn replacing_a_value_does_not_double_count() {
        let mut store = MemoryStore::with_capacity_bytes(10);
        store.set("k", "123456789").unwrap(); // exactly 10 bytes
        // Overwriting the same key with an equal-size value still fits.
        store.set("k", "abcdefghi").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("abcdefghi"));
    }

    #[test]
    fn freeing_space_allows_the_write() {
        let mut store = MemoryStore::with_capacity_bytes(12);
        store.set("old", "123456789").unwrap();
        assert!(store.set("new", "12345678").is_err());

        store.remove("old").unwrap();
        store.set("new", "12345678").unwrap();
        assert_eq!(store.get("new").unwrap().as_deref(), Some("12345678"));
    }
}
