//! Save/load gateway: one master category's slot grid per storage key.
//!
//! The persisted value is a JSON document keyed `mapping.<slug>`:
//!
//! ```json
//! {
//!   "type": "Assets",
//!   "updatedAt": "2026-08-22T12:00:00Z",
//!   "rows": {
//!     "row-17": {
//!       "most":   { "id": "acct-9", "number": "1010", "name": "Petty Cash" },
//!       "likely": { "id": "acct-4", "number": "1020", "name": "Checking" }
//!     }
//!   }
//! }
//! ```
//!
//! Empty rows and empty slots are omitted. On load, blobs that fail to
//! parse (or whose `type` contradicts the key) are removed and reported
//! as absent; a corrupt save never blocks startup.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use ledgermap_engine::catalog::Catalog;
use ledgermap_engine::grid::SlotGrid;
use ledgermap_engine::model::{DestinationRecord, MasterCategory, SlotLevel};

use crate::error::StorageError;
use crate::kv::KeyValueStore;

/// Storage key prefix; one entry per master category.
pub const KEY_PREFIX: &str = "mapping.";

/// Saved mappings older than this are purged when the medium is full.
pub const RETENTION_DAYS: i64 = 30;

/// Write attempts per save: the first try plus retries after cleanup.
pub const SAVE_ATTEMPTS: u32 = 3;

pub fn storage_key(category: MasterCategory) -> String {
    format!("{KEY_PREFIX}{}", category.slug())
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedMapping {
    /// Display name of the category, e.g. "Cost of Goods Sold".
    #[serde(rename = "type")]
    pub category: String,
    /// RFC 3339 timestamp of the last save.
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
    pub rows: BTreeMap<String, PersistedRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most: Option<PersistedSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likely: Option<PersistedSlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub possible: Option<PersistedSlot>,
}

/// Enough of a record to re-link on load, and to still render it if the
/// record has since left the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSlot {
    pub id: String,
    pub number: String,
    pub name: String,
}

impl PersistedMapping {
    pub fn from_grid(category: MasterCategory, grid: &SlotGrid) -> PersistedMapping {
        let mut rows = BTreeMap::new();
        for (row_id, slots) in grid.iter_rows() {
            if slots.is_empty() {
                continue;
            }
            let mut row = PersistedRow::default();
            for (level, rec) in slots.occupied() {
                let slot = PersistedSlot {
                    id: rec.id.clone(),
                    number: rec.number.clone(),
                    name: rec.name.clone(),
                };
                match level {
                    SlotLevel::Most => row.most = Some(slot),
                    SlotLevel::Likely => row.likely = Some(slot),
                    SlotLevel::Possible => row.possible = Some(slot),
                }
            }
            rows.insert(row_id.to_string(), row);
        }
        PersistedMapping {
            category: category.name().to_string(),
            updated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            rows,
        }
    }

    /// Rebuild a grid over the catalog's current rows. Persisted rows the
    /// catalog no longer has are dropped. Records are re-linked by id;
    /// ids no longer in the category's pool fall back to the persisted
    /// number and name. A record id persisted twice keeps its first
    /// occurrence in row order.
    pub fn to_grid(&self, category: MasterCategory, catalog: &Catalog) -> SlotGrid {
        let mut grid = SlotGrid::new(catalog.rows(category).iter().map(|r| r.id.clone()));
        for (row_id, row) in &self.rows {
            if !grid.contains_row(row_id) {
                continue;
            }
            let slots = [
                (SlotLevel::Most, &row.most),
                (SlotLevel::Likely, &row.likely),
                (SlotLevel::Possible, &row.possible),
            ];
            for (level, slot) in slots {
                let Some(slot) = slot else { continue };
                let record = match catalog.record(category, &slot.id) {
                    Some(rec) => rec.clone(),
                    None => DestinationRecord::new(
                        slot.id.clone(),
                        slot.number.clone(),
                        slot.name.clone(),
                        "",
                        "",
                    ),
                };
                // Second occurrence of an id is rejected by the grid.
                let _ = grid.place(row_id, level, record);
            }
        }
        grid
    }
}

// ---------------------------------------------------------------------------
// Gateway
// ---------------------------------------------------------------------------

pub struct MappingGateway<S: KeyValueStore> {
    store: S,
    // At most one save per category may be in progress; cleared on every
    // exit path of `save`.
    in_flight: HashSet<MasterCategory>,
}

impl<S: KeyValueStore> MappingGateway<S> {
    pub fn new(store: S) -> MappingGateway<S> {
        MappingGateway {
            store,
            in_flight: HashSet::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Persist one category's grid. On a full medium, entries older than
    /// the retention window are purged and the write retried, up to
    /// `SAVE_ATTEMPTS` tries in total.
    pub fn save(&mut self, category: MasterCategory, grid: &SlotGrid) -> Result<(), StorageError> {
        if !self.in_flight.insert(category) {
            return Err(StorageError::SaveInFlight {
                category: category.slug().to_string(),
            });
        }
        let result = self.save_inner(category, grid);
        self.in_flight.remove(&category);
        result
    }

    fn save_inner(&mut self, category: MasterCategory, grid: &SlotGrid) -> Result<(), StorageError> {
        let payload = PersistedMapping::from_grid(category, grid);
        let json =
            serde_json::to_string(&payload).map_err(|e| StorageError::Serialize(e.to_string()))?;
        let key = storage_key(category);

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.set(&key, &json) {
                Ok(()) => return Ok(()),
                Err(StorageError::QuotaExceeded { .. }) if attempt < SAVE_ATTEMPTS => {
                    self.purge_stale(Utc::now())?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Load one category's saved mapping. Absent keys are `None`. A blob
    /// that does not parse, or whose `type` names a different category
    /// than its key, is removed and reported as `None`.
    pub fn load(&mut self, category: MasterCategory) -> Result<Option<PersistedMapping>, StorageError> {
        let key = storage_key(category);
        let Some(raw) = self.store.get(&key)? else {
            return Ok(None);
        };
        match serde_json::from_str::<PersistedMapping>(&raw) {
            Ok(mapping) if MasterCategory::parse(&mapping.category) == Some(category) => {
                Ok(Some(mapping))
            }
            Ok(mapping) => {
                eprintln!(
                    "Discarding saved mapping '{key}': type '{}' does not match its key",
                    mapping.category
                );
                self.store.remove(&key)?;
                Ok(None)
            }
            Err(e) => {
                eprintln!("Discarding unreadable saved mapping '{key}': {e}");
                self.store.remove(&key)?;
                Ok(None)
            }
        }
    }

    /// Load straight into a grid over the catalog's current rows.
    pub fn load_grid(
        &mut self,
        category: MasterCategory,
        catalog: &Catalog,
    ) -> Result<Option<SlotGrid>, StorageError> {
        Ok(self
            .load(category)?
            .map(|mapping| mapping.to_grid(category, catalog)))
    }

    pub fn delete(&mut self, category: MasterCategory) -> Result<(), StorageError> {
        self.store.remove(&storage_key(category))
    }

    /// Categories with a saved entry, in taxonomy order.
    pub fn saved_categories(&self) -> Result<Vec<MasterCategory>, StorageError> {
        let keys: HashSet<String> = self.store.keys()?.into_iter().collect();
        Ok(MasterCategory::ALL
            .into_iter()
            .filter(|cat| keys.contains(&storage_key(*cat)))
            .collect())
    }

    /// Remove saved mappings older than the retention window. Blobs that
    /// cannot be parsed, or carry no readable timestamp, count as stale.
    /// Returns the number removed.
    pub fn purge_stale(&mut self, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let cutoff = now - Duration::days(RETENTION_DAYS);
        let mut purged = 0;
        for key in self.store.keys()? {
            if !key.starts_with(KEY_PREFIX) {
                continue;
            }
            let Some(raw) = self.store.get(&key)? else {
                continue;
            };
            let stale = match serde_json::from_str::<PersistedMapping>(&raw) {
                Ok(mapping) => match DateTime::parse_from_rfc3339(&mapping.updated_at) {
                    Ok(ts) => ts.with_timezone(&Utc) < cutoff,
                    Err(_) => true,
                },
                Err(_) => true,
            };
            if stale {
                self.store.remove(&key)?;
                purged += 1;
            }
        }
        Ok(purged)
    }
}
