//! Ranked-slot grid: per-row Most/Likely/Possible assignments with a
//! global reverse index for O(1) duplicate and location checks.

use std::collections::HashMap;

use crate::error::EngineError;
use crate::model::{DestinationRecord, SlotLevel};

// ---------------------------------------------------------------------------
// Row state
// ---------------------------------------------------------------------------

/// The three ranked slots of one source row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSlots {
    slots: [Option<DestinationRecord>; 3],
}

impl RowSlots {
    pub fn get(&self, level: SlotLevel) -> Option<&DestinationRecord> {
        self.slots[level.index()].as_ref()
    }

    fn take(&mut self, level: SlotLevel) -> Option<DestinationRecord> {
        self.slots[level.index()].take()
    }

    fn replace(&mut self, level: SlotLevel, record: DestinationRecord) -> Option<DestinationRecord> {
        self.slots[level.index()].replace(record)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Occupied slots in tier order, highest first.
    pub fn occupied(&self) -> impl Iterator<Item = (SlotLevel, &DestinationRecord)> {
        SlotLevel::ALL
            .into_iter()
            .filter_map(move |level| self.get(level).map(|rec| (level, rec)))
    }
}

/// Where a record currently sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRef {
    pub row_id: String,
    pub slot: SlotLevel,
}

/// Outcome of a successful placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Occupant displaced past the bottom tier, now back in the pool.
    pub evicted: Option<DestinationRecord>,
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Slot assignments for one category's row set.
///
/// Invariants: a record id appears in at most one slot grid-wide, and the
/// reverse index always mirrors the slot contents exactly. Both hold
/// across every `place`/`remove`, including mid-cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotGrid {
    rows: HashMap<String, RowSlots>,
    row_order: Vec<String>,
    index: HashMap<String, SlotRef>,
}

impl SlotGrid {
    /// Empty grid over the given row ids; iteration keeps their order.
    pub fn new<I>(row_ids: I) -> SlotGrid
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut rows = HashMap::new();
        let mut row_order = Vec::new();
        for id in row_ids {
            let id = id.into();
            if rows.insert(id.clone(), RowSlots::default()).is_none() {
                row_order.push(id);
            }
        }
        SlotGrid {
            rows,
            row_order,
            index: HashMap::new(),
        }
    }

    pub fn contains_row(&self, row_id: &str) -> bool {
        self.rows.contains_key(row_id)
    }

    pub fn row_ids(&self) -> &[String] {
        &self.row_order
    }

    /// Place a record into a slot, cascading the displaced occupant down
    /// one tier at a time until an empty tier absorbs it. The occupant
    /// pushed past the bottom tier is evicted back to the pool.
    ///
    /// Rejected with `DuplicateRecord` (state untouched) when the record
    /// already occupies any slot, and `RowNotFound` for unknown rows.
    pub fn place(
        &mut self,
        row_id: &str,
        slot: SlotLevel,
        record: DestinationRecord,
    ) -> Result<Placement, EngineError> {
        if let Some(existing) = self.index.get(&record.id) {
            return Err(EngineError::DuplicateRecord {
                record_id: record.id.clone(),
                row_id: existing.row_id.clone(),
                slot: existing.slot,
            });
        }
        let row = self
            .rows
            .get_mut(row_id)
            .ok_or_else(|| EngineError::RowNotFound { row_id: row_id.to_string() })?;

        self.index.insert(
            record.id.clone(),
            SlotRef { row_id: row_id.to_string(), slot },
        );
        let mut displaced = row.replace(slot, record);
        let mut level = slot;
        let mut evicted = None;

        while let Some(rec) = displaced {
            match level.below() {
                Some(next) => {
                    self.index.insert(
                        rec.id.clone(),
                        SlotRef { row_id: row_id.to_string(), slot: next },
                    );
                    displaced = row.replace(next, rec);
                    level = next;
                }
                None => {
                    self.index.remove(&rec.id);
                    evicted = Some(rec);
                    displaced = None;
                }
            }
        }

        Ok(Placement { evicted })
    }

    /// Clear one slot. No cascade: the tiers below stay where they are.
    /// `Ok(None)` when the slot was already empty.
    pub fn remove(
        &mut self,
        row_id: &str,
        slot: SlotLevel,
    ) -> Result<Option<DestinationRecord>, EngineError> {
        let row = self
            .rows
            .get_mut(row_id)
            .ok_or_else(|| EngineError::RowNotFound { row_id: row_id.to_string() })?;
        let taken = row.take(slot);
        if let Some(rec) = &taken {
            self.index.remove(&rec.id);
        }
        Ok(taken)
    }

    pub fn slot(&self, row_id: &str, level: SlotLevel) -> Option<&DestinationRecord> {
        self.rows.get(row_id)?.get(level)
    }

    pub fn row(&self, row_id: &str) -> Option<&RowSlots> {
        self.rows.get(row_id)
    }

    /// True when any tier of the row is occupied. Unknown rows read as
    /// unmapped.
    pub fn has_any_mapping(&self, row_id: &str) -> bool {
        self.rows.get(row_id).is_some_and(|row| !row.is_empty())
    }

    pub fn location(&self, record_id: &str) -> Option<&SlotRef> {
        self.index.get(record_id)
    }

    pub fn is_placed(&self, record_id: &str) -> bool {
        self.index.contains_key(record_id)
    }

    /// Total occupied slots grid-wide.
    pub fn placed_count(&self) -> usize {
        self.index.len()
    }

    /// Rows with at least one occupied tier.
    pub fn mapped_row_count(&self) -> usize {
        self.row_order
            .iter()
            .filter(|id| self.has_any_mapping(id))
            .count()
    }

    /// Rows in load order.
    pub fn iter_rows(&self) -> impl Iterator<Item = (&str, &RowSlots)> {
        self.row_order
            .iter()
            .filter_map(move |id| self.rows.get(id).map(|row| (id.as_str(), row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SlotLevel::{Likely, Most, Possible};

    fn rec(id: &str) -> DestinationRecord {
        DestinationRecord::new(id, format!("#{id}"), format!("Account {id}"), "Expense", "")
    }

    fn grid() -> SlotGrid {
        SlotGrid::new(["r1", "r2", "r3"])
    }

    fn ids(g: &SlotGrid, row: &str) -> [Option<String>; 3] {
        [Most, Likely, Possible].map(|level| g.slot(row, level).map(|r| r.id.clone()))
    }

    #[test]
    fn place_into_empty_slot() {
        let mut g = grid();
        let out = g.place("r1", Most, rec("a")).unwrap();
        assert!(out.evicted.is_none());
        assert_eq!(ids(&g, "r1"), [Some("a".into()), None, None]);
        assert_eq!(g.location("a").unwrap().slot, Most);
    }

    #[test]
    fn cascade_full_row_evicts_bottom() {
        let mut g = grid();
        g.place("r1", Most, rec("a")).unwrap();
        g.place("r1", Likely, rec("b")).unwrap();
        g.place("r1", Possible, rec("c")).unwrap();

        let out = g.place("r1", Most, rec("d")).unwrap();
        assert_eq!(out.evicted.unwrap().id, "c");
        assert_eq!(
            ids(&g, "r1"),
            [Some("d".into()), Some("a".into()), Some("b".into())]
        );
        assert!(!g.is_placed("c"));
    }

    #[test]
    fn cascade_stops_at_first_empty_tier() {
        let mut g = grid();
        g.place("r1", Most, rec("a")).unwrap();
        g.place("r1", Possible, rec("c")).unwrap();

        // Likely is free: "a" drops into it and "c" stays put.
        let out = g.place("r1", Most, rec("d")).unwrap();
        assert!(out.evicted.is_none());
        assert_eq!(
            ids(&g, "r1"),
            [Some("d".into()), Some("a".into()), Some("c".into())]
        );
    }

    #[test]
    fn cascade_from_middle_tier() {
        let mut g = grid();
        g.place("r1", Likely, rec("b")).unwrap();
        g.place("r1", Possible, rec("c")).unwrap();

        let out = g.place("r1", Likely, rec("d")).unwrap();
        assert_eq!(out.evicted.unwrap().id, "c");
        assert_eq!(ids(&g, "r1"), [None, Some("d".into()), Some("b".into())]);
    }

    #[test]
    fn place_into_bottom_tier_evicts_directly() {
        let mut g = grid();
        g.place("r1", Possible, rec("c")).unwrap();
        let out = g.place("r1", Possible, rec("d")).unwrap();
        assert_eq!(out.evicted.unwrap().id, "c");
        assert_eq!(ids(&g, "r1"), [None, None, Some("d".into())]);
    }

    #[test]
    fn duplicate_rejected_same_row() {
        let mut g = grid();
        g.place("r1", Most, rec("a")).unwrap();
        let err = g.place("r1", Likely, rec("a")).unwrap_err();
        match err {
            EngineError::DuplicateRecord { record_id, row_id, slot } => {
                assert_eq!(record_id, "a");
                assert_eq!(row_id, "r1");
                assert_eq!(slot, Most);
            }
            other => panic!("unexpected error: {other}"),
        }
        // State untouched.
        assert_eq!(ids(&g, "r1"), [Some("a".into()), None, None]);
    }

    #[test]
    fn duplicate_rejected_across_rows() {
        let mut g = grid();
        g.place("r1", Most, rec("a")).unwrap();
        g.place("r2", Likely, rec("b")).unwrap();
        let err = g.place("r2", Most, rec("a")).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateRecord { .. }));
        assert_eq!(ids(&g, "r2"), [None, Some("b".into()), None]);
    }

    #[test]
    fn unknown_row_is_an_error() {
        let mut g = grid();
        let err = g.place("nope", Most, rec("a")).unwrap_err();
        assert!(matches!(err, EngineError::RowNotFound { .. }));
        assert!(matches!(
            g.remove("nope", Most).unwrap_err(),
            EngineError::RowNotFound { .. }
        ));
    }

    #[test]
    fn remove_clears_slot_without_cascade() {
        let mut g = grid();
        g.place("r1", Most, rec("a")).unwrap();
        g.place("r1", Likely, rec("b")).unwrap();

        let taken = g.remove("r1", Most).unwrap().unwrap();
        assert_eq!(taken.id, "a");
        // "b" does not move up.
        assert_eq!(ids(&g, "r1"), [None, Some("b".into()), None]);
        assert!(!g.is_placed("a"));
    }

    #[test]
    fn remove_empty_slot_is_noop() {
        let mut g = grid();
        assert!(g.remove("r1", Likely).unwrap().is_none());
    }

    #[test]
    fn mapped_counts_and_indicator() {
        let mut g = grid();
        assert!(!g.has_any_mapping("r1"));
        assert!(!g.has_any_mapping("missing"));

        g.place("r1", Possible, rec("a")).unwrap();
        g.place("r2", Most, rec("b")).unwrap();
        g.place("r2", Likely, rec("c")).unwrap();

        assert!(g.has_any_mapping("r1"));
        assert_eq!(g.mapped_row_count(), 2);
        assert_eq!(g.placed_count(), 3);
    }

    #[test]
    fn clone_is_a_deep_snapshot() {
        let mut g = grid();
        g.place("r1", Most, rec("a")).unwrap();
        let snap = g.clone();

        g.place("r1", Most, rec("b")).unwrap();
        g.remove("r2", Most).unwrap();

        assert_eq!(ids(&snap, "r1"), [Some("a".into()), None, None]);
        assert_eq!(snap.location("a").unwrap().slot, Most);
        assert!(!snap.is_placed("b"));
    }
}
