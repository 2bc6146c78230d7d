//! Visible-pool derivation: which unplaced records the pool shows.
//!
//! Pure and synchronous; recomputed from current state on demand, never
//! incrementally maintained. Debouncing of search input is the caller's
//! concern.

use crate::grid::SlotGrid;
use crate::model::{DestinationRecord, MasterCategory};

/// Pool view knobs. `category` narrows to one master category (`None` =
/// unfiltered); `search` is a case-insensitive substring over the
/// record's "number name" text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolFilter {
    pub category: Option<MasterCategory>,
    pub search: String,
}

impl PoolFilter {
    fn matches(&self, record: &DestinationRecord, needle: &str) -> bool {
        if let Some(category) = self.category {
            if record.category != category {
                return false;
            }
        }
        if needle.is_empty() {
            return true;
        }
        let haystack = format!("{} {}", record.number, record.name).to_lowercase();
        haystack.contains(needle)
    }
}

/// Records visible in the pool: unplaced, and matching the filter knobs.
/// Input order is preserved.
pub fn visible_records<'a>(
    records: &'a [DestinationRecord],
    grid: &SlotGrid,
    filter: &PoolFilter,
) -> Vec<&'a DestinationRecord> {
    let needle = filter.search.trim().to_lowercase();
    records
        .iter()
        .filter(|rec| !grid.is_placed(&rec.id) && filter.matches(rec, &needle))
        .collect()
}
