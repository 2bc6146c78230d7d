//! MappingEngine: session facade over the catalog, slot grid, undo
//! history and pool filter.
//!
//! One category is active at a time. Commands mutate and report;
//! queries derive and never mutate. Everything is synchronous: each
//! operation runs to completion before the next starts, so a cascade is
//! never observed half-applied.

use crate::catalog::Catalog;
use crate::error::EngineError;
use crate::filter::{visible_records, PoolFilter};
use crate::grid::{Placement, SlotGrid};
use crate::history::UndoStack;
use crate::model::{DestinationRecord, MasterCategory, SlotLevel, SourceRow};

struct Session {
    category: MasterCategory,
    grid: SlotGrid,
    undo: UndoStack,
    filter: PoolFilter,
}

pub struct MappingEngine {
    catalog: Catalog,
    session: Option<Session>,
}

impl MappingEngine {
    pub fn new(catalog: Catalog) -> MappingEngine {
        MappingEngine {
            catalog,
            session: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // -- lifecycle ----------------------------------------------------------

    /// Start a session on a category: empty grid over its rows, empty
    /// undo history, cleared filter. Any previous session is discarded;
    /// persisted state is the caller's concern.
    pub fn activate(&mut self, category: MasterCategory) {
        let row_ids = self
            .catalog
            .rows(category)
            .iter()
            .map(|row| row.id.clone())
            .collect::<Vec<_>>();
        self.session = Some(Session {
            category,
            grid: SlotGrid::new(row_ids),
            undo: UndoStack::new(),
            filter: PoolFilter::default(),
        });
    }

    pub fn deactivate(&mut self) {
        self.session = None;
    }

    pub fn category(&self) -> Option<MasterCategory> {
        self.session.as_ref().map(|s| s.category)
    }

    /// Replace the active grid wholesale (load-from-persistence). The
    /// undo history is cleared: the restored grid is a fresh baseline.
    pub fn restore_grid(&mut self, grid: SlotGrid) -> Result<(), EngineError> {
        let session = self.session_mut()?;
        session.grid = grid;
        session.undo.clear();
        Ok(())
    }

    /// Owned copy of the active grid, for the persistence gateway.
    pub fn export_grid(&self) -> Result<SlotGrid, EngineError> {
        Ok(self.session_ref()?.grid.clone())
    }

    // -- commands -----------------------------------------------------------

    /// Place a pool record into a slot, cascading per the grid rules.
    /// Snapshots the grid before mutating; rejected placements leave
    /// both grid and history untouched.
    pub fn place(
        &mut self,
        row_id: &str,
        slot: SlotLevel,
        record_id: &str,
    ) -> Result<Placement, EngineError> {
        let session = self
            .session
            .as_mut()
            .ok_or(EngineError::NoActiveCategory)?;
        let record = self
            .catalog
            .record(session.category, record_id)
            .cloned()
            .ok_or_else(|| EngineError::RecordNotFound { record_id: record_id.to_string() })?;

        if !session.grid.contains_row(row_id) {
            return Err(EngineError::RowNotFound { row_id: row_id.to_string() });
        }
        if let Some(existing) = session.grid.location(record_id) {
            return Err(EngineError::DuplicateRecord {
                record_id: record_id.to_string(),
                row_id: existing.row_id.clone(),
                slot: existing.slot,
            });
        }

        session
            .undo
            .snapshot(format!("place {record_id} at {row_id}/{slot}"), &session.grid);
        session.grid.place(row_id, slot, record)
    }

    /// Clear one slot. Removing from an empty slot is a no-op and takes
    /// no snapshot.
    pub fn remove(
        &mut self,
        row_id: &str,
        slot: SlotLevel,
    ) -> Result<Option<DestinationRecord>, EngineError> {
        let session = self
            .session
            .as_mut()
            .ok_or(EngineError::NoActiveCategory)?;
        if !session.grid.contains_row(row_id) {
            return Err(EngineError::RowNotFound { row_id: row_id.to_string() });
        }
        let occupant = match session.grid.slot(row_id, slot) {
            Some(rec) => rec.id.clone(),
            None => return Ok(None),
        };

        session
            .undo
            .snapshot(format!("remove {occupant} from {row_id}/{slot}"), &session.grid);
        session.grid.remove(row_id, slot)
    }

    /// Restore the most recent snapshot, returning its label. `Ok(None)`
    /// reports an empty history; nothing changes.
    pub fn undo(&mut self) -> Result<Option<String>, EngineError> {
        let session = self.session_mut()?;
        match session.undo.undo() {
            Some(snapshot) => {
                session.grid = snapshot.grid;
                Ok(Some(snapshot.label))
            }
            None => Ok(None),
        }
    }

    // -- pool filter --------------------------------------------------------

    pub fn set_category_filter(
        &mut self,
        category: Option<MasterCategory>,
    ) -> Result<(), EngineError> {
        self.session_mut()?.filter.category = category;
        Ok(())
    }

    pub fn set_search(&mut self, term: impl Into<String>) -> Result<(), EngineError> {
        self.session_mut()?.filter.search = term.into();
        Ok(())
    }

    // -- queries ------------------------------------------------------------

    /// The unplaced pool, narrowed by the session filter knobs.
    pub fn visible_pool(&self) -> Result<Vec<&DestinationRecord>, EngineError> {
        let session = self.session_ref()?;
        Ok(visible_records(
            self.catalog.records(session.category),
            &session.grid,
            &session.filter,
        ))
    }

    pub fn rows(&self) -> Result<&[SourceRow], EngineError> {
        let session = self.session_ref()?;
        Ok(self.catalog.rows(session.category))
    }

    pub fn slot(&self, row_id: &str, level: SlotLevel) -> Option<&DestinationRecord> {
        self.session.as_ref()?.grid.slot(row_id, level)
    }

    /// Row indicator: any tier occupied. False without a session or for
    /// unknown rows.
    pub fn has_any_mapping(&self, row_id: &str) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.grid.has_any_mapping(row_id))
    }

    pub fn grid(&self) -> Result<&SlotGrid, EngineError> {
        Ok(&self.session_ref()?.grid)
    }

    pub fn undo_depth(&self) -> usize {
        self.session.as_ref().map(|s| s.undo.len()).unwrap_or(0)
    }

    fn session_ref(&self) -> Result<&Session, EngineError> {
        self.session.as_ref().ok_or(EngineError::NoActiveCategory)
    }

    fn session_mut(&mut self) -> Result<&mut Session, EngineError> {
        self.session.as_mut().ok_or(EngineError::NoActiveCategory)
    }
}
