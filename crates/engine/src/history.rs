//! Bounded undo history of full grid snapshots.

use crate::grid::SlotGrid;

/// Maximum retained snapshots. Pushing past this discards the oldest.
pub const UNDO_DEPTH: usize = 10;

/// A fully materialized grid as it was before one mutation, labelled
/// with the mutation that followed it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub label: String,
    pub grid: SlotGrid,
}

pub struct UndoStack {
    entries: Vec<Snapshot>,
    max_entries: usize,
}

impl UndoStack {
    pub fn new() -> Self {
        Self::with_depth(UNDO_DEPTH)
    }

    pub fn with_depth(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    /// Record the pre-mutation grid. Callers snapshot first, then mutate.
    pub fn snapshot(&mut self, label: impl Into<String>, grid: &SlotGrid) {
        self.entries.push(Snapshot {
            label: label.into(),
            grid: grid.clone(),
        });

        // Limit history size
        if self.entries.len() > self.max_entries {
            self.entries.remove(0);
        }
    }

    /// Pop the most recent snapshot. `None` when the stack is empty;
    /// there is no redo.
    pub fn undo(&mut self) -> Option<Snapshot> {
        self.entries.pop()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}
