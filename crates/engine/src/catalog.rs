//! Catalog: the source taxonomy and the classified destination pool.
//!
//! Both sides are immutable once loaded; a session mutates slot
//! assignments, never the catalog.

use std::collections::HashMap;

use crate::classify::classify;
use crate::error::EngineError;
use crate::model::{DestinationRecord, MasterCategory, SourceRow};

/// A run of consecutive rows sharing one group heading.
#[derive(Debug, Clone)]
pub struct RowGroup<'a> {
    pub heading: &'a str,
    pub rows: &'a [SourceRow],
}

#[derive(Debug, Default)]
pub struct Catalog {
    rows: HashMap<MasterCategory, Vec<SourceRow>>,
    records: HashMap<MasterCategory, Vec<DestinationRecord>>,
    // record id -> (category, index into that category's pool)
    record_index: HashMap<String, (MasterCategory, usize)>,
}

impl Catalog {
    pub fn new() -> Catalog {
        Catalog::default()
    }

    /// Register taxonomy rows for a category, keeping their order.
    /// Row ids must be unique within the category.
    pub fn add_rows(
        &mut self,
        category: MasterCategory,
        rows: Vec<SourceRow>,
    ) -> Result<(), EngineError> {
        let existing = self.rows.entry(category).or_default();
        for row in rows {
            if existing.iter().any(|r| r.id == row.id) {
                return Err(EngineError::DuplicateRowId {
                    category: category.slug().to_string(),
                    row_id: row.id,
                });
            }
            existing.push(row);
        }
        Ok(())
    }

    /// Ingest destination records, classifying each into its category
    /// pool. Record ids are globally unique. The classifier verdict is
    /// recomputed here so a hand-built record cannot smuggle in a stale
    /// category.
    pub fn add_records(&mut self, records: Vec<DestinationRecord>) -> Result<(), EngineError> {
        for mut record in records {
            if self.record_index.contains_key(&record.id) {
                return Err(EngineError::DuplicateRecordId { record_id: record.id });
            }
            record.category = classify(&record.raw_type, &record.raw_group);
            let pool = self.records.entry(record.category).or_default();
            self.record_index
                .insert(record.id.clone(), (record.category, pool.len()));
            pool.push(record);
        }
        Ok(())
    }

    /// Taxonomy rows for a category, load order.
    pub fn rows(&self, category: MasterCategory) -> &[SourceRow] {
        self.rows.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rows bucketed into consecutive group-heading runs.
    pub fn groups(&self, category: MasterCategory) -> Vec<RowGroup<'_>> {
        let rows = self.rows(category);
        let mut groups: Vec<RowGroup<'_>> = Vec::new();
        let mut start = 0;
        for (i, row) in rows.iter().enumerate() {
            if row.group_heading != rows[start].group_heading {
                groups.push(RowGroup {
                    heading: &rows[start].group_heading,
                    rows: &rows[start..i],
                });
                start = i;
            }
        }
        if start < rows.len() {
            groups.push(RowGroup {
                heading: &rows[start].group_heading,
                rows: &rows[start..],
            });
        }
        groups
    }

    /// Destination pool for a category, load order.
    pub fn records(&self, category: MasterCategory) -> &[DestinationRecord] {
        self.records.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up a record by id within one category's pool.
    pub fn record(&self, category: MasterCategory, record_id: &str) -> Option<&DestinationRecord> {
        let (cat, idx) = self.record_index.get(record_id)?;
        if *cat != category {
            return None;
        }
        self.records.get(cat).and_then(|pool| pool.get(*idx))
    }

    /// Look up a record anywhere, with its classified category.
    pub fn record_anywhere(&self, record_id: &str) -> Option<&DestinationRecord> {
        let (cat, idx) = self.record_index.get(record_id)?;
        self.records.get(cat).and_then(|pool| pool.get(*idx))
    }

    /// Pool sizes per category, in taxonomy order.
    pub fn category_counts(&self) -> Vec<(MasterCategory, usize)> {
        MasterCategory::ALL
            .into_iter()
            .map(|cat| (cat, self.records(cat).len()))
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.record_index.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }
}
