// Property-based tests for the slot grid and engine session.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::HashSet;

use proptest::prelude::*;

use ledgermap_engine::catalog::Catalog;
use ledgermap_engine::error::EngineError;
use ledgermap_engine::grid::SlotGrid;
use ledgermap_engine::history::UNDO_DEPTH;
use ledgermap_engine::model::{DestinationRecord, MasterCategory, SlotLevel, SourceRow};
use ledgermap_engine::MappingEngine;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

const ROWS: usize = 5;
const RECORDS: usize = 8;

fn engine() -> MappingEngine {
    let mut catalog = Catalog::new();
    let rows = (0..ROWS)
        .map(|i| SourceRow {
            id: format!("r{i}"),
            number: format!("{}", 100 + i * 10),
            name: format!("Row {i}"),
            group_heading: "Current Assets".into(),
        })
        .collect();
    catalog.add_rows(MasterCategory::Assets, rows).unwrap();
    catalog
        .add_records(
            (0..RECORDS)
                .map(|i| {
                    DestinationRecord::new(
                        format!("a{i}"),
                        format!("{}", 1000 + i),
                        format!("Account {i}"),
                        "Bank",
                        "",
                    )
                })
                .collect(),
        )
        .unwrap();
    let mut engine = MappingEngine::new(catalog);
    engine.activate(MasterCategory::Assets);
    engine
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Op {
    Place { row: usize, slot: usize, rec: usize },
    Remove { row: usize, slot: usize },
    Undo,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..ROWS, 0..3usize, 0..RECORDS)
            .prop_map(|(row, slot, rec)| Op::Place { row, slot, rec }),
        2 => (0..ROWS, 0..3usize).prop_map(|(row, slot)| Op::Remove { row, slot }),
        1 => Just(Op::Undo),
    ]
}

fn slot_level(index: usize) -> SlotLevel {
    SlotLevel::ALL[index]
}

// ---------------------------------------------------------------------------
// Invariant checks
// ---------------------------------------------------------------------------

/// Occupied slots as (row, slot, record id), grid iteration order.
fn occupied(grid: &SlotGrid) -> Vec<(String, SlotLevel, String)> {
    grid.iter_rows()
        .flat_map(|(row_id, slots)| {
            slots
                .occupied()
                .map(move |(level, rec)| (row_id.to_string(), level, rec.id.clone()))
        })
        .collect()
}

fn assert_invariants(engine: &MappingEngine) {
    let grid = engine.grid().unwrap();
    let placed = occupied(grid);

    // A record id appears in at most one slot grid-wide.
    let unique: HashSet<&String> = placed.iter().map(|(_, _, id)| id).collect();
    assert_eq!(unique.len(), placed.len(), "record occupies two slots");

    // The reverse index mirrors the slot contents exactly.
    assert_eq!(grid.placed_count(), placed.len());
    for (row_id, level, rec_id) in &placed {
        let loc = grid.location(rec_id).expect("placed record missing from index");
        assert_eq!(&loc.row_id, row_id);
        assert_eq!(loc.slot, *level);
    }

    // Pool and placed set partition the catalog pool.
    let pool: HashSet<String> = engine
        .visible_pool()
        .unwrap()
        .iter()
        .map(|rec| rec.id.clone())
        .collect();
    assert_eq!(pool.len() + placed.len(), RECORDS);
    for (_, _, rec_id) in &placed {
        assert!(!pool.contains(rec_id), "placed record visible in pool");
    }

    // History never exceeds its bound.
    assert!(engine.undo_depth() <= UNDO_DEPTH);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    /// Any op sequence keeps uniqueness, index consistency and the
    /// pool partition intact; rejected ops change nothing.
    #[test]
    fn op_sequences_maintain_grid_invariants(ops in proptest::collection::vec(arb_op(), 1..60)) {
        let mut engine = engine();

        for op in ops {
            let before = engine.grid().unwrap().clone();
            match op {
                Op::Place { row, slot, rec } => {
                    let row_id = format!("r{row}");
                    let rec_id = format!("a{rec}");
                    match engine.place(&row_id, slot_level(slot), &rec_id) {
                        Ok(outcome) => {
                            // Only the target row changed.
                            for other in 0..ROWS {
                                if other != row {
                                    let id = format!("r{other}");
                                    prop_assert_eq!(
                                        engine.grid().unwrap().row(&id),
                                        before.row(&id)
                                    );
                                }
                            }
                            if let Some(evicted) = &outcome.evicted {
                                prop_assert!(!engine.grid().unwrap().is_placed(&evicted.id));
                            }
                        }
                        Err(EngineError::DuplicateRecord { .. }) => {
                            prop_assert_eq!(engine.grid().unwrap(), &before);
                        }
                        Err(other) => prop_assert!(false, "unexpected place error: {}", other),
                    }
                }
                Op::Remove { row, slot } => {
                    let row_id = format!("r{row}");
                    let removed = engine.remove(&row_id, slot_level(slot)).unwrap();
                    if let Some(rec) = removed {
                        prop_assert!(!engine.grid().unwrap().is_placed(&rec.id));
                    } else {
                        prop_assert_eq!(engine.grid().unwrap(), &before);
                    }
                }
                Op::Undo => {
                    engine.undo().unwrap();
                }
            }
            assert_invariants(&engine);
        }
    }

    /// Undo restores the exact pre-mutation grid, modelled against a
    /// shadow stack with the same depth bound.
    #[test]
    fn undo_matches_a_shadow_history(ops in proptest::collection::vec(arb_op(), 1..60)) {
        let mut engine = engine();
        let mut shadow: Vec<SlotGrid> = Vec::new();

        for op in ops {
            let before = engine.grid().unwrap().clone();
            match op {
                Op::Place { row, slot, rec } => {
                    let row_id = format!("r{row}");
                    let rec_id = format!("a{rec}");
                    if engine.place(&row_id, slot_level(slot), &rec_id).is_ok() {
                        shadow.push(before);
                        if shadow.len() > UNDO_DEPTH {
                            shadow.remove(0);
                        }
                    }
                }
                Op::Remove { row, slot } => {
                    let row_id = format!("r{row}");
                    if engine.remove(&row_id, slot_level(slot)).unwrap().is_some() {
                        shadow.push(before);
                        if shadow.len() > UNDO_DEPTH {
                            shadow.remove(0);
                        }
                    }
                }
                Op::Undo => {
                    let restored = engine.undo().unwrap();
                    match shadow.pop() {
                        Some(expected) => {
                            prop_assert!(restored.is_some());
                            prop_assert_eq!(engine.grid().unwrap(), &expected);
                        }
                        None => prop_assert!(restored.is_none()),
                    }
                }
            }
        }
    }
}
