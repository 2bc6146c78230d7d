//! `ledgermap-engine` — Ranked-slot account mapping engine.
//!
//! Pure engine crate: classifies destination records into a fixed master
//! taxonomy and assigns them to ranked slots on source rows, with cascade
//! displacement, bounded undo and pool filtering. No persistence or
//! rendering dependencies.

pub mod catalog;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod grid;
pub mod history;
pub mod load;
pub mod model;

pub use catalog::Catalog;
pub use config::MapConfig;
pub use engine::MappingEngine;
pub use error::EngineError;
pub use grid::{Placement, SlotGrid};
pub use model::{DestinationRecord, MasterCategory, SlotLevel, SourceRow};
