//! `lmap apply` - batch mapping operations from a TOML ops file.
//!
//! The ops file names one category and a sequence of operations:
//!
//! ```toml
//! category = "assets"
//!
//! [[ops]]
//! op = "place"
//! row = "row-17"
//! slot = "most"
//! record = "acct-9"
//!
//! [[ops]]
//! op = "remove"
//! row = "row-17"
//! slot = "likely"
//!
//! [[ops]]
//! op = "undo"
//! ```
//!
//! Operations the engine rejects (duplicate record, unknown row or
//! record) are recorded and the batch continues; a malformed ops file
//! aborts before anything runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use ledgermap_engine::model::SlotLevel;
use ledgermap_engine::MappingEngine;
use ledgermap_store::StorageError;

use crate::exit_codes::{EXIT_CONFLICTS, EXIT_INVALID_CONFIG, EXIT_SAVE_DEGRADED};
use crate::CliError;

// ---------------------------------------------------------------------------
// Ops file
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct OpsFile {
    /// Category every op in the batch targets.
    pub category: String,
    #[serde(default)]
    pub ops: Vec<OpSpec>,
}

#[derive(Debug, Deserialize)]
pub struct OpSpec {
    pub op: OpKind,
    pub row: Option<String>,
    pub slot: Option<String>,
    pub record: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Place,
    Remove,
    Undo,
}

impl OpKind {
    fn as_str(&self) -> &'static str {
        match self {
            OpKind::Place => "place",
            OpKind::Remove => "remove",
            OpKind::Undo => "undo",
        }
    }
}

impl OpsFile {
    pub fn from_toml(input: &str) -> Result<OpsFile, String> {
        toml::from_str(input).map_err(|e| e.to_string())
    }
}

/// A spec with its fields checked and typed. The whole file resolves
/// before the first op executes, so a malformed entry anywhere aborts
/// the batch with nothing run.
enum Op<'a> {
    Place { row: &'a str, slot: SlotLevel, record: &'a str },
    Remove { row: &'a str, slot: SlotLevel },
    Undo,
}

impl OpSpec {
    fn resolve(&self, index: usize) -> Result<Op<'_>, CliError> {
        let op = self.op.as_str();
        match self.op {
            OpKind::Place => Ok(Op::Place {
                row: require(op, "row", &self.row, index)?,
                slot: parse_slot(require(op, "slot", &self.slot, index)?, index)?,
                record: require(op, "record", &self.record, index)?,
            }),
            OpKind::Remove => Ok(Op::Remove {
                row: require(op, "row", &self.row, index)?,
                slot: parse_slot(require(op, "slot", &self.slot, index)?, index)?,
            }),
            OpKind::Undo => Ok(Op::Undo),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ApplyReport {
    pub config_name: String,
    pub category: String,
    pub run_at: String,
    pub dry_run: bool,
    pub ops_total: usize,
    pub applied: usize,
    pub rejected: usize,
    pub outcomes: Vec<OpOutcome>,
    pub saved: bool,
    pub summary: GridSummary,
}

/// Per-op result. `noop` covers removes of empty slots and undo with an
/// empty history; neither counts as applied or rejected.
#[derive(Debug, Serialize)]
pub struct OpOutcome {
    pub index: usize,
    pub op: String,
    pub status: &'static str,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct GridSummary {
    pub rows: usize,
    pub mapped_rows: usize,
    pub placed: usize,
    pub pool: usize,
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

pub fn cmd_apply(
    config_path: PathBuf,
    ops_path: PathBuf,
    dry_run: bool,
    json: bool,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let (config, base_dir) = crate::read_config(&config_path)?;
    let catalog = crate::load_inputs(&config, &base_dir)?;

    let ops_text = std::fs::read_to_string(&ops_path)
        .map_err(|e| CliError::general(format!("cannot read {}: {e}", ops_path.display())))?;
    let ops_file = OpsFile::from_toml(&ops_text).map_err(|e| CliError {
        code: EXIT_INVALID_CONFIG,
        message: format!("{}: {e}", ops_path.display()),
        hint: None,
    })?;
    let category = crate::parse_category(&ops_file.category)?;

    let mut gateway = crate::open_gateway(&config, &base_dir)?;
    let mut engine = MappingEngine::new(catalog);
    engine.activate(category);
    let saved_grid = gateway
        .load_grid(category, engine.catalog())
        .map_err(|e| CliError::general(e.to_string()))?;
    if let Some(grid) = saved_grid {
        engine
            .restore_grid(grid)
            .map_err(|e| CliError::general(e.to_string()))?;
    }

    let ops = ops_file
        .ops
        .iter()
        .enumerate()
        .map(|(index, spec)| spec.resolve(index))
        .collect::<Result<Vec<_>, _>>()?;

    let mut outcomes = Vec::with_capacity(ops.len());
    let mut applied = 0;
    let mut rejected = 0;

    for (index, op) in ops.iter().enumerate() {
        let outcome = run_op(&mut engine, index, op);
        match outcome.status {
            "applied" => applied += 1,
            "rejected" => rejected += 1,
            _ => {}
        }
        eprintln!("  op {}: {} ({})", index, outcome.status, outcome.detail);
        outcomes.push(outcome);
    }

    // Save unless dry-run. Quota exhaustion degrades the run: the grid
    // outcome is reported but the saved state is unchanged.
    let mut saved = false;
    let mut degraded: Option<String> = None;
    if !dry_run {
        let grid = engine.grid().map_err(|e| CliError::general(e.to_string()))?;
        match gateway.save(category, grid) {
            Ok(()) => saved = true,
            Err(err @ StorageError::QuotaExceeded { .. }) => degraded = Some(err.to_string()),
            Err(other) => return Err(CliError::general(other.to_string())),
        }
    }

    let grid = engine.grid().map_err(|e| CliError::general(e.to_string()))?;
    let pool = engine
        .visible_pool()
        .map_err(|e| CliError::general(e.to_string()))?;
    let rows = engine.rows().map_err(|e| CliError::general(e.to_string()))?;
    let report = ApplyReport {
        config_name: config.name.clone(),
        category: category.name().to_string(),
        run_at: chrono::Utc::now().to_rfc3339(),
        dry_run,
        ops_total: ops_file.ops.len(),
        applied,
        rejected,
        outcomes,
        saved,
        summary: GridSummary {
            rows: rows.len(),
            mapped_rows: grid.mapped_row_count(),
            placed: grid.placed_count(),
            pool: pool.len(),
        },
    };

    let json_str = crate::to_json_pretty(&report)?;
    if let Some(ref path) = output {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::general(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }
    if json {
        println!("{json_str}");
    }

    eprintln!(
        "apply '{}' ({}): {} op(s), {} applied, {} rejected; {} of {} row(s) mapped",
        config.name,
        category.name(),
        report.ops_total,
        applied,
        rejected,
        report.summary.mapped_rows,
        report.summary.rows,
    );

    if let Some(msg) = degraded {
        return Err(CliError {
            code: EXIT_SAVE_DEGRADED,
            message: format!("changes not persisted: {msg}"),
            hint: Some("run 'lmap reset --stale' to free space".into()),
        });
    }
    if rejected > 0 {
        return Err(CliError {
            code: EXIT_CONFLICTS,
            message: format!("{rejected} operation(s) rejected"),
            hint: None,
        });
    }
    Ok(())
}

/// Execute one resolved op. Engine rejections become `rejected`
/// outcomes and the batch continues.
fn run_op(engine: &mut MappingEngine, index: usize, op: &Op) -> OpOutcome {
    match *op {
        Op::Place { row, slot, record } => match engine.place(row, slot, record) {
            Ok(placement) => {
                let detail = match placement.evicted {
                    Some(rec) => {
                        format!("placed {record} at {row}/{slot}, evicted {}", rec.id)
                    }
                    None => format!("placed {record} at {row}/{slot}"),
                };
                outcome(index, "place", "applied", detail)
            }
            Err(err) => outcome(index, "place", "rejected", err.to_string()),
        },
        Op::Remove { row, slot } => match engine.remove(row, slot) {
            Ok(Some(rec)) => outcome(
                index,
                "remove",
                "applied",
                format!("removed {} from {row}/{slot}", rec.id),
            ),
            Ok(None) => outcome(index, "remove", "noop", format!("{row}/{slot} already empty")),
            Err(err) => outcome(index, "remove", "rejected", err.to_string()),
        },
        Op::Undo => match engine.undo() {
            Ok(Some(label)) => outcome(index, "undo", "applied", format!("undid: {label}")),
            Ok(None) => outcome(index, "undo", "noop", "nothing to undo".to_string()),
            Err(err) => outcome(index, "undo", "rejected", err.to_string()),
        },
    }
}

fn outcome(index: usize, op: &str, status: &'static str, detail: String) -> OpOutcome {
    OpOutcome { index, op: op.to_string(), status, detail }
}

fn require<'a>(
    op: &'static str,
    field: &'static str,
    value: &'a Option<String>,
    index: usize,
) -> Result<&'a str, CliError> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| CliError {
            code: EXIT_INVALID_CONFIG,
            message: format!("ops[{index}]: '{op}' requires '{field}'"),
            hint: None,
        })
}

fn parse_slot(input: &str, index: usize) -> Result<SlotLevel, CliError> {
    SlotLevel::parse(input).ok_or_else(|| CliError {
        code: EXIT_INVALID_CONFIG,
        message: format!("ops[{index}]: unknown slot '{input}' (expected most, likely, or possible)"),
        hint: None,
    })
}
