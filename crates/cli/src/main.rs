// ledgermap CLI - headless ranked-slot mapping operations

mod apply;
mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use ledgermap_engine::load::load_catalog;
use ledgermap_engine::{Catalog, MapConfig, MappingEngine, MasterCategory, SlotGrid};
use ledgermap_store::{MappingGateway, SqliteStore};

use exit_codes::{EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "lmap")]
#[command(about = "Ranked-slot account mapping (CLI mode, headless)")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a mapping config and its input files
    #[command(after_help = "\
Examples:
  lmap validate ledger.toml
  lmap validate ledger.toml --json")]
    Validate {
        /// Path to the mapping config file
        config: PathBuf,

        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,
    },

    /// Classify the destination records into the master taxonomy
    #[command(after_help = "\
Examples:
  lmap classify ledger.toml
  lmap classify ledger.toml --category assets
  lmap classify ledger.toml --json")]
    Classify {
        /// Path to the mapping config file
        config: PathBuf,

        /// List the records of one category instead of the counts
        #[arg(long)]
        category: Option<String>,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Show the saved mapping for one category
    Show {
        /// Path to the mapping config file
        config: PathBuf,

        /// Master category (name or slug, e.g. assets, cogs)
        #[arg(long)]
        category: String,

        /// Output the stored JSON document instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List the unplaced destination pool for one category
    #[command(after_help = "\
Examples:
  lmap pool ledger.toml --category assets
  lmap pool ledger.toml --category assets --search checking")]
    Pool {
        /// Path to the mapping config file
        config: PathBuf,

        /// Master category (name or slug)
        #[arg(long)]
        category: String,

        /// Case-insensitive substring over record number and name
        #[arg(long)]
        search: Option<String>,

        /// Output JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Apply a batch of mapping operations from a TOML ops file
    #[command(after_help = "\
Exit code 4 means some operations were rejected (duplicate record,
unknown row or record); the rest were applied and saved. Exit code 5
means the save hit the storage quota and nothing was persisted.

Examples:
  lmap apply ledger.toml ops.toml
  lmap apply ledger.toml ops.toml --json
  lmap apply ledger.toml ops.toml --dry-run
  lmap apply ledger.toml ops.toml --output report.json")]
    Apply {
        /// Path to the mapping config file
        config: PathBuf,

        /// Path to the TOML ops file
        ops: PathBuf,

        /// Run the batch without saving
        #[arg(long)]
        dry_run: bool,

        /// Output the JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Delete saved mappings
    #[command(after_help = "\
Examples:
  lmap reset ledger.toml --category assets
  lmap reset ledger.toml --all
  lmap reset ledger.toml --stale")]
    Reset {
        /// Path to the mapping config file
        config: PathBuf,

        /// Clear one category's saved mapping
        #[arg(long)]
        category: Option<String>,

        /// Clear every saved mapping
        #[arg(long)]
        all: bool,

        /// Purge saved mappings older than the retention window
        #[arg(long)]
        stale: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        None => {
            eprintln!("Usage: lmap <command> [options]");
            eprintln!("       lmap --help for more information");
            Ok(())
        }
        Some(Commands::Validate { config, json }) => cmd_validate(config, json),
        Some(Commands::Classify { config, category, json }) => cmd_classify(config, category, json),
        Some(Commands::Show { config, category, json }) => cmd_show(config, category, json),
        Some(Commands::Pool { config, category, search, json }) => {
            cmd_pool(config, category, search, json)
        }
        Some(Commands::Apply { config, ops, dry_run, json, output }) => {
            apply::cmd_apply(config, ops, dry_run, json, output)
        }
        Some(Commands::Reset { config, category, all, stale }) => {
            cmd_reset(config, category, all, stale)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }
}

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

/// Read and validate the config, returning it with its base directory.
/// Input file paths in the config resolve against that directory.
fn read_config(path: &Path) -> Result<(MapConfig, PathBuf), CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::general(format!("cannot read {}: {e}", path.display())))?;
    let config = MapConfig::from_toml(&text).map_err(|e| CliError::config(e.to_string()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
    Ok((config, base_dir))
}

fn load_inputs(config: &MapConfig, base_dir: &Path) -> Result<Catalog, CliError> {
    load_catalog(config, base_dir).map_err(|e| CliError::general(e.to_string()))
}

fn parse_category(input: &str) -> Result<MasterCategory, CliError> {
    MasterCategory::parse(input).ok_or_else(|| {
        CliError::usage(format!(
            "unknown category '{input}' (expected one of: assets, liabilities, equity, revenue, cogs, expense, other)"
        ))
    })
}

/// Open the mapping store named by the config. A relative path resolves
/// against the config's directory; absent, the per-user data directory.
/// `store.value_cap_bytes` overrides the store's per-value cap.
fn open_gateway(
    config: &MapConfig,
    base_dir: &Path,
) -> Result<MappingGateway<SqliteStore>, CliError> {
    let path = match &config.store.path {
        Some(p) => base_dir.join(p),
        None => dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ledgermap")
            .join("mappings.db"),
    };
    let mut store = SqliteStore::open(&path).map_err(|e| CliError::general(e.to_string()))?;
    if let Some(cap) = config.store.value_cap_bytes {
        store = store.with_value_cap(cap);
    }
    Ok(MappingGateway::new(store))
}

fn to_json_pretty<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_validate(config_path: PathBuf, json: bool) -> Result<(), CliError> {
    let (config, base_dir) = read_config(&config_path)?;
    let catalog = load_inputs(&config, &base_dir)?;

    if json {
        let categories: Vec<serde_json::Value> = catalog
            .category_counts()
            .iter()
            .map(|(cat, n)| serde_json::json!({ "category": cat.name(), "count": n }))
            .collect();
        let payload = serde_json::json!({
            "name": config.name,
            "rows": catalog.row_count(),
            "records": catalog.record_count(),
            "categories": categories,
        });
        println!("{}", to_json_pretty(&payload)?);
    }

    eprintln!(
        "valid: '{}' with {} row(s), {} record(s)",
        config.name,
        catalog.row_count(),
        catalog.record_count(),
    );
    Ok(())
}

fn cmd_classify(
    config_path: PathBuf,
    category: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let (config, base_dir) = read_config(&config_path)?;
    let catalog = load_inputs(&config, &base_dir)?;

    if let Some(input) = category {
        let category = parse_category(&input)?;
        let records = catalog.records(category);

        if json {
            let items: Vec<serde_json::Value> = records
                .iter()
                .map(|rec| {
                    serde_json::json!({
                        "id": rec.id,
                        "number": rec.number,
                        "name": rec.name,
                        "type": rec.raw_type,
                        "group": rec.raw_group,
                    })
                })
                .collect();
            println!("{}", to_json_pretty(&items)?);
        } else {
            for rec in records {
                println!("{:<10} {:<32} {}", rec.number, rec.name, rec.raw_type);
            }
        }
        eprintln!("{} record(s) classified as {}", records.len(), category.name());
        return Ok(());
    }

    let counts = catalog.category_counts();
    if json {
        let items: Vec<serde_json::Value> = counts
            .iter()
            .map(|(cat, n)| serde_json::json!({ "category": cat.name(), "count": n }))
            .collect();
        let payload = serde_json::json!({
            "total": catalog.record_count(),
            "categories": items,
        });
        println!("{}", to_json_pretty(&payload)?);
    } else {
        for (cat, n) in &counts {
            println!("{:<20} {:>5}", cat.name(), n);
        }
        println!("{:<20} {:>5}", "total", catalog.record_count());
    }
    Ok(())
}

fn cmd_show(config_path: PathBuf, category: String, json: bool) -> Result<(), CliError> {
    let (config, base_dir) = read_config(&config_path)?;
    let catalog = load_inputs(&config, &base_dir)?;
    let category = parse_category(&category)?;
    let mut gateway = open_gateway(&config, &base_dir)?;

    let mapping = gateway
        .load(category)
        .map_err(|e| CliError::general(e.to_string()))?;

    if json {
        match &mapping {
            Some(m) => println!("{}", to_json_pretty(m)?),
            None => println!(
                "{}",
                to_json_pretty(&serde_json::json!({
                    "type": category.name(),
                    "rows": {},
                }))?
            ),
        }
        return Ok(());
    }

    let grid = match mapping {
        Some(m) => m.to_grid(category, &catalog),
        None => SlotGrid::new(catalog.rows(category).iter().map(|r| r.id.clone())),
    };

    for group in catalog.groups(category) {
        println!("{}", group.heading);
        for row in group.rows {
            let mark = if grid.has_any_mapping(&row.id) { "x" } else { " " };
            println!("  [{mark}] {:<10} {}", row.number, row.name);
            if let Some(slots) = grid.row(&row.id) {
                for (level, rec) in slots.occupied() {
                    println!("        {:<9} {:<10} {}", format!("{level}:"), rec.number, rec.name);
                }
            }
        }
    }

    eprintln!(
        "{}: {} of {} row(s) mapped, {} record(s) placed",
        category.name(),
        grid.mapped_row_count(),
        catalog.rows(category).len(),
        grid.placed_count(),
    );
    Ok(())
}

fn cmd_pool(
    config_path: PathBuf,
    category: String,
    search: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let (config, base_dir) = read_config(&config_path)?;
    let catalog = load_inputs(&config, &base_dir)?;
    let category = parse_category(&category)?;
    let mut gateway = open_gateway(&config, &base_dir)?;

    let mut engine = MappingEngine::new(catalog);
    engine.activate(category);
    let saved = gateway
        .load_grid(category, engine.catalog())
        .map_err(|e| CliError::general(e.to_string()))?;
    if let Some(grid) = saved {
        engine
            .restore_grid(grid)
            .map_err(|e| CliError::general(e.to_string()))?;
    }
    if let Some(term) = search {
        engine
            .set_search(term)
            .map_err(|e| CliError::general(e.to_string()))?;
    }

    let pool = engine
        .visible_pool()
        .map_err(|e| CliError::general(e.to_string()))?;

    if json {
        let items: Vec<serde_json::Value> = pool
            .iter()
            .map(|rec| {
                serde_json::json!({
                    "id": rec.id,
                    "number": rec.number,
                    "name": rec.name,
                })
            })
            .collect();
        println!("{}", to_json_pretty(&items)?);
    } else {
        for rec in &pool {
            println!("{:<10} {}", rec.number, rec.name);
        }
    }

    eprintln!("{} unplaced record(s) in {}", pool.len(), category.name());
    Ok(())
}

fn cmd_reset(
    config_path: PathBuf,
    category: Option<String>,
    all: bool,
    stale: bool,
) -> Result<(), CliError> {
    let (config, base_dir) = read_config(&config_path)?;
    let mut gateway = open_gateway(&config, &base_dir)?;

    match (category, all, stale) {
        (Some(input), false, false) => {
            let category = parse_category(&input)?;
            gateway
                .delete(category)
                .map_err(|e| CliError::general(e.to_string()))?;
            eprintln!("cleared saved mapping for {}", category.name());
        }
        (None, true, false) => {
            let saved = gateway
                .saved_categories()
                .map_err(|e| CliError::general(e.to_string()))?;
            for category in &saved {
                gateway
                    .delete(*category)
                    .map_err(|e| CliError::general(e.to_string()))?;
            }
            eprintln!("cleared {} saved mapping(s)", saved.len());
        }
        (None, false, true) => {
            let purged = gateway
                .purge_stale(chrono::Utc::now())
                .map_err(|e| CliError::general(e.to_string()))?;
            eprintln!("purged {} stale mapping(s)", purged);
        }
        _ => {
            return Err(CliError::usage(
                "pass exactly one of --category <name>, --all, --stale",
            ));
        }
    }
    Ok(())
}
