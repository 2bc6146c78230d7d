use serde::Deserialize;

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MapConfig {
    pub name: String,
    pub taxonomy: TaxonomyConfig,
    pub records: RecordsConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The source template: rows grouped under headings, each tagged with
/// its master category.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyConfig {
    pub file: String,
    pub columns: TaxonomyColumns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyColumns {
    pub id: String,
    pub number: String,
    pub name: String,
    pub group: String,
    pub category: String,
}

/// The external ledger's account export.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordsConfig {
    pub file: String,
    pub columns: RecordColumns,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordColumns {
    pub id: String,
    pub number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub raw_type: String,
    pub group: String,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    /// Mapping database path. Defaults to the per-user data directory
    /// when absent.
    #[serde(default)]
    pub path: Option<String>,
    /// Largest value the store accepts, in bytes. Absent means the
    /// store's built-in cap.
    #[serde(default)]
    pub value_cap_bytes: Option<usize>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MapConfig {
    pub fn from_toml(input: &str) -> Result<Self, EngineError> {
        let config: MapConfig =
            toml::from_str(input).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.name.trim().is_empty() {
            return Err(EngineError::ConfigValidation("name must not be empty".into()));
        }
        if self.taxonomy.file.trim().is_empty() {
            return Err(EngineError::ConfigValidation(
                "taxonomy.file must not be empty".into(),
            ));
        }
        if self.records.file.trim().is_empty() {
            return Err(EngineError::ConfigValidation(
                "records.file must not be empty".into(),
            ));
        }

        let tax = &self.taxonomy.columns;
        for (label, value) in [
            ("taxonomy.columns.id", &tax.id),
            ("taxonomy.columns.number", &tax.number),
            ("taxonomy.columns.name", &tax.name),
            ("taxonomy.columns.group", &tax.group),
            ("taxonomy.columns.category", &tax.category),
        ] {
            if value.trim().is_empty() {
                return Err(EngineError::ConfigValidation(format!(
                    "{label} must not be empty"
                )));
            }
        }

        let rec = &self.records.columns;
        for (label, value) in [
            ("records.columns.id", &rec.id),
            ("records.columns.number", &rec.number),
            ("records.columns.name", &rec.name),
            ("records.columns.type", &rec.raw_type),
            ("records.columns.group", &rec.group),
        ] {
            if value.trim().is_empty() {
                return Err(EngineError::ConfigValidation(format!(
                    "{label} must not be empty"
                )));
            }
        }

        if self.store.value_cap_bytes == Some(0) {
            return Err(EngineError::ConfigValidation(
                "store.value_cap_bytes must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
