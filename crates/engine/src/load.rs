//! Config-driven CSV loading into a [`Catalog`].

use std::fs;
use std::path::Path;

use crate::catalog::Catalog;
use crate::config::{MapConfig, RecordColumns, TaxonomyColumns};
use crate::error::EngineError;
use crate::model::{DestinationRecord, MasterCategory, SourceRow};

/// Read both input files named by the config (paths relative to
/// `base_dir`) and build the catalog.
pub fn load_catalog(config: &MapConfig, base_dir: &Path) -> Result<Catalog, EngineError> {
    let taxonomy_path = base_dir.join(&config.taxonomy.file);
    let taxonomy_csv = fs::read_to_string(&taxonomy_path)
        .map_err(|e| EngineError::Io(format!("{}: {e}", taxonomy_path.display())))?;
    let records_path = base_dir.join(&config.records.file);
    let records_csv = fs::read_to_string(&records_path)
        .map_err(|e| EngineError::Io(format!("{}: {e}", records_path.display())))?;

    let mut catalog = Catalog::new();
    let tagged = load_taxonomy_rows(&config.taxonomy.file, &taxonomy_csv, &config.taxonomy.columns)?;
    for (category, row) in tagged {
        catalog.add_rows(category, vec![row])?;
    }
    let records = load_records(&config.records.file, &records_csv, &config.records.columns)?;
    catalog.add_records(records)?;
    Ok(catalog)
}

/// Parse the taxonomy CSV into (category, row) pairs, CSV order.
/// Each row's category column must name a master category.
pub fn load_taxonomy_rows(
    file_name: &str,
    csv_data: &str,
    columns: &TaxonomyColumns,
) -> Result<Vec<(MasterCategory, SourceRow)>, EngineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| EngineError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, EngineError> {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            EngineError::MissingColumn {
                file: file_name.into(),
                column: name.into(),
            }
        })
    };

    let id_idx = idx(&columns.id)?;
    let number_idx = idx(&columns.number)?;
    let name_idx = idx(&columns.name)?;
    let group_idx = idx(&columns.group)?;
    let category_idx = idx(&columns.category)?;

    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| EngineError::Io(e.to_string()))?;

        let id = record.get(id_idx).unwrap_or("").to_string();
        let category_str = record.get(category_idx).unwrap_or("");
        let category =
            MasterCategory::parse(category_str).ok_or_else(|| EngineError::InvalidCategory {
                row_id: id.clone(),
                value: category_str.to_string(),
            })?;

        rows.push((
            category,
            SourceRow {
                id,
                number: record.get(number_idx).unwrap_or("").to_string(),
                name: record.get(name_idx).unwrap_or("").to_string(),
                group_heading: record.get(group_idx).unwrap_or("").to_string(),
            },
        ));
    }

    Ok(rows)
}

/// Parse the ledger export into destination records. Classification
/// happens at construction from the raw type/group columns.
pub fn load_records(
    file_name: &str,
    csv_data: &str,
    columns: &RecordColumns,
) -> Result<Vec<DestinationRecord>, EngineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| EngineError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let idx = |name: &str| -> Result<usize, EngineError> {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            EngineError::MissingColumn {
                file: file_name.into(),
                column: name.into(),
            }
        })
    };

    let id_idx = idx(&columns.id)?;
    let number_idx = idx(&columns.number)?;
    let name_idx = idx(&columns.name)?;
    let type_idx = idx(&columns.raw_type)?;
    let group_idx = idx(&columns.group)?;

    let mut records = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| EngineError::Io(e.to_string()))?;
        records.push(DestinationRecord::new(
            record.get(id_idx).unwrap_or(""),
            record.get(number_idx).unwrap_or(""),
            record.get(name_idx).unwrap_or(""),
            record.get(type_idx).unwrap_or(""),
            record.get(group_idx).unwrap_or(""),
        ));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;

    fn taxonomy_columns() -> TaxonomyColumns {
        TaxonomyColumns {
            id: "row_id".into(),
            number: "number".into(),
            name: "name".into(),
            group: "group".into(),
            category: "category".into(),
        }
    }

    fn record_columns() -> RecordColumns {
        RecordColumns {
            id: "account_id".into(),
            number: "number".into(),
            name: "name".into(),
            raw_type: "type".into(),
            group: "detail_type".into(),
        }
    }

    #[test]
    fn load_taxonomy_basic() {
        let csv = "\
row_id,number,name,group,category
CA-100,100,Cash on Hand,Current Assets,assets
CA-110,110,Bank Accounts,Current Assets,Assets
EX-600,600,Rent,Operating Expenses,expense
";
        let rows = load_taxonomy_rows("template.csv", csv, &taxonomy_columns()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].0, MasterCategory::Assets);
        assert_eq!(rows[0].1.id, "CA-100");
        assert_eq!(rows[1].0, MasterCategory::Assets);
        assert_eq!(rows[2].0, MasterCategory::Expense);
        assert_eq!(rows[2].1.group_heading, "Operating Expenses");
    }

    #[test]
    fn load_taxonomy_rejects_unknown_category() {
        let csv = "\
row_id,number,name,group,category
CA-100,100,Cash,Current,wealth
";
        let err = load_taxonomy_rows("template.csv", csv, &taxonomy_columns()).unwrap_err();
        match err {
            EngineError::InvalidCategory { row_id, value } => {
                assert_eq!(row_id, "CA-100");
                assert_eq!(value, "wealth");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_column_is_reported_with_file() {
        let csv = "row_id,number,name,group\nCA-100,100,Cash,Current\n";
        let err = load_taxonomy_rows("template.csv", csv, &taxonomy_columns()).unwrap_err();
        match err {
            EngineError::MissingColumn { file, column } => {
                assert_eq!(file, "template.csv");
                assert_eq!(column, "category");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn load_records_classifies() {
        let csv = "\
account_id,number,name,type,detail_type
1,1010,Checking,Bank,Checking
2,6100,Office Rent,Expense,Rent
3,9999,Misc,Other Expense,
";
        let records = load_records("accounts.csv", csv, &record_columns()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].category, MasterCategory::Assets);
        assert_eq!(records[1].category, MasterCategory::Expense);
        assert_eq!(records[2].category, MasterCategory::Other);
    }

    #[test]
    fn load_catalog_from_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("template.csv"),
            "row_id,number,name,group,category\nCA-100,100,Cash,Current,assets\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("accounts.csv"),
            "account_id,number,name,type,detail_type\n1,1010,Checking,Bank,Checking\n",
        )
        .unwrap();

        let config = MapConfig::from_toml(
            r#"
name = "test"

[taxonomy]
file = "template.csv"

[taxonomy.columns]
id       = "row_id"
number   = "number"
name     = "name"
group    = "group"
category = "category"

[records]
file = "accounts.csv"

[records.columns]
id     = "account_id"
number = "number"
name   = "name"
type   = "type"
group  = "detail_type"
"#,
        )
        .unwrap();

        let catalog = load_catalog(&config, dir.path()).unwrap();
        assert_eq!(catalog.rows(MasterCategory::Assets).len(), 1);
        assert_eq!(catalog.records(MasterCategory::Assets).len(), 1);
    }

    #[test]
    fn load_catalog_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = MapConfig::from_toml(
            r#"
name = "test"

[taxonomy]
file = "absent.csv"

[taxonomy.columns]
id       = "row_id"
number   = "number"
name     = "name"
group    = "group"
category = "category"

[records]
file = "accounts.csv"

[records.columns]
id     = "account_id"
number = "number"
name   = "name"
type   = "type"
group  = "detail_type"
"#,
        )
        .unwrap();
        let err = load_catalog(&config, dir.path()).unwrap_err();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
