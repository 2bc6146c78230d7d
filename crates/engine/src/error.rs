use std::fmt;

use crate::model::SlotLevel;

#[derive(Debug)]
pub enum EngineError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty name, blank file or column, etc.).
    ConfigValidation(String),
    /// Mutation addressed to a row id the active category does not contain.
    RowNotFound { row_id: String },
    /// Placement referenced a record id outside the active category's pool.
    RecordNotFound { record_id: String },
    /// The record already occupies a slot; carries where it sits.
    DuplicateRecord {
        record_id: String,
        row_id: String,
        slot: SlotLevel,
    },
    /// An operation that needs an active category arrived before activate().
    NoActiveCategory,
    /// Taxonomy load saw the same row id twice within one category.
    DuplicateRowId { category: String, row_id: String },
    /// Record load saw the same record id twice.
    DuplicateRecordId { record_id: String },
    /// A taxonomy row names a category outside the master set.
    InvalidCategory { row_id: String, value: String },
    /// Missing required column in input data.
    MissingColumn { file: String, column: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::RowNotFound { row_id } => write!(f, "row '{row_id}' not found"),
            Self::RecordNotFound { record_id } => {
                write!(f, "record '{record_id}' not in the active pool")
            }
            Self::DuplicateRecord { record_id, row_id, slot } => {
                write!(f, "record '{record_id}' already placed at {row_id}/{slot}")
            }
            Self::NoActiveCategory => write!(f, "no active category"),
            Self::DuplicateRowId { category, row_id } => {
                write!(f, "category '{category}': duplicate row id '{row_id}'")
            }
            Self::DuplicateRecordId { record_id } => {
                write!(f, "duplicate record id '{record_id}'")
            }
            Self::InvalidCategory { row_id, value } => {
                write!(f, "row '{row_id}': unknown category '{value}'")
            }
            Self::MissingColumn { file, column } => {
                write!(f, "file '{file}': missing column '{column}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
