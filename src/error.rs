//! Error types for BOQ Estimator.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::ElementId;

/// Errors that abort a run before anything is written to the model.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A required input file does not exist.
    #[error("file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Failed to read an input file from disk.
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The CSV structure itself is broken (not a single bad row).
    #[error("CSV read failed for '{path}': {source}")]
    Csv { path: PathBuf, source: csv::Error },

    /// A column the reader cannot work without is absent from the header.
    #[error("'{path}' has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },

    /// The project snapshot is not valid JSON.
    #[error("invalid project file '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The settings file is not valid TOML.
    #[error("invalid settings file '{path}': {source}")]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// A recipe that cannot be priced as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluateError {
    /// At least one material line has no unit price. Components are listed
    /// in recipe order.
    #[error("missing material: {}", .missing.join(", "))]
    MissingMaterialPrice { missing: Vec<String> },
}

/// Reasons an element's quantity cannot be measured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("missing category")]
    MissingCategory,

    #[error("unrecognized category: {0}")]
    UnrecognizedCategory(String),

    #[error("unsupported material: {0}")]
    UnsupportedMaterial(String),

    /// Volume, area, length or material field is absent or empty.
    #[error("no '{field}' data")]
    MissingField { field: String },
}

/// Per-element failures while applying amounts. Each one skips a single
/// element and never the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error(transparent)]
    Quantity(#[from] QuantityError),

    #[error("element has no type")]
    MissingType,

    #[error("missing '{field}' type parameter")]
    MissingTypeCost { field: String },

    #[error("missing instance parameter '{field}'")]
    MissingDestination { field: String },

    #[error("'{field}' is read-only")]
    ReadOnlyDestination { field: String },
}

/// A change set the host refused. The whole batch is rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("element {0} does not exist")]
    UnknownElement(ElementId),

    #[error("element {id} has no field '{field}'")]
    MissingField { id: ElementId, field: String },

    #[error("field '{field}' on element {id} is read-only")]
    ReadOnlyField { id: ElementId, field: String },

    #[error("field '{field}' on element {id} does not hold a {expected} value")]
    KindMismatch {
        id: ElementId,
        field: String,
        expected: &'static str,
    },
}

/// Errors that can occur when exporting data.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to create the output file or directory.
    #[error("failed to create file '{path}': {source}")]
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write data to the file.
    #[error("failed to write data: {message}")]
    WriteError { message: String },

    /// Failed to serialize data to JSON.
    #[error("JSON serialization failed: {source}")]
    JsonSerialize {
        #[from]
        source: serde_json::Error,
    },

    /// Failed to write CSV data.
    #[error("CSV write failed: {source}")]
    CsvWrite {
        #[from]
        source: csv::Error,
    },

    /// Failed to build or save the spreadsheet workbook.
    #[error("workbook write failed: {source}")]
    Xlsx {
        #[from]
        source: rust_xlsxwriter::XlsxError,
    },
}
