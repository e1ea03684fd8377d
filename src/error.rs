#![allow(unused_assignments)]

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PbipError {
    #[error("Template not found: {path}")]
    #[diagnostic(help("Pass the path of a PBIP template folder, or a template name under templates/"))]
    TemplateNotFound { path: PathBuf },

    #[error("Invalid PBIP template at {path}: {reason}")]
    #[diagnostic(help(
        "A template named T must contain T.pbip, T.Report/ and T.SemanticModel/"
    ))]
    TemplateInvalid { path: PathBuf, reason: String },

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Failed to parse configuration {path}")]
    #[diagnostic(help("Check the YAML syntax; the file needs a 'parameters' list"))]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid parameter definition '{name}': {reason}")]
    ConfigInvalidParameter { name: String, reason: String },

    #[error("Data file not found: {path}")]
    DataNotFound { path: PathBuf },

    #[error("Failed to parse CSV {path}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Row {row} has different columns than the first row")]
    #[diagnostic(help("Every row of the data file must have the same columns: {expected}"))]
    RowSchemaMismatch { row: usize, expected: String },

    #[error("Parameters missing from data columns: {}", names.join(", "))]
    #[diagnostic(help("Add a column for each parameter declared in the configuration"))]
    MissingParameters { names: Vec<String> },

    #[error("Invalid report name '{identifier}': {reason}")]
    #[diagnostic(help("Report_Name (or Name and Owner) must form a plain folder name"))]
    InvalidIdentifier { identifier: String, reason: String },

    #[error("Unknown semantic model format in {path}")]
    #[diagnostic(help(
        "The semantic model must contain model.bim or definition/model.tmdl"
    ))]
    UnknownModelFormat { path: PathBuf },

    #[error("Failed to parse {path}")]
    ModelParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Glob pattern error: {pattern}")]
    GlobPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PbipError {
    /// Whether a batch may record this error against a single row and move on.
    ///
    /// Anything that is not row-scoped indicates a bug and aborts the batch.
    pub fn is_row_scoped(&self) -> bool {
        !matches!(self, Self::Internal { .. } | Self::GlobPattern { .. })
    }
}

pub type Result<T> = std::result::Result<T, PbipError>;
