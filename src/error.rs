//! Error types for the cleannest library.
//!
//! Ingestion treats most of these as fatal for the table being loaded: a
//! malformed timestamp or a missing source directory aborts that table rather
//! than persisting partial data.

use thiserror::Error;

/// Errors that can occur while ingesting, storing or analysing shop data.
#[derive(Error, Debug)]
pub enum CleannestError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// CSV parsing or writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A source directory or file that ingestion needs is absent or empty
    #[error("Missing source: {0}")]
    MissingSource(String),

    /// A required column is absent from a CSV header
    #[error("Missing column `{column}` in {source_name}")]
    MissingColumn {
        /// Column that was expected
        column: String,
        /// File or sheet the header came from
        source_name: String,
    },

    /// Invalid date or timestamp text
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// A field holds a value outside its allowed domain
    #[error("Invalid value for {field}: {value:?}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// Offending raw value
        value: String,
    },

    /// Malformed A1-notation range
    #[error("Invalid sheet range: {0}")]
    InvalidRange(String),

    /// Remote spreadsheet fetch failed
    #[error("Sheet fetch error: {0}")]
    SheetFetch(String),

    /// Lookup by name or id found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Pattern compilation failure
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

impl CleannestError {
    /// Short label for metrics and log fields
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Csv(_) => "csv",
            Self::Io(_) => "io",
            Self::MissingSource(_) => "missing_source",
            Self::MissingColumn { .. } => "missing_column",
            Self::InvalidDate(_) => "invalid_date",
            Self::InvalidField { .. } => "invalid_field",
            Self::InvalidRange(_) => "invalid_range",
            Self::SheetFetch(_) => "sheet_fetch",
            Self::NotFound(_) => "not_found",
            Self::Pattern(_) => "pattern",
            Self::Serialization(_) => "serialization",
            Self::Cache(_) => "cache",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for Result with `CleannestError`
pub type Result<T> = std::result::Result<T, CleannestError>;

impl From<anyhow::Error> for CleannestError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<sled::Error> for CleannestError {
    fn from(err: sled::Error) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<bincode::Error> for CleannestError {
    fn from(err: bincode::Error) -> Self {
        Self::Cache(err.to_string())
    }
}

impl From<reqwest::Error> for CleannestError {
    fn from(err: reqwest::Error) -> Self {
        Self::SheetFetch(err.to_string())
    }
}
