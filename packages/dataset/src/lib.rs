#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident dataset loading and normalization.
//!
//! A [`DataSource`] (the embedded demo export, a file on disk, or an
//! uploaded buffer) is parsed into a [`Dataset`]: exact duplicate rows are
//! dropped, the required columns are validated, and calendar fields are
//! derived from the first recognized timestamp column. [`DatasetCache`]
//! memoizes the result by content hash so repeated interactions within a
//! session do not re-parse the same bytes.

pub mod cache;
pub mod config;
pub mod dataset;
pub mod loader;
pub mod parsing;
pub mod source;

use std::path::PathBuf;

use serde::Serialize;

pub use cache::DatasetCache;
pub use config::LoaderConfig;
pub use dataset::Dataset;
pub use loader::{load, load_bytes};
pub use source::DataSource;

/// Fatal errors that abort a load. No [`Dataset`] is produced.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The source file could not be read.
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The CSV parser encountered a malformed record.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// A row has more fields than the header.
    #[error("Row on line {line} has {found} fields but the header has {expected}")]
    RowTooLong {
        /// Source line number (the header is line 1).
        line: u64,
        /// Number of header columns.
        expected: usize,
        /// Number of fields in the row.
        found: usize,
    },

    /// The input has no header row.
    #[error("CSV input contains no header row")]
    EmptyHeader,

    /// One or more required columns are absent from the header.
    #[error("Missing required columns in dataset: {}", .fields.join(", "))]
    MissingFields {
        /// Header names of every missing column, in required order.
        fields: Vec<String>,
    },

    /// A coordinate cell is not a finite number.
    #[error("Invalid coordinate in column '{column}' on line {line}: '{value}'")]
    InvalidCoordinate {
        /// Coordinate column header.
        column: String,
        /// Source line number (the header is line 1).
        line: u64,
        /// The raw cell value.
        value: String,
    },

    /// A cell of the recognized timestamp column could not be parsed.
    #[error("Unparseable timestamp in column '{column}' on line {line}: '{value}'")]
    TimestampParse {
        /// Timestamp column header.
        column: String,
        /// Source line number (the header is line 1).
        line: u64,
        /// The raw cell value.
        value: String,
    },

    /// A loader configuration could not be read or is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// Non-fatal conditions noticed while loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LoadWarning {
    /// None of the timestamp aliases matched a header, so time-based
    /// aggregations are unavailable.
    #[serde(rename_all = "camelCase")]
    NoTimestampColumn {
        /// Aliases that were searched, in order.
        searched: Vec<String>,
    },
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTimestampColumn { searched } => write!(
                f,
                "no timestamp column found (searched {}); time-based analysis is unavailable",
                searched.join(", ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_message_names_columns() {
        let err = LoadError::MissingFields {
            fields: vec!["X".to_string(), "Y".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Missing required columns in dataset: X, Y"
        );
    }

    #[test]
    fn io_message_names_the_path() {
        let err = LoadError::Io {
            path: PathBuf::from("/data/incidents.csv"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let message = err.to_string();
        let prefix = "I/O error reading /data/incidents.csv: ";
        assert!(message.starts_with(prefix), "{message}");
    }

    #[test]
    fn warning_serializes_with_kind_tag() {
        let warning = LoadWarning::NoTimestampColumn {
            searched: vec!["Dates".to_string()],
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "noTimestampColumn");
        assert_eq!(json["searched"][0], "Dates");
    }
}
