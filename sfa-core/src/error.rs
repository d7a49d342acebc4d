use sfa_utils::error::DateError;
use thiserror::Error;

/// Errors raised while reading an upstream table.
///
/// Every variant is fatal: upstream tables are expected to be well-formed.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to open table: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("{table} table has no {column:?} column")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("{table} table row {row}: {source}")]
    Timestamp {
        table: &'static str,
        row: usize,
        #[source]
        source: DateError,
    },
    #[error("{table} table row {row}: {column} value {value:?} is not a number")]
    Number {
        table: &'static str,
        row: usize,
        column: &'static str,
        value: String,
    },
}
