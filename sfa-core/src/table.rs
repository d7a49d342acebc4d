//! CSV table access for the upstream input tables.
//!
//! Each table has a header row; columns are located by name
//! (case-insensitive), so extra columns and column order do not matter.
//! Files ending in `.gz` are decompressed on the fly.
//!
//! # Table layouts
//!
//! - **Temperature**: `station_id,timestamp,air_temperature`
//! - **Sap**: `tap_id,tree_id,timestamp,sap_weight,sugar_content`
//! - **Trees**: `tree_id,site,species`

use crate::error::TableError;
use csv::{ReaderBuilder, StringRecord, Trim};
use flate2::read::GzDecoder;
use sfa_utils::{dates::parse_timestamp, missing::parse_optional};
use std::{fs::File, io::BufReader, io::Read, path::Path};

/// Open a table file, transparently decompressing gzip input.
pub fn open_table(path: &Path) -> Result<Box<dyn Read>, TableError> {
    let file = BufReader::new(File::open(path)?);
    let gzipped = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));
    if gzipped {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// A csv reader configured for upstream tables.
pub fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader)
}

/// Positions of the named columns within a table's header row.
#[derive(Debug, Clone)]
pub struct Columns {
    table: &'static str,
    names: Vec<&'static str>,
    positions: Vec<Option<usize>>,
}

impl Columns {
    /// Locate `required` and `optional` columns in `headers`.
    ///
    /// Fails if any required column is absent.
    pub fn locate(
        table: &'static str,
        headers: &StringRecord,
        required: &[&'static str],
        optional: &[&'static str],
    ) -> Result<Columns, TableError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(name))
        };
        let mut names = Vec::new();
        let mut positions = Vec::new();
        for &column in required {
            let position = find(column).ok_or(TableError::MissingColumn { table, column })?;
            names.push(column);
            positions.push(Some(position));
        }
        for &column in optional {
            names.push(column);
            positions.push(find(column));
        }
        Ok(Columns {
            table,
            names,
            positions,
        })
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.names
            .iter()
            .position(|name| *name == column)
            .and_then(|i| self.positions[i])
    }

    /// Raw text of `column` in `record`; empty when the column or cell is absent.
    pub fn text<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        self.position(column)
            .and_then(|i| record.get(i))
            .unwrap_or("")
    }

    /// `column` parsed as a timestamp.
    pub fn timestamp(
        &self,
        record: &StringRecord,
        row: usize,
        column: &str,
    ) -> Result<chrono::NaiveDateTime, TableError> {
        parse_timestamp(self.text(record, column)).map_err(|source| TableError::Timestamp {
            table: self.table,
            row,
            source,
        })
    }

    /// `column` parsed as an optional number.
    pub fn number(
        &self,
        record: &StringRecord,
        row: usize,
        column: &'static str,
    ) -> Result<Option<f64>, TableError> {
        let value = self.text(record, column);
        parse_optional(value).map_err(|_| TableError::Number {
            table: self.table,
            row,
            column,
            value: value.to_string(),
        })
    }
}
