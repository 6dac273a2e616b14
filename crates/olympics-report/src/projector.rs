//! Row projection: reshape result rows into one sequence per column.

use olympics_core::{CellValue, ResultRow};

use crate::error::{ReportError, Result};

/// Columns of a result set, each holding one cell per input row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnSet {
    columns: Vec<(String, Vec<CellValue>)>,
    len: usize,
}

/// A (key, value) pair of columns, ready for joining on the key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedSeries {
    pub key_column: String,
    pub value_column: String,
    pub keys: Vec<CellValue>,
    pub values: Vec<CellValue>,
}

/// Split `rows` into the requested `columns`, preserving row order.
///
/// A row lacking a column contributes [`CellValue::Null`], so every column
/// has exactly `rows.len()` entries.
pub fn project(rows: &[ResultRow], columns: &[&str]) -> ColumnSet {
    let columns = columns
        .iter()
        .map(|name| {
            let cells = rows
                .iter()
                .map(|row| row.get(*name).cloned().unwrap_or(CellValue::Null))
                .collect();
            ((*name).to_string(), cells)
        })
        .collect();

    ColumnSet {
        columns,
        len: rows.len(),
    }
}

impl ColumnSet {
    /// Number of rows projected.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn column(&self, name: &str) -> Result<&[CellValue]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, cells)| cells.as_slice())
            .ok_or_else(|| ReportError::MissingColumn(name.to_string()))
    }

    /// Display labels of a column (chart categories).
    pub fn labels(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.column(name)?.iter().map(CellValue::label).collect())
    }

    /// Pair a key column with a value column.
    pub fn keyed(&self, key: &str, value: &str) -> Result<KeyedSeries> {
        Ok(KeyedSeries {
            key_column: key.to_string(),
            value_column: value.to_string(),
            keys: self.column(key)?.to_vec(),
            values: self.column(value)?.to_vec(),
        })
    }
}
