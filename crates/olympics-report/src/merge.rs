//! Table merging: full outer join of two year-keyed series.
//!
//! Values reach this module as a mix of integers, floats and numeric
//! strings. They are coerced to integers here and nowhere else.

use std::collections::BTreeMap;

use olympics_core::CellValue;
use serde::Serialize;

use crate::error::{ReportError, Result};
use crate::projector::KeyedSeries;

/// One year of a merged table. Absent values are zero.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MergedRow {
    pub year: i64,
    pub left: i64,
    pub right: i64,
}

/// Coerce every cell of `column` to an integer (nulls become zero).
pub fn coerce(column: &str, cells: &[CellValue]) -> Result<Vec<i64>> {
    cells
        .iter()
        .map(|cell| {
            cell.to_i64().map_err(|source| ReportError::NotNumeric {
                column: column.to_string(),
                source,
            })
        })
        .collect()
}

/// Outer-join `left` and `right` on their key column.
///
/// Every key found on either side appears exactly once in the output,
/// sorted ascending. A key missing on one side gets 0 for that side.
/// Repeated keys within one side are summed. Rows with a null key carry
/// no year and are dropped.
pub fn outer_join(left: &KeyedSeries, right: &KeyedSeries) -> Result<Vec<MergedRow>> {
    let mut table: BTreeMap<i64, (i64, i64)> = BTreeMap::new();

    for (key, value) in keyed_integers(left)? {
        let slot = &mut table.entry(key).or_default().0;
        *slot = slot.saturating_add(value);
    }
    for (key, value) in keyed_integers(right)? {
        let slot = &mut table.entry(key).or_default().1;
        *slot = slot.saturating_add(value);
    }

    Ok(table
        .into_iter()
        .map(|(year, (left, right))| MergedRow { year, left, right })
        .collect())
}

fn keyed_integers(series: &KeyedSeries) -> Result<Vec<(i64, i64)>> {
    let values = coerce(&series.value_column, &series.values)?;
    let mut pairs = Vec::with_capacity(values.len());
    for (key, value) in series.keys.iter().zip(values) {
        if key.is_null() {
            tracing::warn!(
                column = %series.key_column,
                value,
                "Dropping row with null join key"
            );
            continue;
        }
        let key = key.to_i64().map_err(|source| ReportError::NotNumeric {
            column: series.key_column.clone(),
            source,
        })?;
        pairs.push((key, value));
    }
    Ok(pairs)
}

/// Percentage of `total` represented by `subject`. A zero total counts as 1.
pub fn contribution_percent(subject: i64, total: i64) -> f64 {
    let whole = if total == 0 { 1 } else { total };
    subject as f64 * 100.0 / whole as f64
}
