//! CSV column type inference.
//!
//! For each column, look at the sampled rows:
//!  - Ignore empty cells
//!  - Integer samples give BIGINT, other numerics give DOUBLE PRECISION
//!  - Mixed integer/float widens to DOUBLE PRECISION
//!  - Anything non-numeric (or a numeric/text conflict) falls back to TEXT
//! Columns with no samples at all default to TEXT.

use crate::error::{Result, VendsumError};

/// Inferred type of a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

impl ColumnType {
    /// Returns the SQL type used in generated DDL. BIGINT / DOUBLE PRECISION /
    /// TEXT are understood by both supported backends.
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Integer => "BIGINT",
            Self::Float => "DOUBLE PRECISION",
            Self::Text => "TEXT",
        }
    }

    /// Widens this type to also accommodate `other`.
    fn widen(self, other: ColumnType) -> ColumnType {
        use ColumnType::*;
        match (self, other) {
            (Integer, Integer) => Integer,
            (Integer, Float) | (Float, Integer) | (Float, Float) => Float,
            _ => Text,
        }
    }
}

/// A named, typed column derived from a CSV header and sample rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

/// Derives typed columns for a table from its header row and a sample of
/// data rows (normally the first ingestion batch).
pub fn derive_columns(
    table_name: &str,
    header_names: &[String],
    sample_rows: &[Vec<String>],
) -> Result<Vec<Column>> {
    if header_names.is_empty() {
        return Err(VendsumError::ingestion(format!(
            "`{table_name}` has no headers"
        )));
    }

    let mut cols = Vec::with_capacity(header_names.len());

    for (idx, raw_name) in header_names.iter().enumerate() {
        let col_name = raw_name.trim();
        if col_name.is_empty() {
            return Err(VendsumError::ingestion(format!(
                "header at index {idx} in `{table_name}` is empty after trimming"
            )));
        }

        let mut inferred: Option<ColumnType> = None;

        for row in sample_rows {
            let cell = row.get(idx).map(|s| s.trim()).unwrap_or("");
            if cell.is_empty() {
                continue;
            }

            let cell_ty = infer_cell_type(cell);
            inferred = Some(match inferred {
                None => cell_ty,
                Some(prev) => prev.widen(cell_ty),
            });

            // Nothing widens beyond TEXT, stop sampling this column
            if inferred == Some(ColumnType::Text) {
                break;
            }
        }

        cols.push(Column {
            name: col_name.to_string(),
            ty: inferred.unwrap_or(ColumnType::Text),
        });
    }

    Ok(cols)
}

/// Infers the type of a single non-empty cell.
fn infer_cell_type(raw: &str) -> ColumnType {
    // strip wrapping quotes
    let v = raw.trim().trim_matches('"');

    if v.parse::<i64>().is_ok() {
        return ColumnType::Integer;
    }
    if v.parse::<f64>().is_ok() {
        return ColumnType::Float;
    }
    ColumnType::Text
}
