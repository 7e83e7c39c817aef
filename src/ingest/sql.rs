//! SQL statement builders for CSV ingestion.
//!
//! Everything is built as plain SQL text so a whole batch can run through
//! `DatabaseClient::execute_transaction` regardless of backend.

use crate::error::{Result, VendsumError};
use crate::ingest::infer::{Column, ColumnType};

/// Sanitizes a file stem into a safe table name: non-alphanumeric characters
/// become underscores, and a leading digit gets an underscore prefix.
pub fn table_name_for(stem: &str) -> String {
    let mut name: String = stem
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Double-quotes an identifier, escaping embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Renders a CSV cell as a SQL literal for the given column type.
///
/// Empty cells become NULL. Numeric cells that fail to parse are a type
/// coercion failure and abort the file.
pub fn literal(cell: &str, ty: ColumnType, column: &str) -> Result<String> {
    if cell.trim().is_empty() {
        return Ok("NULL".to_string());
    }

    match ty {
        ColumnType::Integer => {
            let v = cell.trim().trim_matches('"');
            v.parse::<i64>().map(|n| n.to_string()).map_err(|_| {
                VendsumError::ingestion(format!(
                    "value '{v}' in column `{column}` is not an integer"
                ))
            })
        }
        ColumnType::Float => {
            let v = cell.trim().trim_matches('"');
            v.parse::<f64>().map(|n| n.to_string()).map_err(|_| {
                VendsumError::ingestion(format!(
                    "value '{v}' in column `{column}` is not numeric"
                ))
            })
        }
        // Text cells are stored verbatim; whitespace is an enrichment concern
        ColumnType::Text => Ok(format!("'{}'", cell.replace('\'', "''"))),
    }
}

/// Builds the DDL statements that start a load.
///
/// Replace mode drops and recreates the table; append mode only creates it
/// when missing.
pub fn create_table_sql(table: &str, columns: &[Column], replace: bool) -> Vec<String> {
    let column_defs: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.ty.sql_type()))
        .collect();
    let defs = column_defs.join(", ");
    let table = quote_ident(table);

    if replace {
        vec![
            format!("DROP TABLE IF EXISTS {table}"),
            format!("CREATE TABLE {table} ({defs})"),
        ]
    } else {
        vec![format!("CREATE TABLE IF NOT EXISTS {table} ({defs})")]
    }
}

/// Builds one multi-row INSERT for a batch of records.
pub fn insert_sql(table: &str, columns: &[Column], batch: &[Vec<String>]) -> Result<String> {
    let column_list: Vec<String> = columns.iter().map(|c| quote_ident(&c.name)).collect();

    let mut values = Vec::with_capacity(batch.len());
    for record in batch {
        if record.len() != columns.len() {
            return Err(VendsumError::ingestion(format!(
                "record has {} fields, expected {}",
                record.len(),
                columns.len()
            )));
        }
        let row: Vec<String> = record
            .iter()
            .zip(columns)
            .map(|(cell, col)| literal(cell, col.ty, &col.name))
            .collect::<Result<_>>()?;
        values.push(format!("({})", row.join(", ")));
    }

    Ok(format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(table),
        column_list.join(", "),
        values.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, ty: ColumnType) -> Column {
        Column {
            name: name.to_string(),
            ty,
        }
    }

    #[test]
    fn test_table_name_sanitization() {
        assert_eq!(table_name_for("purchase_prices"), "purchase_prices");
        assert_eq!(table_name_for("vendor invoice"), "vendor_invoice");
        assert_eq!(table_name_for("sales-2024"), "sales_2024");
        assert_eq!(table_name_for("2024sales"), "_2024sales");
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("VendorNumber"), "\"VendorNumber\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn test_literal_null_and_escaping() {
        assert_eq!(literal("", ColumnType::Text, "c").unwrap(), "NULL");
        assert_eq!(literal("  ", ColumnType::Integer, "c").unwrap(), "NULL");
        assert_eq!(
            literal("O'Brien & Co", ColumnType::Text, "c").unwrap(),
            "'O''Brien & Co'"
        );
    }

    #[test]
    fn test_literal_numeric() {
        assert_eq!(literal("42", ColumnType::Integer, "c").unwrap(), "42");
        assert_eq!(literal("2.5", ColumnType::Float, "c").unwrap(), "2.5");
        assert_eq!(literal("\"750\"", ColumnType::Integer, "c").unwrap(), "750");
    }

    #[test]
    fn test_literal_coercion_failure() {
        let err = literal("abc", ColumnType::Integer, "VendorNumber").unwrap_err();
        assert!(err.to_string().contains("VendorNumber"));
        assert!(literal("1.5", ColumnType::Integer, "c").is_err());
        assert!(literal("abc", ColumnType::Float, "c").is_err());
    }

    #[test]
    fn test_create_table_replace() {
        let cols = vec![
            col("VendorNumber", ColumnType::Integer),
            col("Freight", ColumnType::Float),
        ];
        let stmts = create_table_sql("vendor_invoice", &cols, true);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "DROP TABLE IF EXISTS \"vendor_invoice\"");
        assert_eq!(
            stmts[1],
            "CREATE TABLE \"vendor_invoice\" (\"VendorNumber\" BIGINT, \"Freight\" DOUBLE PRECISION)"
        );
    }

    #[test]
    fn test_create_table_append() {
        let cols = vec![col("Brand", ColumnType::Integer)];
        let stmts = create_table_sql("sales", &cols, false);
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].starts_with("CREATE TABLE IF NOT EXISTS \"sales\""));
    }

    #[test]
    fn test_insert_sql() {
        let cols = vec![
            col("Brand", ColumnType::Integer),
            col("Description", ColumnType::Text),
        ];
        let batch = vec![
            vec!["1".to_string(), "Whiskey".to_string()],
            vec!["2".to_string(), String::new()],
        ];
        let sql = insert_sql("purchases", &cols, &batch).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"purchases\" (\"Brand\", \"Description\") VALUES (1, 'Whiskey'), (2, NULL)"
        );
    }

    #[test]
    fn test_insert_sql_field_count_mismatch() {
        let cols = vec![col("Brand", ColumnType::Integer)];
        let batch = vec![vec!["1".to_string(), "extra".to_string()]];
        let err = insert_sql("purchases", &cols, &batch).unwrap_err();
        assert!(err.to_string().contains("expected 1"));
    }
}
