//! SQLite database client implementation.
//!
//! Backs local runs and the test suite. File databases are created on
//! demand; `:memory:` databases live for the lifetime of the client.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{Result, VendsumError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Row as SqlxRow, TypeInfo};
use std::str::FromStr;

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Opens a client for the configured database file (or `:memory:`).
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        Self::open(&conn_str).await
    }

    /// Opens a client from a sqlx SQLite connection string.
    pub async fn open(conn_str: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(conn_str)
            .map_err(|e| VendsumError::connection(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true);

        // A single never-recycled connection keeps :memory: databases alive
        // across calls.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| VendsumError::connection(format!("Failed to open SQLite: {e}")))?;

        Ok(Self { pool })
    }

    /// Creates a client from an existing pool.
    ///
    /// This is primarily useful for testing.
    #[allow(dead_code)]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let result = sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| VendsumError::query(e.to_string()))?;
        Ok(result.rows_affected())
    }

    async fn execute_transaction(&self, statements: &[String]) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| VendsumError::query(format!("Failed to begin transaction: {e}")))?;

        let mut affected = 0;
        for sql in statements {
            match sqlx::query(sql).execute(&mut *tx).await {
                Ok(result) => affected += result.rows_affected(),
                Err(e) => {
                    // Dropping the transaction rolls back, but be explicit.
                    tx.rollback().await.ok();
                    return Err(VendsumError::query(e.to_string()));
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| VendsumError::query(format!("Failed to commit transaction: {e}")))?;

        Ok(affected)
    }

    async fn fetch(&self, sql: &str) -> Result<QueryResult> {
        let result = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| VendsumError::query(e.to_string()))?;

        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            None => Vec::new(),
        };

        let rows: Vec<Row> = result.iter().map(convert_row).collect();

        Ok(QueryResult::with_data(columns, rows))
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts a single column value from a SqliteRow to our Value type.
///
/// SQLite column affinities are loose (an expression column may carry no
/// declared type at all), so decoding is attempted by value rather than by
/// declared type name.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map(Value::Int).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v.map(Value::Float).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    row.try_get::<Option<String>, _>(index)
        .ok()
        .flatten()
        .map(Value::String)
        .unwrap_or(Value::Null)
}
