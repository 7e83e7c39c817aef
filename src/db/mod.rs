//! Database abstraction layer for vendsum.
//!
//! Provides a trait-based interface for database operations, allowing
//! different database backends to be used interchangeably.

mod mock;
mod postgres;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a string for persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Returns the default port for this backend. SQLite is file-based,
    /// so the port is never used.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::Sqlite => 0,
        }
    }

    /// Returns the URL scheme for this backend.
    pub fn url_scheme(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Creates a database client for the given backend and configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    match config.backend {
        DatabaseBackend::Postgres => {
            let client = PostgresClient::connect(config).await?;
            Ok(Box::new(client))
        }
        DatabaseBackend::Sqlite => {
            let client = SqliteClient::connect(config).await?;
            Ok(Box::new(client))
        }
    }
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with VendsumError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a single statement, returning the number of affected rows.
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Executes the statements inside one transaction, rolling back on the
    /// first failure. Returns the total number of affected rows.
    async fn execute_transaction(&self, statements: &[String]) -> Result<u64>;

    /// Executes a SQL query and returns the results.
    async fn fetch(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_roundtrip() {
        assert_eq!(DatabaseBackend::parse("postgres"), Some(DatabaseBackend::Postgres));
        assert_eq!(DatabaseBackend::parse("postgresql"), Some(DatabaseBackend::Postgres));
        assert_eq!(DatabaseBackend::parse("sqlite"), Some(DatabaseBackend::Sqlite));
        assert_eq!(DatabaseBackend::parse("SQLite3"), Some(DatabaseBackend::Sqlite));
        assert_eq!(DatabaseBackend::parse("mysql"), None);

        assert_eq!(DatabaseBackend::Postgres.as_str(), "postgres");
        assert_eq!(DatabaseBackend::Sqlite.as_str(), "sqlite");
    }

    #[test]
    fn test_backend_defaults() {
        assert_eq!(DatabaseBackend::default(), DatabaseBackend::Postgres);
        assert_eq!(DatabaseBackend::Postgres.default_port(), 5432);
        assert_eq!(DatabaseBackend::Postgres.url_scheme(), "postgres");
        assert_eq!(DatabaseBackend::Sqlite.url_scheme(), "sqlite");
    }
}
