//! Mock database clients for testing.
//!
//! `MockDatabaseClient` records every statement it is handed and serves a
//! canned query result; `FailingDatabaseClient` fails every operation. Both
//! exercise pipeline error handling without a real database.

use super::{DatabaseClient, QueryResult};
use crate::error::{Result, VendsumError};
use async_trait::async_trait;
use std::sync::Mutex;

/// A mock database client that records executed SQL.
#[derive(Default)]
pub struct MockDatabaseClient {
    executed: Mutex<Vec<String>>,
    canned_result: Option<QueryResult>,
}

impl MockDatabaseClient {
    /// Creates a new mock client with an empty canned result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock client that returns the given result from `fetch`.
    pub fn with_result(result: QueryResult) -> Self {
        Self {
            executed: Mutex::new(Vec::new()),
            canned_result: Some(result),
        }
    }

    /// Returns a copy of every statement executed so far.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute(&self, sql: &str) -> Result<u64> {
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(0)
    }

    async fn execute_transaction(&self, statements: &[String]) -> Result<u64> {
        let mut executed = self.executed.lock().unwrap();
        for sql in statements {
            executed.push(sql.clone());
        }
        Ok(statements.len() as u64)
    }

    async fn fetch(&self, sql: &str) -> Result<QueryResult> {
        self.executed.lock().unwrap().push(sql.to_string());
        Ok(self.canned_result.clone().unwrap_or_default())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A client that fails every operation with a query error.
#[derive(Default)]
pub struct FailingDatabaseClient;

impl FailingDatabaseClient {
    /// Creates a new failing client.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute(&self, _sql: &str) -> Result<u64> {
        Err(VendsumError::query("simulated database failure"))
    }

    async fn execute_transaction(&self, _statements: &[String]) -> Result<u64> {
        Err(VendsumError::query("simulated database failure"))
    }

    async fn fetch(&self, _sql: &str) -> Result<QueryResult> {
        Err(VendsumError::query("simulated database failure"))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
