//! vendsum - CSV-to-database ingestion and vendor sales summary pipeline.
//!
//! This library exposes the core modules for use in integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod summary;
