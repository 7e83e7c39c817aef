//! CSV ingestion: directory scan, per-file batched loading, reports.
//!
//! Each CSV in the source directory is loaded into a like-named table.
//! Batches are transactional, files are not: a failure mid-file rolls back
//! only the current batch, so earlier batches of that file stay committed.
//! Replace mode drops the old table in the first batch, so a failed reload
//! leaves the table partially loaded. Callers must treat ingestion as not
//! atomic across batches.

pub mod infer;
pub mod sql;

use crate::db::DatabaseClient;
use crate::error::{Result, VendsumError};
use crate::ingest::infer::{derive_columns, Column};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// How a load treats an existing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Drop and recreate the table (full refresh). The documented default.
    #[default]
    Replace,
    /// Keep existing rows and append.
    Append,
}

/// Ingestion tuning knobs.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Rows per transactional batch.
    pub batch_size: usize,
    /// Replace or append semantics.
    pub mode: WriteMode,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            batch_size: crate::config::DEFAULT_BATCH_SIZE,
            mode: WriteMode::Replace,
        }
    }
}

/// One file to load into one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestJob {
    pub path: PathBuf,
    pub table: String,
}

impl IngestJob {
    /// Creates a job for a CSV path, deriving the table name from the
    /// file's base name.
    pub fn for_path(path: PathBuf) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        let table = sql::table_name_for(stem);
        if table.is_empty() {
            return None;
        }
        Some(Self { path, table })
    }
}

/// Result of a successful single-file load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub table: String,
    pub rows: u64,
    pub batches: u64,
}

/// Outcome of one file in a directory run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Loaded { rows: u64, batches: u64 },
    Failed { error: String },
}

/// Per-file report from `ingest_directory`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub table: String,
    pub outcome: FileOutcome,
}

/// Scans a directory for CSV files and produces an explicit job list,
/// sorted by table name for deterministic processing order.
pub fn discover_jobs(dir: &Path) -> Result<Vec<IngestJob>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        VendsumError::ingestion(format!("Failed to read directory {}: {e}", dir.display()))
    })?;

    let mut jobs = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| VendsumError::ingestion(format!("Failed to read directory entry: {e}")))?;
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if !is_csv || !path.is_file() {
            continue;
        }
        if let Some(job) = IngestJob::for_path(path) {
            jobs.push(job);
        }
    }

    jobs.sort_by(|a, b| a.table.cmp(&b.table));
    Ok(jobs)
}

/// Loads one CSV file into its table in fixed-size transactional batches.
///
/// Column types are inferred from the first batch. The first batch also
/// carries the DDL (drop/create for replace mode), so an empty file still
/// produces an empty table with TEXT columns.
pub async fn ingest_file(
    client: &dyn DatabaseClient,
    job: &IngestJob,
    options: &IngestOptions,
) -> Result<IngestReport> {
    let file_ctx = |e: String| VendsumError::ingestion(format!("{}: {e}", job.path.display()));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(&job.path)
        .map_err(|e| file_ctx(e.to_string()))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| file_ctx(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let batch_size = options.batch_size.max(1);
    let mut columns: Option<Vec<Column>> = None;
    let mut batch: Vec<Vec<String>> = Vec::with_capacity(batch_size);
    let mut rows: u64 = 0;
    let mut batches: u64 = 0;
    let mut done = false;

    let mut records = reader.records();
    while !done {
        while batch.len() < batch_size {
            match records.next() {
                Some(record) => {
                    let record = record.map_err(|e| file_ctx(e.to_string()))?;
                    batch.push(record.iter().map(|f| f.to_string()).collect());
                }
                None => {
                    done = true;
                    break;
                }
            }
        }

        let first_flush = columns.is_none();
        if first_flush {
            columns = Some(derive_columns(&job.table, &headers, &batch)?);
        }
        let cols = columns.as_ref().expect("columns derived on first flush");

        let mut statements = Vec::new();
        if first_flush {
            statements.extend(sql::create_table_sql(
                &job.table,
                cols,
                options.mode == WriteMode::Replace,
            ));
        }
        if !batch.is_empty() {
            statements.push(sql::insert_sql(&job.table, cols, &batch)?);
        }

        if !statements.is_empty() {
            client
                .execute_transaction(&statements)
                .await
                .map_err(|e| file_ctx(e.to_string()))?;
            rows += batch.len() as u64;
            batches += 1;
            batch.clear();
        }
    }

    info!(
        table = %job.table,
        rows,
        batches,
        "Done: {}",
        job.path.display()
    );

    Ok(IngestReport {
        table: job.table.clone(),
        rows,
        batches,
    })
}

/// Loads every CSV in a directory. Failures are contained per file: the
/// failing batch is rolled back, the error is logged, and the next file
/// proceeds.
pub async fn ingest_directory(
    client: &dyn DatabaseClient,
    dir: &Path,
    options: &IngestOptions,
) -> Result<Vec<FileReport>> {
    let jobs = discover_jobs(dir)?;
    info!("Found {} CSV file(s) in {}", jobs.len(), dir.display());

    let mut reports = Vec::with_capacity(jobs.len());
    for job in &jobs {
        info!("Uploading: {}", job.path.display());
        let outcome = match ingest_file(client, job, options).await {
            Ok(report) => FileOutcome::Loaded {
                rows: report.rows,
                batches: report.batches,
            },
            Err(e) => {
                error!("Error with {}: {e}", job.path.display());
                FileOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        reports.push(FileReport {
            path: job.path.clone(),
            table: job.table.clone(),
            outcome,
        });
    }

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FailingDatabaseClient, MockDatabaseClient};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_discover_jobs_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "sales.csv", "a\n1\n");
        write_csv(&dir, "purchases.CSV", "a\n1\n");
        write_csv(&dir, "notes.txt", "ignore me");

        let jobs = discover_jobs(dir.path()).unwrap();
        let tables: Vec<&str> = jobs.iter().map(|j| j.table.as_str()).collect();
        assert_eq!(tables, vec!["purchases", "sales"]);
    }

    #[test]
    fn test_discover_jobs_missing_dir() {
        let result = discover_jobs(Path::new("/nonexistent/source/dir"));
        assert!(result.is_err());
    }

    #[test]
    fn test_job_table_name_from_stem() {
        let job = IngestJob::for_path(PathBuf::from("/data/vendor invoice.csv")).unwrap();
        assert_eq!(job.table, "vendor_invoice");
    }

    #[tokio::test]
    async fn test_ingest_file_replace_emits_ddl_then_inserts() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "vendor_invoice.csv",
            "VendorNumber,Freight\n1,50.0\n2,30.5\n",
        );
        let job = IngestJob::for_path(path).unwrap();
        let client = MockDatabaseClient::new();

        let report = ingest_file(&client, &job, &IngestOptions::default())
            .await
            .unwrap();
        assert_eq!(report.rows, 2);
        assert_eq!(report.batches, 1);

        let executed = client.executed();
        assert_eq!(executed.len(), 3);
        assert_eq!(executed[0], "DROP TABLE IF EXISTS \"vendor_invoice\"");
        assert!(executed[1].starts_with("CREATE TABLE \"vendor_invoice\""));
        assert!(executed[2].starts_with("INSERT INTO \"vendor_invoice\""));
    }

    #[tokio::test]
    async fn test_ingest_file_append_mode() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "sales.csv", "Brand\n1\n");
        let job = IngestJob::for_path(path).unwrap();
        let client = MockDatabaseClient::new();

        let options = IngestOptions {
            mode: WriteMode::Append,
            ..Default::default()
        };
        ingest_file(&client, &job, &options).await.unwrap();

        let executed = client.executed();
        assert!(executed[0].starts_with("CREATE TABLE IF NOT EXISTS"));
        assert!(!executed.iter().any(|s| s.starts_with("DROP TABLE")));
    }

    #[tokio::test]
    async fn test_ingest_file_batching() {
        let dir = TempDir::new().unwrap();
        let mut content = String::from("Brand\n");
        for i in 0..5 {
            content.push_str(&format!("{i}\n"));
        }
        let path = write_csv(&dir, "sales.csv", &content);
        let job = IngestJob::for_path(path).unwrap();
        let client = MockDatabaseClient::new();

        let options = IngestOptions {
            batch_size: 2,
            mode: WriteMode::Replace,
        };
        let report = ingest_file(&client, &job, &options).await.unwrap();
        assert_eq!(report.rows, 5);
        assert_eq!(report.batches, 3);

        // DDL only in the first batch
        let executed = client.executed();
        let inserts = executed.iter().filter(|s| s.starts_with("INSERT")).count();
        let drops = executed.iter().filter(|s| s.starts_with("DROP")).count();
        assert_eq!(inserts, 3);
        assert_eq!(drops, 1);
    }

    #[tokio::test]
    async fn test_ingest_empty_file_creates_empty_table() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "empty.csv", "A,B\n");
        let job = IngestJob::for_path(path).unwrap();
        let client = MockDatabaseClient::new();

        let report = ingest_file(&client, &job, &IngestOptions::default())
            .await
            .unwrap();
        assert_eq!(report.rows, 0);

        let executed = client.executed();
        assert!(executed
            .iter()
            .any(|s| s.contains("CREATE TABLE \"empty\" (\"A\" TEXT, \"B\" TEXT)")));
    }

    #[tokio::test]
    async fn test_ingest_file_malformed_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "bad.csv", "A,B\n1,2\n3,4,5\n");
        let job = IngestJob::for_path(path).unwrap();
        let client = MockDatabaseClient::new();

        let result = ingest_file(&client, &job, &IngestOptions::default()).await;
        assert!(matches!(result, Err(VendsumError::Ingestion(_))));
    }

    #[tokio::test]
    async fn test_directory_failure_is_contained_per_file() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "bad.csv", "A,B\n1,2\n3,4,5\n");
        write_csv(&dir, "good.csv", "A\n1\n2\n");
        let client = MockDatabaseClient::new();

        let reports = ingest_directory(&client, dir.path(), &IngestOptions::default())
            .await
            .unwrap();
        assert_eq!(reports.len(), 2);

        assert!(matches!(reports[0].outcome, FileOutcome::Failed { .. }));
        assert_eq!(
            reports[1].outcome,
            FileOutcome::Loaded { rows: 2, batches: 1 }
        );
    }

    #[tokio::test]
    async fn test_directory_continues_past_database_failures() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "one.csv", "A\n1\n");
        write_csv(&dir, "two.csv", "A\n2\n");
        let client = FailingDatabaseClient::new();

        let reports = ingest_directory(&client, dir.path(), &IngestOptions::default())
            .await
            .unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports
            .iter()
            .all(|r| matches!(r.outcome, FileOutcome::Failed { .. })));
    }
}
