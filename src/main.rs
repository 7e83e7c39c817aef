//! vendsum - CSV-to-database ingestion and vendor sales summary pipeline.

use tracing::{error, info, warn};
use vendsum::cli::{Cli, Command, IngestArgs, SummarizeArgs};
use vendsum::config::{Config, ConnectionConfig};
use vendsum::db::{self, DatabaseClient};
use vendsum::error::{Result, VendsumError};
use vendsum::ingest::{self, FileOutcome, IngestOptions, WriteMode};
use vendsum::logging;
use vendsum::summary;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Load configuration file
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    // Build connection config with precedence:
    // 1. CLI arguments (highest)
    // 2. Named connection from config
    // 3. Default connection from config
    // 4. Environment variables
    let connection = resolve_connection(&cli, &config)?.ok_or_else(|| {
        VendsumError::config(
            "No database connection configured. Pass --url or set up a config file.",
        )
    })?;

    info!("Connection: {}", connection.display_string());
    let client = db::connect(&connection).await?;

    let result = dispatch(&cli.command, &config, client.as_ref()).await;

    // Close even on the error path
    if let Err(e) = client.close().await {
        warn!("Failed to close database connection: {e}");
    }

    result
}

async fn dispatch(command: &Command, config: &Config, client: &dyn DatabaseClient) -> Result<()> {
    match command {
        Command::Ingest(args) => run_ingest(client, config, args).await,
        Command::Summarize(args) => run_summarize(client, config, args).await,
        Command::Run { ingest, summarize } => {
            run_ingest(client, config, ingest).await?;
            run_summarize(client, config, summarize).await
        }
    }
}

async fn run_ingest(
    client: &dyn DatabaseClient,
    config: &Config,
    args: &IngestArgs,
) -> Result<()> {
    let source_dir = args
        .source_dir
        .clone()
        .or_else(|| config.ingest.source_dir.clone())
        .ok_or_else(|| {
            VendsumError::config("No source directory configured. Pass --source-dir.")
        })?;

    let options = IngestOptions {
        batch_size: args.batch_size.unwrap_or(config.ingest.batch_size),
        mode: if args.append {
            WriteMode::Append
        } else {
            WriteMode::Replace
        },
    };

    let reports = ingest::ingest_directory(client, &source_dir, &options).await?;

    let loaded = reports
        .iter()
        .filter(|r| matches!(r.outcome, FileOutcome::Loaded { .. }))
        .count();
    println!("Ingested {loaded}/{} file(s)", reports.len());
    for report in &reports {
        match &report.outcome {
            FileOutcome::Loaded { rows, .. } => {
                println!("  {} -> {} ({rows} rows)", report.path.display(), report.table);
            }
            FileOutcome::Failed { error } => {
                println!("  {} FAILED: {error}", report.path.display());
            }
        }
    }

    Ok(())
}

async fn run_summarize(
    client: &dyn DatabaseClient,
    config: &Config,
    args: &SummarizeArgs,
) -> Result<()> {
    let rows = summary::summarize(client).await?;

    print!("{}", summary::render_table(&rows));

    let csv_path = args.csv_out.clone().or_else(|| config.output.csv_path.clone());
    if let Some(path) = csv_path {
        summary::write_csv(&path, &rows)?;
    }

    if args.persist || config.output.persist_table {
        let table = args
            .summary_table
            .as_deref()
            .unwrap_or(&config.output.summary_table);
        summary::persist_table(client, &rows, table).await?;
    }

    Ok(())
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    // Start with CLI connection config if provided
    let mut connection = cli.to_connection_config()?;

    // If no CLI connection, try named connection from config
    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            connection = config.get_connection(Some(name)).cloned();
            if connection.is_none() {
                return Err(VendsumError::config(format!(
                    "Connection '{}' not found in config file",
                    name
                )));
            }
        }
    }

    // If still no connection, try default from config
    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    // Apply environment variable defaults
    if let Some(ref mut conn) = connection {
        conn.apply_env_defaults();
    }

    Ok(connection)
}
