//! Output sinks for the enriched summary.
//!
//! The summary is always rendered to stdout; CSV export and database
//! persistence are opt-in.

use crate::db::DatabaseClient;
use crate::error::{Result, VendsumError};
use crate::ingest::infer::{Column, ColumnType};
use crate::ingest::sql;
use crate::summary::enrich::VendorSummaryRow;
use std::path::Path;
use tracing::info;

/// Rows shown in the stdout preview.
const PREVIEW_ROWS: usize = 10;

/// Column layout of the persisted/exported summary.
const SUMMARY_COLUMNS: &[(&str, ColumnType)] = &[
    ("VendorNumber", ColumnType::Integer),
    ("VendorName", ColumnType::Text),
    ("Brand", ColumnType::Text),
    ("Description", ColumnType::Text),
    ("PurchasePrice", ColumnType::Float),
    ("Volume", ColumnType::Float),
    ("ActualPrice", ColumnType::Float),
    ("TotalPurchaseQuantity", ColumnType::Float),
    ("TotalPurchaseDollars", ColumnType::Float),
    ("TotalSalesQuantity", ColumnType::Float),
    ("TotalSalesDollars", ColumnType::Float),
    ("TotalSalesPrice", ColumnType::Float),
    ("TotalExciseTax", ColumnType::Float),
    ("FreightCost", ColumnType::Float),
    ("GrossProfit", ColumnType::Float),
    ("ProfitMargin", ColumnType::Float),
    ("StockTurnover", ColumnType::Float),
    ("SalesToPurchaseRatio", ColumnType::Float),
];

/// Columns shown in the stdout preview (the full set is too wide for a
/// terminal).
const PREVIEW_COLUMNS: &[&str] = &[
    "VendorNumber",
    "VendorName",
    "Brand",
    "TotalPurchaseDollars",
    "TotalSalesDollars",
    "GrossProfit",
    "ProfitMargin",
    "StockTurnover",
    "SalesToPurchaseRatio",
];

/// Renders a preview of the summary as an aligned text table.
pub fn render_table(rows: &[VendorSummaryRow]) -> String {
    let header: Vec<String> = PREVIEW_COLUMNS.iter().map(|s| s.to_string()).collect();
    let mut body: Vec<Vec<String>> = Vec::new();

    for row in rows.iter().take(PREVIEW_ROWS) {
        body.push(vec![
            row.vendor_number.to_string(),
            row.vendor_name.clone(),
            row.brand.clone(),
            format_num(row.total_purchase_dollars),
            format_num(row.total_sales_dollars),
            format_num(row.gross_profit),
            format_num(row.profit_margin),
            format_num(row.stock_turnover),
            format_num(row.sales_to_purchase_ratio),
        ]);
    }

    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in &body {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let render_row = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{:<width$}", c, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&render_row(&header));
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * (widths.len() - 1)));
    out.push('\n');
    for row in &body {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&format!("({} row(s) total)\n", rows.len()));
    out
}

/// Writes the full summary to a CSV file.
pub fn write_csv(path: &Path, rows: &[VendorSummaryRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| {
        VendsumError::internal(format!("Failed to create {}: {e}", path.display()))
    })?;

    for row in rows {
        writer.serialize(row).map_err(|e| {
            VendsumError::internal(format!("Failed to write {}: {e}", path.display()))
        })?;
    }

    writer
        .flush()
        .map_err(|e| VendsumError::internal(format!("Failed to write {}: {e}", path.display())))?;

    info!("Wrote {} row(s) to {}", rows.len(), path.display());
    Ok(())
}

/// Replaces `table` in the database with the enriched summary.
pub async fn persist_table(
    client: &dyn DatabaseClient,
    rows: &[VendorSummaryRow],
    table: &str,
) -> Result<()> {
    let columns: Vec<Column> = SUMMARY_COLUMNS
        .iter()
        .map(|(name, ty)| Column {
            name: name.to_string(),
            ty: *ty,
        })
        .collect();

    let mut statements = sql::create_table_sql(table, &columns, true);
    for chunk in rows.chunks(crate::config::DEFAULT_BATCH_SIZE) {
        let records: Vec<Vec<String>> = chunk.iter().map(record_for).collect();
        statements.push(sql::insert_sql(table, &columns, &records)?);
    }

    client.execute_transaction(&statements).await?;
    info!("Persisted {} row(s) to table `{table}`", rows.len());
    Ok(())
}

/// Stringifies a row in SUMMARY_COLUMNS order for the SQL builders.
fn record_for(row: &VendorSummaryRow) -> Vec<String> {
    vec![
        row.vendor_number.to_string(),
        row.vendor_name.clone(),
        row.brand.clone(),
        row.description.clone(),
        row.purchase_price.to_string(),
        row.volume.to_string(),
        row.actual_price.to_string(),
        row.total_purchase_quantity.to_string(),
        row.total_purchase_dollars.to_string(),
        row.total_sales_quantity.to_string(),
        row.total_sales_dollars.to_string(),
        row.total_sales_price.to_string(),
        row.total_excise_tax.to_string(),
        row.freight_cost.to_string(),
        row.gross_profit.to_string(),
        row.profit_margin.to_string(),
        row.stock_turnover.to_string(),
        row.sales_to_purchase_ratio.to_string(),
    ]
}

fn format_num(v: f64) -> String {
    if v == v.trunc() {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}
