//! Vendor sales summarization: aggregation query plus enrichment.

pub mod enrich;
pub mod output;
pub mod query;

pub use enrich::{enrich, VendorSummaryRow};
pub use output::{persist_table, render_table, write_csv};
pub use query::{fetch_vendor_summary, VENDOR_SUMMARY_SQL};

use crate::db::DatabaseClient;
use crate::error::Result;

/// Runs the full summarization step: aggregation query, then enrichment.
///
/// Query failures propagate; there is nothing to summarize without the
/// aggregation result.
pub async fn summarize(client: &dyn DatabaseClient) -> Result<Vec<VendorSummaryRow>> {
    let raw = fetch_vendor_summary(client).await?;
    enrich(&raw)
}
