//! The vendor summary aggregation query.
//!
//! One version-controlled SQL artifact staging purchases, sales, and
//! freight through CTEs before the final join. The query itself does not
//! coalesce nulls; unmatched sales/freight rows come back NULL and are
//! zero-filled by the enrichment layer.

use crate::db::{DatabaseClient, QueryResult};
use crate::error::Result;
use tracing::info;

/// Aggregates purchases, sales, and freight into one row per
/// (VendorNumber, Brand), ordered by total purchase dollars descending.
///
/// Rows with non-positive purchase price are excluded from the purchase
/// summary and therefore from the final result.
pub const VENDOR_SUMMARY_SQL: &str = r#"
WITH freight_summary AS (
    SELECT "VendorNumber", SUM("Freight") AS "FreightCost"
    FROM "vendor_invoice"
    GROUP BY "VendorNumber"
),

purchase_summary AS (
    SELECT
        p."VendorNumber",
        p."VendorName",
        p."Brand",
        p."Description",
        p."PurchasePrice",
        pp."Volume",
        pp."Price" AS "ActualPrice",
        SUM(p."Quantity") AS "TotalPurchaseQuantity",
        SUM(p."Dollars") AS "TotalPurchaseDollars"
    FROM "purchases" p
    JOIN "purchase_prices" pp ON p."Brand" = pp."Brand"
    WHERE p."PurchasePrice" > 0
    GROUP BY p."VendorNumber", p."VendorName", p."Brand", p."Description",
             p."PurchasePrice", pp."Volume", pp."Price"
),

sales_summary AS (
    SELECT
        "VendorNo",
        "Brand",
        SUM("SalesDollars") AS "TotalSalesDollars",
        SUM("SalesPrice") AS "TotalSalesPrice",
        SUM("SalesQuantity") AS "TotalSalesQuantity",
        SUM("ExciseTax") AS "TotalExciseTax"
    FROM "sales"
    GROUP BY "VendorNo", "Brand"
)

SELECT
    ps."VendorNumber",
    ps."VendorName",
    ps."Brand",
    ps."Description",
    ps."PurchasePrice",
    ps."Volume",
    ps."ActualPrice",
    ps."TotalPurchaseQuantity",
    ps."TotalPurchaseDollars",
    ss."TotalSalesQuantity",
    ss."TotalSalesDollars",
    ss."TotalSalesPrice",
    ss."TotalExciseTax",
    fs."FreightCost"
FROM purchase_summary ps
LEFT JOIN sales_summary ss
    ON ps."VendorNumber" = ss."VendorNo" AND ps."Brand" = ss."Brand"
LEFT JOIN freight_summary fs
    ON ps."VendorNumber" = fs."VendorNumber"
ORDER BY ps."TotalPurchaseDollars" DESC
"#;

/// Runs the aggregation query against the ingested base tables.
///
/// A failure here (missing table, connectivity loss) is not recovered:
/// no downstream result can be produced without the aggregation.
pub async fn fetch_vendor_summary(client: &dyn DatabaseClient) -> Result<QueryResult> {
    let result = client.fetch(VENDOR_SUMMARY_SQL).await?;
    info!("Vendor summary query returned {} row(s)", result.row_count);
    Ok(result)
}
