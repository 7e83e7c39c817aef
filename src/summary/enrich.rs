//! Column-level enrichment of the raw aggregation result.
//!
//! A pure function of its input: coerce Volume to a float, zero-fill
//! nulls, trim vendor/description text, derive the four KPIs, and squash
//! any non-finite arithmetic result to zero.

use crate::db::{QueryResult, Value};
use crate::error::{Result, VendsumError};
use serde::Serialize;

/// One enriched row of the vendor sales summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VendorSummaryRow {
    pub vendor_number: i64,
    pub vendor_name: String,
    pub brand: String,
    pub description: String,
    pub purchase_price: f64,
    pub volume: f64,
    pub actual_price: f64,
    pub total_purchase_quantity: f64,
    pub total_purchase_dollars: f64,
    pub total_sales_quantity: f64,
    pub total_sales_dollars: f64,
    pub total_sales_price: f64,
    pub total_excise_tax: f64,
    pub freight_cost: f64,
    pub gross_profit: f64,
    pub profit_margin: f64,
    pub stock_turnover: f64,
    pub sales_to_purchase_ratio: f64,
}

/// Names of the columns the aggregation query must produce.
const EXPECTED_COLUMNS: &[&str] = &[
    "VendorNumber",
    "VendorName",
    "Brand",
    "Description",
    "PurchasePrice",
    "Volume",
    "ActualPrice",
    "TotalPurchaseQuantity",
    "TotalPurchaseDollars",
    "TotalSalesQuantity",
    "TotalSalesDollars",
    "TotalSalesPrice",
    "TotalExciseTax",
    "FreightCost",
];

/// Enriches the raw aggregation result into typed summary rows.
///
/// Pure: reads only its argument, touches no external state.
pub fn enrich(result: &QueryResult) -> Result<Vec<VendorSummaryRow>> {
    if result.is_empty() {
        return Ok(Vec::new());
    }

    let idx = ColumnMap::resolve(result)?;

    let mut rows = Vec::with_capacity(result.rows.len());
    for (row_no, row) in result.rows.iter().enumerate() {
        rows.push(enrich_row(row, &idx, row_no)?);
    }
    Ok(rows)
}

/// Resolved positions of the expected columns in the result set.
struct ColumnMap {
    indices: [usize; EXPECTED_COLUMNS.len()],
}

impl ColumnMap {
    fn resolve(result: &QueryResult) -> Result<Self> {
        let mut indices = [0usize; EXPECTED_COLUMNS.len()];
        for (slot, name) in EXPECTED_COLUMNS.iter().enumerate() {
            indices[slot] = result.column_index(name).ok_or_else(|| {
                VendsumError::internal(format!("summary result is missing column `{name}`"))
            })?;
        }
        Ok(Self { indices })
    }

    fn get<'a>(&self, row: &'a [Value], name: &str) -> &'a Value {
        let slot = EXPECTED_COLUMNS
            .iter()
            .position(|n| *n == name)
            .expect("name is one of EXPECTED_COLUMNS");
        row.get(self.indices[slot]).unwrap_or(&Value::Null)
    }
}

fn enrich_row(row: &[Value], idx: &ColumnMap, row_no: usize) -> Result<VendorSummaryRow> {
    let number = |name: &str| -> Result<f64> {
        idx.get(row, name).as_f64().ok_or_else(|| {
            VendsumError::internal(format!("row {row_no}: column `{name}` is not numeric"))
        })
    };

    let vendor_number = idx.get(row, "VendorNumber").as_i64().ok_or_else(|| {
        VendsumError::internal(format!("row {row_no}: `VendorNumber` is not an integer"))
    })?;

    let vendor_name = idx.get(row, "VendorName").as_text().trim().to_string();
    let description = idx.get(row, "Description").as_text().trim().to_string();
    let brand = idx.get(row, "Brand").as_text();

    let purchase_price = number("PurchasePrice")?;
    let volume = number("Volume")?;
    let actual_price = number("ActualPrice")?;
    let total_purchase_quantity = number("TotalPurchaseQuantity")?;
    let total_purchase_dollars = number("TotalPurchaseDollars")?;
    let total_sales_quantity = number("TotalSalesQuantity")?;
    let total_sales_dollars = number("TotalSalesDollars")?;
    let total_sales_price = number("TotalSalesPrice")?;
    let total_excise_tax = number("TotalExciseTax")?;
    let freight_cost = number("FreightCost")?;

    let gross_profit = total_sales_dollars - total_purchase_dollars;
    let profit_margin = guarded_div(gross_profit, total_sales_dollars) * 100.0;
    let stock_turnover = guarded_div(total_sales_quantity, total_purchase_quantity);
    let sales_to_purchase_ratio = guarded_div(total_sales_dollars, total_purchase_dollars);

    Ok(VendorSummaryRow {
        vendor_number,
        vendor_name,
        brand,
        description,
        purchase_price: finite(purchase_price),
        volume: finite(volume),
        actual_price: finite(actual_price),
        total_purchase_quantity: finite(total_purchase_quantity),
        total_purchase_dollars: finite(total_purchase_dollars),
        total_sales_quantity: finite(total_sales_quantity),
        total_sales_dollars: finite(total_sales_dollars),
        total_sales_price: finite(total_sales_price),
        total_excise_tax: finite(total_excise_tax),
        freight_cost: finite(freight_cost),
        gross_profit: finite(gross_profit),
        profit_margin: finite(profit_margin),
        stock_turnover: finite(stock_turnover),
        sales_to_purchase_ratio: finite(sales_to_purchase_ratio),
    })
}

/// Division that resolves a zero denominator to zero instead of infinity.
fn guarded_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Squashes NaN and infinities to zero.
fn finite(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
