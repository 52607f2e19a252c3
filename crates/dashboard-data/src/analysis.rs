//! Summary metrics and the dashboard pipeline.
//!
//! [`build_dashboard`] computes the headline [`Summary`] and every
//! aggregation view from one loaded table, producing the [`DashboardData`]
//! snapshot that the UI renders and the exporter writes out.

use std::path::Path;
use std::thread::ScopedJoinHandle;
use std::time::Instant;

use chrono::Utc;
use dashboard_core::error::LoadError;
use dashboard_core::models::Table;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator::{
    monthly_profit_by_region, product_export, product_performance, product_sales_distribution,
    profit_funnel, profit_hierarchy, sales_by_period, sales_by_region, sales_by_region_city,
    sales_by_retailer, sales_units_by_state, AggregateRow, AggregateTable, KeyValue, MeasureValue,
};
use crate::reader;

// ── Public types ──────────────────────────────────────────────────────────────

/// Headline metrics over the whole table.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total_units: u64,
    pub total_sales: f64,
    pub total_profit: f64,
    /// Number of transactions, including rows with an unparsed date.
    pub transaction_count: usize,
    /// Number of cells replaced while loading.
    pub warning_count: usize,
}

impl Summary {
    /// Sales minus profit.
    pub fn total_costs(&self) -> f64 {
        self.total_sales - self.total_profit
    }
}

/// Metadata produced alongside the dashboard data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetadata {
    /// RFC 3339 timestamp when this snapshot was generated.
    pub generated_at: String,
    /// Source file the table was loaded from.
    pub source: String,
    /// Wall-clock seconds spent reading the source file, `0.0` when the
    /// table was supplied already loaded.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent computing the summary and views.
    pub compute_time_seconds: f64,
}

/// Everything the dashboard shows, derived from one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardData {
    pub summary: Summary,
    pub retailer_sales: AggregateTable,
    pub sales_by_period: AggregateTable,
    pub state_sales: AggregateTable,
    pub region_city_sales: AggregateTable,
    pub region_sales: AggregateTable,
    pub product_performance: AggregateTable,
    pub product_export: AggregateTable,
    pub product_distribution: AggregateTable,
    pub profit_hierarchy: AggregateTable,
    pub profit_funnel: AggregateTable,
    pub monthly_profit: AggregateTable,
    pub waterfall: AggregateTable,
    pub metadata: DashboardMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Compute the headline metrics over every row of `table`.
pub fn summarize(table: &Table) -> Summary {
    let mut summary = Summary {
        transaction_count: table.len(),
        warning_count: table.warning_count(),
        ..Summary::default()
    };
    for t in table.rows() {
        summary.total_units = summary.total_units.saturating_add(t.units_sold);
        summary.total_sales += t.total_sales;
        summary.total_profit += t.operating_profit;
    }
    summary
}

/// Waterfall column names.
pub const WATERFALL_COLUMNS: [&str; 2] = ["Category", "Amount"];

/// Revenue, costs (as a negative step) and resulting profit.
pub fn waterfall(summary: &Summary) -> AggregateTable {
    let step = |label: &str, amount: f64| AggregateRow {
        keys: vec![KeyValue::Text(label.to_string())],
        values: vec![MeasureValue::Amount(amount)],
    };
    AggregateTable::new(
        vec![WATERFALL_COLUMNS[0].to_string()],
        vec![WATERFALL_COLUMNS[1].to_string()],
        vec![
            step("Revenue", summary.total_sales),
            step("Costs", -summary.total_costs()),
            step("Profit", summary.total_profit),
        ],
    )
}

/// Compute the summary and every view for `table`.
///
/// The views only read the table, so they run on scoped threads and are
/// joined before the snapshot is returned.
pub fn build_dashboard(table: &Table) -> DashboardData {
    let start = Instant::now();
    let summary = summarize(table);

    let mut data = std::thread::scope(|s| {
        let retailer_sales = s.spawn(|| sales_by_retailer(table));
        let period_sales = s.spawn(|| sales_by_period(table));
        let state_sales = s.spawn(|| sales_units_by_state(table));
        let region_city_sales = s.spawn(|| sales_by_region_city(table));
        let region_sales = s.spawn(|| sales_by_region(table));
        let products = s.spawn(|| product_performance(table));
        let product_rows = s.spawn(|| product_export(table));
        let distribution = s.spawn(|| product_sales_distribution(table));
        let hierarchy = s.spawn(|| profit_hierarchy(table));
        let funnel = s.spawn(|| profit_funnel(table));
        let monthly = s.spawn(|| monthly_profit_by_region(table));

        DashboardData {
            summary,
            retailer_sales: join(retailer_sales),
            sales_by_period: join(period_sales),
            state_sales: join(state_sales),
            region_city_sales: join(region_city_sales),
            region_sales: join(region_sales),
            product_performance: join(products),
            product_export: join(product_rows),
            product_distribution: join(distribution),
            profit_hierarchy: join(hierarchy),
            profit_funnel: join(funnel),
            monthly_profit: join(monthly),
            waterfall: waterfall(&summary),
            metadata: DashboardMetadata {
                generated_at: Utc::now().to_rfc3339(),
                source: table.source().display().to_string(),
                load_time_seconds: 0.0,
                compute_time_seconds: 0.0,
            },
        }
    });

    let elapsed = start.elapsed().as_secs_f64();
    debug!(
        "Computed dashboard for {} rows in {:.3}s",
        table.len(),
        elapsed
    );

    data.metadata.compute_time_seconds = elapsed;
    data
}

/// Load `path` and build its dashboard in one step.
pub fn analyze_file(path: &Path) -> Result<(Table, DashboardData), LoadError> {
    let load_start = Instant::now();
    let table = reader::load(path)?;
    let load_time = load_start.elapsed().as_secs_f64();

    let mut data = build_dashboard(&table);
    data.metadata.load_time_seconds = load_time;
    Ok((table, data))
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Join a view thread, re-raising its panic on the caller.
fn join<T>(handle: ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
