//! CSV export of aggregated views and of the full dataset.
//!
//! Output is UTF-8 with a header row, `,` separators and `\n` line endings,
//! and is byte-for-byte reproducible for the same input.

use std::path::{Path, PathBuf};

use dashboard_core::error::{DashboardError, Result};
use dashboard_core::models::{Field, Table, COL_PERIOD};
use tracing::info;

use crate::aggregator::{AggregateTable, MeasureValue};
use crate::analysis::DashboardData;

/// Date format of the `InvoiceDate` column in the full-data export.
const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d";

// ── Export kinds ──────────────────────────────────────────────────────────────

/// Every CSV download the dashboard offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    RetailerSales,
    ProductPerformance,
    FullData,
    ProfitWaterfall,
    ProfitHierarchy,
    ProfitFunnel,
    MonthlyProfitTrends,
}

impl ExportKind {
    pub const ALL: [ExportKind; 7] = [
        ExportKind::RetailerSales,
        ExportKind::ProductPerformance,
        ExportKind::FullData,
        ExportKind::ProfitWaterfall,
        ExportKind::ProfitHierarchy,
        ExportKind::ProfitFunnel,
        ExportKind::MonthlyProfitTrends,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            ExportKind::RetailerSales => "retailer_sales.csv",
            ExportKind::ProductPerformance => "product_performance.csv",
            ExportKind::FullData => "adidas_full_data.csv",
            ExportKind::ProfitWaterfall => "profit_waterfall.csv",
            ExportKind::ProfitHierarchy => "profit_hierarchy.csv",
            ExportKind::ProfitFunnel => "profit_funnel.csv",
            ExportKind::MonthlyProfitTrends => "monthly_profit_trends.csv",
        }
    }

    /// Human-readable label for menus and status lines.
    pub fn title(self) -> &'static str {
        match self {
            ExportKind::RetailerSales => "Retailer Sales",
            ExportKind::ProductPerformance => "Product Data",
            ExportKind::FullData => "Full Dataset",
            ExportKind::ProfitWaterfall => "Waterfall Data",
            ExportKind::ProfitHierarchy => "Sunburst Data",
            ExportKind::ProfitFunnel => "Funnel Data",
            ExportKind::MonthlyProfitTrends => "Line Chart Data",
        }
    }

    /// Encode this export from a dashboard snapshot and its table.
    pub fn to_bytes(self, data: &DashboardData, table: &Table) -> Result<Vec<u8>> {
        match self {
            ExportKind::RetailerSales => to_csv_bytes(&data.retailer_sales),
            ExportKind::ProductPerformance => to_csv_bytes(&data.product_export),
            ExportKind::FullData => dataset_to_csv_bytes(table),
            ExportKind::ProfitWaterfall => to_csv_bytes(&data.waterfall),
            ExportKind::ProfitHierarchy => to_csv_bytes(&data.profit_hierarchy),
            ExportKind::ProfitFunnel => to_csv_bytes(&data.profit_funnel),
            ExportKind::MonthlyProfitTrends => to_csv_bytes(&data.monthly_profit),
        }
    }
}

// ── Encoding ──────────────────────────────────────────────────────────────────

fn writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .delimiter(b',')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| DashboardError::Csv(e.to_string()))
}

fn csv_err(e: csv::Error) -> DashboardError {
    DashboardError::Csv(e.to_string())
}

/// Encode an aggregated view: header row, then one line per row with keys
/// followed by values. No index column.
pub fn to_csv_bytes(view: &AggregateTable) -> Result<Vec<u8>> {
    let mut w = writer();
    w.write_record(view.column_names()).map_err(csv_err)?;
    for row in view.rows() {
        let record = row
            .keys
            .iter()
            .map(ToString::to_string)
            .chain(row.values.iter().map(ToString::to_string));
        w.write_record(record).map_err(csv_err)?;
    }
    finish(w)
}

fn field_text(field: Option<Field<'_>>) -> String {
    match field {
        Some(Field::Text(s)) => s.to_string(),
        Some(Field::Date(d)) => d
            .map(|d| d.format(EXPORT_DATE_FORMAT).to_string())
            .unwrap_or_default(),
        Some(Field::Units(n)) => MeasureValue::Integer(n).to_string(),
        Some(Field::Amount(a)) => MeasureValue::Amount(a).to_string(),
        None => String::new(),
    }
}

/// Encode every transaction: columns in source header order, then the
/// derived `Month_Year`. Unparsed dates and periods are left empty.
pub fn dataset_to_csv_bytes(table: &Table) -> Result<Vec<u8>> {
    let mut w = writer();

    let header = table
        .columns()
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(COL_PERIOD));
    w.write_record(header).map_err(csv_err)?;

    for t in table.rows() {
        let period = if t.period.is_unparsed() {
            String::new()
        } else {
            t.period.label()
        };

        let mut record: Vec<String> = table
            .columns()
            .iter()
            .map(|c| field_text(table.field(t, c)))
            .collect();
        record.push(period);
        w.write_record(&record).map_err(csv_err)?;
    }

    finish(w)
}

// ── Writing files ─────────────────────────────────────────────────────────────

/// Write one export into `dir`, creating the directory if needed.
pub fn export_one(
    kind: ExportKind,
    data: &DashboardData,
    table: &Table,
    dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|source| DashboardError::FileWrite {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(kind.file_name());
    let bytes = kind.to_bytes(data, table)?;
    std::fs::write(&path, bytes).map_err(|source| DashboardError::FileWrite {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Write every [`ExportKind`] into `dir` and return the written paths in
/// [`ExportKind::ALL`] order.
pub fn export_all(data: &DashboardData, table: &Table, dir: &Path) -> Result<Vec<PathBuf>> {
    let paths = ExportKind::ALL
        .iter()
        .map(|kind| export_one(*kind, data, table, dir))
        .collect::<Result<Vec<_>>>()?;
    info!("Exported {} CSV files to {}", paths.len(), dir.display());
    Ok(paths)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{profit_funnel, sales_by_retailer};
    use crate::analysis::build_dashboard;
    use chrono::NaiveDate;
    use dashboard_core::models::Transaction;
    use dashboard_core::period::Period;
    use tempfile::TempDir;

    fn tx(retailer: &str, region: &str, date: Option<NaiveDate>, sales: f64, profit: f64) -> Transaction {
        Transaction {
            retailer: retailer.to_string(),
            region: region.to_string(),
            state: "New York".to_string(),
            city: "New York".to_string(),
            product: "Men's Apparel".to_string(),
            invoice_date: date,
            units_sold: 3,
            total_sales: sales,
            operating_profit: profit,
            period: Period::from_date(date),
            extra: vec!["In-store".to_string()],
        }
    }

    fn scenario() -> Table {
        Table::new(
            "sales.xlsx",
            vec!["SalesMethod".to_string()],
            vec![
                tx("RetailerA", "East", NaiveDate::from_ymd_opt(2023, 1, 5), 100.0, 20.0),
                tx("RetailerA", "East", NaiveDate::from_ymd_opt(2023, 1, 20), 50.0, 5.0),
                tx("RetailerB", "West", None, 200.0, 40.5),
            ],
            vec![],
        )
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_retailer_sales_csv() {
        let csv = text(to_csv_bytes(&sales_by_retailer(&scenario())).unwrap());
        assert_eq!(csv, "Retailer,TotalSales\nRetailerA,150.0\nRetailerB,200.0\n");
    }

    #[test]
    fn test_funnel_csv_keeps_funnel_order() {
        let csv = text(to_csv_bytes(&profit_funnel(&scenario())).unwrap());
        assert_eq!(csv, "Region,OperatingProfit\nEast,25.0\nWest,40.5\n");
    }

    #[test]
    fn test_csv_is_reproducible() {
        let view = sales_by_retailer(&scenario());
        assert_eq!(to_csv_bytes(&view).unwrap(), to_csv_bytes(&view).unwrap());
    }

    #[test]
    fn test_empty_view_writes_header_only() {
        let csv = text(to_csv_bytes(&sales_by_retailer(&Table::empty())).unwrap());
        assert_eq!(csv, "Retailer,TotalSales\n");
    }

    #[test]
    fn test_dataset_csv() {
        let csv = text(dataset_to_csv_bytes(&scenario()).unwrap());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Retailer,Region,State,City,Product,InvoiceDate,UnitsSold,TotalSales,OperatingProfit,SalesMethod,Month_Year"
        );
        assert_eq!(
            lines[1],
            "RetailerA,East,New York,New York,Men's Apparel,2023-01-05,3,100.0,20.0,In-store,Jan'23"
        );
        assert_eq!(
            lines[3],
            "RetailerB,West,New York,New York,Men's Apparel,,3,200.0,40.5,In-store,"
        );
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_dataset_csv_keeps_source_column_order() {
        let order = [
            "SalesMethod", "Retailer", "Region", "State", "City", "Product", "InvoiceDate",
            "UnitsSold", "TotalSales", "OperatingProfit",
        ];
        let table = scenario().with_column_order(order.iter().map(|c| c.to_string()).collect());
        let csv = text(dataset_to_csv_bytes(&table).unwrap());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "SalesMethod,Retailer,Region,State,City,Product,InvoiceDate,UnitsSold,TotalSales,OperatingProfit,Month_Year"
        );
        assert_eq!(
            lines[1],
            "In-store,RetailerA,East,New York,New York,Men's Apparel,2023-01-05,3,100.0,20.0,Jan'23"
        );
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let mut row = tx("Foot Locker, Inc.", "East", None, 1.0, 1.0);
        row.extra.clear();
        let table = Table::new("x.csv", vec![], vec![row], vec![]);
        let csv = text(to_csv_bytes(&sales_by_retailer(&table)).unwrap());
        assert_eq!(csv, "Retailer,TotalSales\n\"Foot Locker, Inc.\",1.0\n");
    }

    #[test]
    fn test_export_kind_file_names_unique() {
        let mut names: Vec<_> = ExportKind::ALL.iter().map(|k| k.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ExportKind::ALL.len());
    }

    #[test]
    fn test_export_all_writes_every_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("exports");
        let table = scenario();
        let data = build_dashboard(&table);

        let paths = export_all(&data, &table, &out).unwrap();
        assert_eq!(paths.len(), ExportKind::ALL.len());
        for (path, kind) in paths.iter().zip(ExportKind::ALL) {
            assert_eq!(path.file_name().unwrap(), kind.file_name());
            assert!(path.exists());
        }
        assert!(out.join("adidas_full_data.csv").exists());

        let waterfall = std::fs::read_to_string(out.join("profit_waterfall.csv")).unwrap();
        assert_eq!(
            waterfall,
            "Category,Amount\nRevenue,350.0\nCosts,-284.5\nProfit,65.5\n"
        );
        let products = std::fs::read_to_string(out.join("product_performance.csv")).unwrap();
        assert_eq!(products, "Product,TotalSales,UnitsSold\nMen's Apparel,350.0,9\n");
    }

    #[test]
    fn test_export_to_unwritable_dir_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let table = scenario();
        let data = build_dashboard(&table);
        let err = export_all(&data, &table, &blocker.join("sub")).unwrap_err();
        assert!(matches!(err, DashboardError::FileWrite { .. }));
    }
}
