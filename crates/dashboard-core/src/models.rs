use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::period::Period;

// ── Column names ──────────────────────────────────────────────────────────────

pub const COL_RETAILER: &str = "Retailer";
pub const COL_REGION: &str = "Region";
pub const COL_STATE: &str = "State";
pub const COL_CITY: &str = "City";
pub const COL_PRODUCT: &str = "Product";
pub const COL_INVOICE_DATE: &str = "InvoiceDate";
pub const COL_UNITS_SOLD: &str = "UnitsSold";
pub const COL_TOTAL_SALES: &str = "TotalSales";
pub const COL_OPERATING_PROFIT: &str = "OperatingProfit";
/// Name of the derived period column in exports.
pub const COL_PERIOD: &str = "Month_Year";

/// Columns every source file must carry, matched exactly.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    COL_RETAILER,
    COL_REGION,
    COL_STATE,
    COL_CITY,
    COL_PRODUCT,
    COL_INVOICE_DATE,
    COL_UNITS_SOLD,
    COL_TOTAL_SALES,
    COL_OPERATING_PROFIT,
];

// ── Transaction ───────────────────────────────────────────────────────────────

/// One row of the source table after normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub retailer: String,
    pub region: String,
    pub state: String,
    pub city: String,
    pub product: String,
    /// `None` when the source cell could not be parsed as a date.
    pub invoice_date: Option<NaiveDate>,
    pub units_sold: u64,
    /// Non-negative monetary amount.
    pub total_sales: f64,
    /// May be negative.
    pub operating_profit: f64,
    /// Derived from `invoice_date`; [`Period::Unparsed`] when it is `None`.
    pub period: Period,
    /// Values of non-required source columns, in [`Table::extra_columns`] order.
    pub extra: Vec<String>,
}

// ── Row warnings ──────────────────────────────────────────────────────────────

/// Why a single cell was replaced by a sentinel during loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Date cell could not be parsed; the period became `Unknown`.
    InvalidDate,
    /// Numeric cell held non-numeric text, or a fractional unit count; zero
    /// was substituted.
    InvalidNumber,
    /// Negative value in a non-negative column.
    NegativeValue,
    /// Numeric cell was blank; zero was substituted.
    MissingValue,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WarningKind::InvalidDate => "invalid date",
            WarningKind::InvalidNumber => "invalid number",
            WarningKind::NegativeValue => "out-of-range value",
            WarningKind::MissingValue => "missing value",
        };
        f.write_str(s)
    }
}

/// Non-fatal, per-cell parse problem recovered in place by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowParseWarning {
    /// 1-based data row (the header row is not counted).
    pub row: usize,
    pub column: String,
    /// Raw cell text as read from the source.
    pub value: String,
    pub kind: WarningKind,
}

impl fmt::Display for RowParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: {} in {} ({:?})",
            self.row, self.kind, self.column, self.value
        )
    }
}

// ── Field ─────────────────────────────────────────────────────────────────────

/// One cell of a [`Transaction`], looked up by column name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    Text(&'a str),
    Date(Option<NaiveDate>),
    Units(u64),
    Amount(f64),
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// The loaded transaction table.
///
/// Constructed once by the loader and read-only afterwards: there is no
/// mutable accessor, and downstream code shares it behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    source: PathBuf,
    extra_columns: Vec<String>,
    /// Required and extra column names in source header order.
    columns: Vec<String>,
    rows: Vec<Transaction>,
    warnings: Vec<RowParseWarning>,
}

impl Table {
    pub fn new(
        source: impl Into<PathBuf>,
        extra_columns: Vec<String>,
        rows: Vec<Transaction>,
        warnings: Vec<RowParseWarning>,
    ) -> Self {
        let columns = REQUIRED_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(extra_columns.iter().cloned())
            .collect();
        Self {
            source: source.into(),
            extra_columns,
            columns,
            rows,
            warnings,
        }
    }

    /// Replace the default column order (required, then extra) with the
    /// order of the source header. Names that are not columns of this table
    /// are dropped, and any column left out is appended.
    pub fn with_column_order(mut self, order: Vec<String>) -> Self {
        let mut columns: Vec<String> = order
            .into_iter()
            .filter(|name| self.columns.contains(name))
            .collect();
        for name in &self.columns {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        self.columns = columns;
        self
    }

    /// An empty table with no source, mostly useful in tests.
    pub fn empty() -> Self {
        Self::new(PathBuf::new(), Vec::new(), Vec::new(), Vec::new())
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn rows(&self) -> &[Transaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Names of the source columns that are not in [`REQUIRED_COLUMNS`].
    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// Column names in display and export order, without `Month_Year`.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The value of `column` in `row`, or `None` for an unknown column.
    pub fn field<'a>(&self, row: &'a Transaction, column: &str) -> Option<Field<'a>> {
        let field = match column {
            COL_RETAILER => Field::Text(&row.retailer),
            COL_REGION => Field::Text(&row.region),
            COL_STATE => Field::Text(&row.state),
            COL_CITY => Field::Text(&row.city),
            COL_PRODUCT => Field::Text(&row.product),
            COL_INVOICE_DATE => Field::Date(row.invoice_date),
            COL_UNITS_SOLD => Field::Units(row.units_sold),
            COL_TOTAL_SALES => Field::Amount(row.total_sales),
            COL_OPERATING_PROFIT => Field::Amount(row.operating_profit),
            other => {
                let i = self.extra_columns.iter().position(|c| c == other)?;
                Field::Text(row.extra.get(i).map_or("", String::as_str))
            }
        };
        Some(field)
    }

    pub fn warnings(&self) -> &[RowParseWarning] {
        &self.warnings
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> Transaction {
        Transaction {
            retailer: "Walmart".to_string(),
            region: "South".to_string(),
            state: "Texas".to_string(),
            city: "Houston".to_string(),
            product: "Men's Street Footwear".to_string(),
            invoice_date: NaiveDate::from_ymd_opt(2021, 3, 1),
            units_sold: 12,
            total_sales: 600.0,
            operating_profit: 210.0,
            period: Period::Month {
                year: 2021,
                month: 3,
            },
            extra: vec![],
        }
    }

    #[test]
    fn test_required_columns_are_unique() {
        let mut cols = REQUIRED_COLUMNS.to_vec();
        cols.sort();
        cols.dedup();
        assert_eq!(cols.len(), REQUIRED_COLUMNS.len());
    }

    #[test]
    fn test_table_accessors() {
        let table = Table::new("sales.csv", vec!["SalesMethod".into()], vec![sample_row()], vec![]);
        assert_eq!(table.len(), 1);
        assert!(!table.is_empty());
        assert_eq!(table.source(), Path::new("sales.csv"));
        assert_eq!(table.extra_columns(), ["SalesMethod".to_string()]);
        assert_eq!(table.warning_count(), 0);
    }

    #[test]
    fn test_default_column_order() {
        let table = Table::new("sales.csv", vec!["SalesMethod".into()], vec![], vec![]);
        assert_eq!(table.columns().len(), REQUIRED_COLUMNS.len() + 1);
        assert_eq!(table.columns()[0], COL_RETAILER);
        assert_eq!(table.columns().last().unwrap(), "SalesMethod");
    }

    #[test]
    fn test_source_column_order() {
        let order = vec![
            "Retailer ID".to_string(),
            COL_RETAILER.to_string(),
            COL_INVOICE_DATE.to_string(),
            "Bogus".to_string(),
        ];
        let table = Table::new("sales.csv", vec!["Retailer ID".into()], vec![], vec![])
            .with_column_order(order);
        assert_eq!(&table.columns()[..3], ["Retailer ID", COL_RETAILER, COL_INVOICE_DATE]);
        assert_eq!(table.columns().len(), REQUIRED_COLUMNS.len() + 1);
        assert!(!table.columns().iter().any(|c| c == "Bogus"));
    }

    #[test]
    fn test_field_lookup() {
        let mut row = sample_row();
        row.extra = vec!["Online".to_string()];
        let table = Table::new("sales.csv", vec!["SalesMethod".into()], vec![], vec![]);

        assert_eq!(table.field(&row, COL_CITY), Some(Field::Text("Houston")));
        assert_eq!(table.field(&row, COL_UNITS_SOLD), Some(Field::Units(12)));
        assert_eq!(table.field(&row, COL_OPERATING_PROFIT), Some(Field::Amount(210.0)));
        assert_eq!(
            table.field(&row, COL_INVOICE_DATE),
            Some(Field::Date(NaiveDate::from_ymd_opt(2021, 3, 1)))
        );
        assert_eq!(table.field(&row, "SalesMethod"), Some(Field::Text("Online")));
        assert_eq!(table.field(&row, "Nope"), None);
    }

    #[test]
    fn test_empty_table() {
        let table = Table::empty();
        assert!(table.is_empty());
        assert!(table.rows().is_empty());
    }

    #[test]
    fn test_warning_display() {
        let w = RowParseWarning {
            row: 4,
            column: COL_UNITS_SOLD.to_string(),
            value: "lots".to_string(),
            kind: WarningKind::InvalidNumber,
        };
        assert_eq!(w.to_string(), "row 4: invalid number in UnitsSold (\"lots\")");
    }

    #[test]
    fn test_warning_kind_serializes_snake_case() {
        let json = serde_json::to_string(&WarningKind::InvalidDate).unwrap();
        assert_eq!(json, "\"invalid_date\"");
    }
}
