//! Group-by aggregation over the transaction table.
//!
//! Every view here is a pure function of `&Table`: it reads the rows, groups
//! them by one or more [`Dimension`]s and sums [`Measure`]s. Grouping goes
//! through a `BTreeMap`, so output rows come back ordered by key, text
//! lexicographically and periods chronologically with `Unknown` last.

use std::collections::BTreeMap;
use std::fmt;

use dashboard_core::models::{
    Table, Transaction, COL_CITY, COL_OPERATING_PROFIT, COL_PERIOD, COL_PRODUCT, COL_REGION,
    COL_RETAILER, COL_STATE, COL_TOTAL_SALES, COL_UNITS_SOLD,
};
use dashboard_core::period::Period;
use serde::Serialize;

// ── Dimensions and measures ───────────────────────────────────────────────────

/// A categorical column transactions can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Retailer,
    Region,
    State,
    City,
    Product,
    Period,
}

impl Dimension {
    pub fn column_name(self) -> &'static str {
        match self {
            Dimension::Retailer => COL_RETAILER,
            Dimension::Region => COL_REGION,
            Dimension::State => COL_STATE,
            Dimension::City => COL_CITY,
            Dimension::Product => COL_PRODUCT,
            Dimension::Period => COL_PERIOD,
        }
    }

    fn key_of(self, t: &Transaction) -> KeyValue {
        match self {
            Dimension::Retailer => KeyValue::Text(t.retailer.clone()),
            Dimension::Region => KeyValue::Text(t.region.clone()),
            Dimension::State => KeyValue::Text(t.state.clone()),
            Dimension::City => KeyValue::Text(t.city.clone()),
            Dimension::Product => KeyValue::Text(t.product.clone()),
            Dimension::Period => KeyValue::Period(t.period),
        }
    }
}

/// A numeric column that can be summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Measure {
    UnitsSold,
    TotalSales,
    OperatingProfit,
}

impl Measure {
    pub fn column_name(self) -> &'static str {
        match self {
            Measure::UnitsSold => COL_UNITS_SOLD,
            Measure::TotalSales => COL_TOTAL_SALES,
            Measure::OperatingProfit => COL_OPERATING_PROFIT,
        }
    }

    fn value_of(self, t: &Transaction) -> MeasureValue {
        match self {
            Measure::UnitsSold => MeasureValue::Integer(t.units_sold),
            Measure::TotalSales => MeasureValue::Amount(t.total_sales),
            Measure::OperatingProfit => MeasureValue::Amount(t.operating_profit),
        }
    }

    fn zero(self) -> MeasureValue {
        match self {
            Measure::UnitsSold => MeasureValue::Integer(0),
            Measure::TotalSales | Measure::OperatingProfit => MeasureValue::Amount(0.0),
        }
    }
}

/// How the rows of one group are reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    /// Arithmetic sum of each measure, without rounding.
    Sum,
    /// Number of rows in the group; the measures are ignored.
    Count,
}

/// Column name used for [`AggOp::Count`] output.
pub const COUNT_COLUMN: &str = "Count";

// ── Cell values ───────────────────────────────────────────────────────────────

/// One group-key cell.
///
/// Within a column all keys share a variant, so the derived ordering only
/// ever compares like with like.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyValue {
    Text(String),
    Period(Period),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Text(s) => f.write_str(s),
            KeyValue::Period(p) => write!(f, "{}", p),
        }
    }
}

impl Serialize for KeyValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One aggregated numeric cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MeasureValue {
    /// Unit counts and row counts.
    Integer(u64),
    /// Monetary amounts.
    Amount(f64),
}

impl MeasureValue {
    pub fn as_f64(self) -> f64 {
        match self {
            MeasureValue::Integer(n) => n as f64,
            MeasureValue::Amount(a) => a,
        }
    }

    fn add(&mut self, other: MeasureValue) {
        match (self, other) {
            (MeasureValue::Integer(a), MeasureValue::Integer(b)) => *a = a.saturating_add(b),
            (MeasureValue::Amount(a), MeasureValue::Amount(b)) => *a += b,
            (this, other) => *this = MeasureValue::Amount(this.as_f64() + other.as_f64()),
        }
    }
}

impl fmt::Display for MeasureValue {
    /// Plain integers; amounts in shortest round-trip form with a decimal
    /// point (`150.0`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureValue::Integer(n) => write!(f, "{}", n),
            MeasureValue::Amount(a) => write!(f, "{:?}", a),
        }
    }
}

// ── AggregateTable ────────────────────────────────────────────────────────────

/// One output row: the group key followed by its reduced values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub keys: Vec<KeyValue>,
    pub values: Vec<MeasureValue>,
}

impl AggregateRow {
    pub fn key(&self, index: usize) -> Option<&KeyValue> {
        self.keys.get(index)
    }

    /// First key rendered as a label, `""` for a keyless row.
    pub fn label(&self) -> String {
        self.keys.first().map(ToString::to_string).unwrap_or_default()
    }

    pub fn value(&self, index: usize) -> Option<MeasureValue> {
        self.values.get(index).copied()
    }
}

/// The result of a group-by: named key columns, named value columns, rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AggregateTable {
    key_columns: Vec<String>,
    value_columns: Vec<String>,
    rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn new(key_columns: Vec<String>, value_columns: Vec<String>, rows: Vec<AggregateRow>) -> Self {
        Self {
            key_columns,
            value_columns,
            rows,
        }
    }

    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn key_columns(&self) -> &[String] {
        &self.key_columns
    }

    pub fn value_columns(&self) -> &[String] {
        &self.value_columns
    }

    /// Key column names followed by value column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.key_columns
            .iter()
            .chain(self.value_columns.iter())
            .map(String::as_str)
            .collect()
    }

    /// Position of a value column by name.
    pub fn value_index(&self, name: &str) -> Option<usize> {
        self.value_columns.iter().position(|c| c == name)
    }

    /// Every row's value for `measure`, in row order. Empty when the table
    /// does not carry that measure.
    pub fn measure_values(&self, measure: Measure) -> Vec<f64> {
        match self.value_index(measure.column_name()) {
            Some(i) => self
                .rows
                .iter()
                .map(|r| r.values.get(i).map_or(0.0, |v| v.as_f64()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Sum of a measure column across all rows; `0.0` if absent.
    pub fn total(&self, measure: Measure) -> f64 {
        self.measure_values(measure).iter().sum()
    }

    /// `(label, value)` pairs for charting one measure against the first key.
    pub fn series(&self, measure: Measure) -> Vec<(String, f64)> {
        self.rows
            .iter()
            .map(AggregateRow::label)
            .zip(self.measure_values(measure))
            .collect()
    }

    /// Stable sort of the rows by a value column.
    fn sort_by_value(&mut self, index: usize, descending: bool) {
        self.rows.sort_by(|a, b| {
            let a = a.values.get(index).map_or(0.0, |v| v.as_f64());
            let b = b.values.get(index).map_or(0.0, |v| v.as_f64());
            let ord = a.total_cmp(&b);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }

    /// Copy of the table ordered by `measure`, largest first. Ties keep key
    /// order.
    pub fn sorted_desc(&self, measure: Measure) -> AggregateTable {
        let mut sorted = self.clone();
        if let Some(i) = self.value_index(measure.column_name()) {
            sorted.sort_by_value(i, true);
        }
        sorted
    }
}

// ── Generic aggregation ───────────────────────────────────────────────────────

/// Group `table` by `dimensions` and reduce each group with `op`.
///
/// Output rows are ordered by key ascending and there is one row per distinct
/// key combination present in the table. An empty table yields an empty
/// result with the same column names.
pub fn aggregate(
    table: &Table,
    dimensions: &[Dimension],
    measures: &[Measure],
    op: AggOp,
) -> AggregateTable {
    let key_columns = dimensions
        .iter()
        .map(|d| d.column_name().to_string())
        .collect();

    let mut groups: BTreeMap<Vec<KeyValue>, Vec<MeasureValue>> = BTreeMap::new();

    let value_columns = match op {
        AggOp::Sum => {
            for t in table.rows() {
                let key = dimensions.iter().map(|d| d.key_of(t)).collect();
                let acc = groups
                    .entry(key)
                    .or_insert_with(|| measures.iter().map(|m| m.zero()).collect());
                for (slot, m) in acc.iter_mut().zip(measures) {
                    slot.add(m.value_of(t));
                }
            }
            measures.iter().map(|m| m.column_name().to_string()).collect()
        }
        AggOp::Count => {
            for t in table.rows() {
                let key = dimensions.iter().map(|d| d.key_of(t)).collect();
                groups
                    .entry(key)
                    .or_insert_with(|| vec![MeasureValue::Integer(0)])[0]
                    .add(MeasureValue::Integer(1));
            }
            vec![COUNT_COLUMN.to_string()]
        }
    };

    let rows = groups
        .into_iter()
        .map(|(keys, values)| AggregateRow { keys, values })
        .collect();

    AggregateTable::new(key_columns, value_columns, rows)
}

fn sum(table: &Table, dimensions: &[Dimension], measures: &[Measure]) -> AggregateTable {
    aggregate(table, dimensions, measures, AggOp::Sum)
}

// ── Fixed views ───────────────────────────────────────────────────────────────

/// Total sales per retailer.
pub fn sales_by_retailer(table: &Table) -> AggregateTable {
    sum(table, &[Dimension::Retailer], &[Measure::TotalSales])
}

/// Total sales per calendar month, chronological, `Unknown` last.
pub fn sales_by_period(table: &Table) -> AggregateTable {
    sum(table, &[Dimension::Period], &[Measure::TotalSales])
}

pub fn sales_units_by_state(table: &Table) -> AggregateTable {
    sum(
        table,
        &[Dimension::State],
        &[Measure::TotalSales, Measure::UnitsSold],
    )
}

pub fn sales_by_region_city(table: &Table) -> AggregateTable {
    sum(
        table,
        &[Dimension::Region, Dimension::City],
        &[Measure::TotalSales],
    )
}

pub fn sales_by_region(table: &Table) -> AggregateTable {
    sum(table, &[Dimension::Region], &[Measure::TotalSales])
}

pub fn product_performance(table: &Table) -> AggregateTable {
    sum(
        table,
        &[Dimension::Product],
        &[
            Measure::TotalSales,
            Measure::UnitsSold,
            Measure::OperatingProfit,
        ],
    )
}

/// Product totals in the shape of the product CSV download.
pub fn product_export(table: &Table) -> AggregateTable {
    sum(
        table,
        &[Dimension::Product],
        &[Measure::TotalSales, Measure::UnitsSold],
    )
}

pub fn profit_hierarchy(table: &Table) -> AggregateTable {
    sum(
        table,
        &[Dimension::Region, Dimension::State, Dimension::Retailer],
        &[Measure::OperatingProfit],
    )
}

/// Profit per region, smallest first. Regions with equal profit stay in
/// name order.
pub fn profit_funnel(table: &Table) -> AggregateTable {
    let mut funnel = sum(table, &[Dimension::Region], &[Measure::OperatingProfit]);
    funnel.sort_by_value(0, false);
    funnel
}

pub fn monthly_profit_by_region(table: &Table) -> AggregateTable {
    sum(
        table,
        &[Dimension::Period, Dimension::Region],
        &[Measure::OperatingProfit],
    )
}

/// Column names of [`product_sales_distribution`].
pub const DISTRIBUTION_COLUMNS: [&str; 6] = ["Min", "Q1", "Median", "Q3", "Max", "Mean"];

/// Five-number summary plus mean of per-row `TotalSales`, per product.
pub fn product_sales_distribution(table: &Table) -> AggregateTable {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for t in table.rows() {
        groups.entry(t.product.as_str()).or_default().push(t.total_sales);
    }

    let rows = groups
        .into_iter()
        .map(|(product, mut sales)| {
            sales.sort_by(f64::total_cmp);
            let mean = sales.iter().sum::<f64>() / sales.len() as f64;
            let values = [
                quantile(&sales, 0.0),
                quantile(&sales, 0.25),
                quantile(&sales, 0.5),
                quantile(&sales, 0.75),
                quantile(&sales, 1.0),
                mean,
            ]
            .into_iter()
            .map(MeasureValue::Amount)
            .collect();
            AggregateRow {
                keys: vec![KeyValue::Text(product.to_string())],
                values,
            }
        })
        .collect();

    AggregateTable::new(
        vec![COL_PRODUCT.to_string()],
        DISTRIBUTION_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    )
}

/// Linear-interpolated quantile of an ascending, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    match (sorted.get(lo), sorted.get(hi)) {
        (Some(a), Some(b)) if frac > 0.0 => a + (b - a) * frac,
        (Some(a), _) => *a,
        _ => f64::NAN,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
