//! Spreadsheet and CSV loading for the sales dashboard.
//!
//! Reads a retail transaction table from `.xlsx`/`.xls`/`.ods` workbooks
//! (first worksheet, via `calamine`) or `.csv` files (via `csv`), validates the
//! header against [`REQUIRED_COLUMNS`] and normalises every row into a
//! [`Transaction`]. Cell-level problems never abort the load; they are
//! replaced in place and recorded as [`RowParseWarning`]s.

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use dashboard_core::error::LoadError;
use dashboard_core::models::{
    RowParseWarning, Table, Transaction, WarningKind, COL_CITY, COL_INVOICE_DATE,
    COL_OPERATING_PROFIT, COL_PRODUCT, COL_REGION, COL_RETAILER, COL_STATE, COL_TOTAL_SALES,
    COL_UNITS_SOLD, REQUIRED_COLUMNS,
};
use dashboard_core::period::Period;
use dashboard_core::time_utils::{excel_serial_to_date, parse_invoice_date};
use tracing::{debug, warn};

/// Workbook extensions handed to `calamine`.
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

// ── Public API ────────────────────────────────────────────────────────────────

/// Load the transaction table stored at `path`.
///
/// The format is chosen from the file extension. Existence is checked first
/// so a missing file always reports [`LoadError::NotFound`], whatever its
/// extension.
pub fn load(path: &Path) -> Result<Table, LoadError> {
    if !path.is_file() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let sheet = if ext == "csv" {
        read_csv(path)?
    } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        read_workbook(path)?
    } else {
        return Err(LoadError::UnsupportedFormat(path.to_path_buf()));
    };

    let table = normalise(path, sheet)?;

    debug!(
        "Loaded {} rows ({} extra columns, {} warnings) from {}",
        table.len(),
        table.extra_columns().len(),
        table.warning_count(),
        path.display()
    );
    if table.warning_count() > 0 {
        warn!(
            "{} cell(s) in {} were replaced during loading; first: {}",
            table.warning_count(),
            path.display(),
            table.warnings()[0]
        );
    }

    Ok(table)
}

// ── Raw sheet representation ──────────────────────────────────────────────────

/// A source cell before normalisation.
#[derive(Debug, Clone, PartialEq)]
enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    /// A cell the workbook itself typed as a date. `date` is resolved with
    /// the workbook's own epoch; `serial` is kept for text rendering.
    Date { date: Option<NaiveDate>, serial: f64 },
}

impl RawCell {
    fn is_blank(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Text rendering used for categorical columns and warning values.
    fn to_text(&self) -> String {
        match self {
            RawCell::Empty => String::new(),
            RawCell::Text(s) => s.trim().to_string(),
            RawCell::Number(n) | RawCell::Date { serial: n, .. } => render_number(*n),
        }
    }
}

/// Header plus data rows, in source order.
#[derive(Debug, Default)]
struct RawSheet {
    header: Vec<String>,
    rows: Vec<Vec<RawCell>>,
    /// Whether bare numbers in the date column are Excel serials.
    numeric_dates: bool,
}

fn read_csv(path: &Path) -> Result<RawSheet, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| LoadError::read(path, e))?;

    let header = reader
        .headers()
        .map_err(|e| LoadError::read(path, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| LoadError::read(path, e))?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        RawCell::Empty
                    } else {
                        RawCell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(RawSheet {
        header,
        rows,
        numeric_dates: false,
    })
}

fn read_workbook(path: &Path) -> Result<RawSheet, LoadError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| LoadError::read(path, e))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(|e| LoadError::read(path, e))?,
        // A workbook without sheets has no header row either.
        None => return Ok(RawSheet::default()),
    };

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(cells) => cells.iter().map(header_name).collect(),
        None => Vec::new(),
    };
    let rows = rows
        .map(|cells| cells.iter().map(cell_from_data).collect())
        .collect();

    Ok(RawSheet {
        header,
        rows,
        numeric_dates: true,
    })
}

/// Header cells are matched as written; only non-text cells are rendered.
fn header_name(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => cell_from_data(other).to_text(),
    }
}

fn cell_from_data(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Float(f) => RawCell::Number(*f),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Bool(b) => RawCell::Text(b.to_string()),
        Data::DateTime(dt) => RawCell::Date {
            date: dt.as_datetime().map(|d| d.date()),
            serial: dt.as_f64(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
        Data::Error(e) => RawCell::Text(format!("{e:?}")),
    }
}

// ── Normalisation ─────────────────────────────────────────────────────────────

/// Column positions of the required fields, resolved from the header.
struct ColumnIndex {
    retailer: usize,
    region: usize,
    state: usize,
    city: usize,
    product: usize,
    invoice_date: usize,
    units_sold: usize,
    total_sales: usize,
    operating_profit: usize,
    /// `(name, position)` of every non-required column, in source order.
    extra: Vec<(String, usize)>,
    /// Every named column in source order, first occurrence only.
    order: Vec<String>,
}

impl ColumnIndex {
    fn resolve(path: &Path, header: &[String]) -> Result<Self, LoadError> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (i, name) in header.iter().enumerate() {
            positions.entry(name.as_str()).or_insert(i);
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !positions.contains_key(*c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::SchemaError {
                path: path.to_path_buf(),
                missing,
            });
        }

        let order: Vec<(usize, &String)> = header
            .iter()
            .enumerate()
            .filter(|(i, name)| !name.is_empty() && positions.get(name.as_str()) == Some(i))
            .collect();
        let extra = order
            .iter()
            .filter(|(_, name)| !REQUIRED_COLUMNS.contains(&name.as_str()))
            .map(|(i, name)| (name.to_string(), *i))
            .collect();
        let order = order.into_iter().map(|(_, name)| name.clone()).collect();

        Ok(Self {
            retailer: positions[COL_RETAILER],
            region: positions[COL_REGION],
            state: positions[COL_STATE],
            city: positions[COL_CITY],
            product: positions[COL_PRODUCT],
            invoice_date: positions[COL_INVOICE_DATE],
            units_sold: positions[COL_UNITS_SOLD],
            total_sales: positions[COL_TOTAL_SALES],
            operating_profit: positions[COL_OPERATING_PROFIT],
            extra,
            order,
        })
    }
}

fn normalise(path: &Path, sheet: RawSheet) -> Result<Table, LoadError> {
    let columns = ColumnIndex::resolve(path, &sheet.header)?;

    // Trailing blank rows are sheet padding, not transactions.
    let mut rows = sheet.rows;
    while rows
        .last()
        .is_some_and(|row| row.iter().all(RawCell::is_blank))
    {
        rows.pop();
    }

    let mut warnings = Vec::new();
    let transactions = rows
        .iter()
        .enumerate()
        .map(|(i, cells)| {
            let mut row = RowNormaliser {
                row: i + 1,
                cells,
                numeric_dates: sheet.numeric_dates,
                warnings: &mut warnings,
            };
            row.transaction(&columns)
        })
        .collect();

    let extra_columns = columns.extra.into_iter().map(|(name, _)| name).collect();
    Ok(Table::new(path, extra_columns, transactions, warnings).with_column_order(columns.order))
}

/// Converts one raw row, pushing a warning for every replaced cell.
struct RowNormaliser<'a> {
    row: usize,
    cells: &'a [RawCell],
    numeric_dates: bool,
    warnings: &'a mut Vec<RowParseWarning>,
}

impl RowNormaliser<'_> {
    fn transaction(&mut self, columns: &ColumnIndex) -> Transaction {
        let invoice_date = self.date(columns.invoice_date);
        Transaction {
            retailer: self.text(columns.retailer),
            region: self.text(columns.region),
            state: self.text(columns.state),
            city: self.text(columns.city),
            product: self.text(columns.product),
            invoice_date,
            units_sold: self.units(columns.units_sold, COL_UNITS_SOLD),
            total_sales: self.amount(columns.total_sales, COL_TOTAL_SALES, false),
            operating_profit: self.amount(columns.operating_profit, COL_OPERATING_PROFIT, true),
            period: Period::from_date(invoice_date),
            extra: columns.extra.iter().map(|(_, i)| self.text(*i)).collect(),
        }
    }

    fn cell(&self, index: usize) -> &RawCell {
        self.cells.get(index).unwrap_or(&RawCell::Empty)
    }

    fn text(&self, index: usize) -> String {
        self.cell(index).to_text()
    }

    fn warn(&mut self, column: &str, value: String, kind: WarningKind) {
        self.warnings.push(RowParseWarning {
            row: self.row,
            column: column.to_string(),
            value,
            kind,
        });
    }

    fn date(&mut self, index: usize) -> Option<NaiveDate> {
        let cell = self.cell(index).clone();
        let parsed = match &cell {
            RawCell::Date { date, .. } => *date,
            RawCell::Number(serial) if self.numeric_dates => excel_serial_to_date(*serial),
            RawCell::Text(s) => parse_invoice_date(s),
            _ => None,
        };
        if parsed.is_none() {
            self.warn(COL_INVOICE_DATE, cell.to_text(), WarningKind::InvalidDate);
        }
        parsed
    }

    /// Parse a numeric cell, warning and returning `None` on failure.
    fn number(&mut self, index: usize, column: &str) -> Option<f64> {
        let cell = self.cell(index).clone();
        let parsed = match &cell {
            RawCell::Number(n) | RawCell::Date { serial: n, .. } => Some(*n),
            RawCell::Text(s) if s.trim().is_empty() => {
                self.warn(column, String::new(), WarningKind::MissingValue);
                return None;
            }
            RawCell::Text(s) => parse_amount(s),
            RawCell::Empty => {
                self.warn(column, String::new(), WarningKind::MissingValue);
                return None;
            }
        };
        match parsed {
            Some(n) if n.is_finite() => Some(n),
            _ => {
                self.warn(column, cell.to_text(), WarningKind::InvalidNumber);
                None
            }
        }
    }

    fn units(&mut self, index: usize, column: &str) -> u64 {
        let Some(n) = self.number(index, column) else {
            return 0;
        };
        if n < 0.0 {
            self.warn(column, self.text(index), WarningKind::NegativeValue);
            return 0;
        }
        if n.fract() != 0.0 || n > u64::MAX as f64 {
            self.warn(column, self.text(index), WarningKind::InvalidNumber);
            return 0;
        }
        n as u64
    }

    fn amount(&mut self, index: usize, column: &str, allow_negative: bool) -> f64 {
        let Some(n) = self.number(index, column) else {
            return 0.0;
        };
        if !allow_negative && n < 0.0 {
            self.warn(column, self.text(index), WarningKind::NegativeValue);
            return 0.0;
        }
        n
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Parse a textual number, tolerating a leading `$` (after any sign) and `,`
/// thousands separators.
fn parse_amount(s: &str) -> Option<f64> {
    let s = s.trim();
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, s),
    };
    let rest = rest.strip_prefix('$').unwrap_or(rest);
    let cleaned: String = rest.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Integral floats print without a fractional part (`94.0` → `94`).
fn render_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
