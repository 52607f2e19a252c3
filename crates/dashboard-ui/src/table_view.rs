//! Tabular views for the sales dashboard TUI.
//!
//! Renders any [`AggregateTable`] as a bordered [`ratatui::widgets::Table`]
//! with an optional highlighted totals row, the scrollable full dataset, and
//! the placeholder and error screens.

use ratatui::{
    layout::{Alignment, Constraint, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use dashboard_core::formatting;
use dashboard_core::models::{Field, Table as Dataset, Transaction, COL_PERIOD};
use dashboard_data::aggregator::{AggregateTable, MeasureValue};

use crate::themes::Theme;

/// Widest a single column may grow, in terminal columns.
const MAX_COLUMN_WIDTH: usize = 28;

/// Rows taken by the block borders and the header row.
const TABLE_CHROME_ROWS: u16 = 3;

/// Format a reduced value for display: counts grouped, amounts as currency.
pub fn format_measure(value: MeasureValue) -> String {
    match value {
        MeasureValue::Integer(n) => formatting::format_count(n),
        MeasureValue::Amount(a) => formatting::format_currency(a),
    }
}

/// Width constraints sized to the widest cell of each column.
fn column_widths(header: &[String], body: &[Vec<String>]) -> Vec<Constraint> {
    header
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let widest = body
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.width())
                .chain(std::iter::once(h.width()))
                .max()
                .unwrap_or(0);
            Constraint::Length(widest.min(MAX_COLUMN_WIDTH) as u16 + 1)
        })
        .collect()
}

/// Number of data rows that fit in a table drawn into `area`.
pub fn visible_rows(area: Rect) -> usize {
    area.height.saturating_sub(TABLE_CHROME_ROWS) as usize
}

/// Render one aggregation view into `area`.
///
/// With `with_totals` a highlighted `TOTAL` row sums every value column.
pub fn render_aggregate_table(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    view: &AggregateTable,
    with_totals: bool,
    theme: &Theme,
) {
    let header: Vec<String> = view.column_names().iter().map(|c| c.to_string()).collect();

    let body: Vec<Vec<String>> = view
        .rows()
        .iter()
        .map(|row| {
            row.keys
                .iter()
                .map(ToString::to_string)
                .chain(row.values.iter().map(|v| format_measure(*v)))
                .collect()
        })
        .collect();

    let total_cells = with_totals.then(|| {
        let mut cells = vec![String::new(); view.key_columns().len()];
        if let Some(first) = cells.first_mut() {
            *first = "TOTAL".to_string();
        }
        for i in 0..view.value_columns().len() {
            let column = view.rows().iter().filter_map(|r| r.value(i));
            let total = column.fold(None, |acc: Option<MeasureValue>, v| {
                Some(match (acc, v) {
                    (None, v) => v,
                    (Some(MeasureValue::Integer(a)), MeasureValue::Integer(b)) => {
                        MeasureValue::Integer(a.saturating_add(b))
                    }
                    (Some(a), b) => MeasureValue::Amount(a.as_f64() + b.as_f64()),
                })
            });
            cells.push(total.map(format_measure).unwrap_or_default());
        }
        cells
    });

    let widths = column_widths(
        &header,
        &body.iter().chain(total_cells.iter()).cloned().collect::<Vec<_>>(),
    );

    let header_row = Row::new(
        header
            .iter()
            .map(|h| Cell::from(h.clone()).style(theme.table_header)),
    )
    .height(1);

    let mut rows: Vec<Row> = body
        .into_iter()
        .enumerate()
        .map(|(i, cells)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            Row::new(cells.into_iter().map(Cell::from)).style(style)
        })
        .collect();

    if let Some(cells) = total_cells {
        rows.push(Row::new(cells.into_iter().map(Cell::from)).style(theme.table_total));
    }

    let table = Table::new(rows, widths)
        .header(header_row)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {} ", title)),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

fn transaction_cells(dataset: &Dataset, t: &Transaction) -> Vec<String> {
    let mut cells: Vec<String> = dataset
        .columns()
        .iter()
        .map(|c| match dataset.field(t, c) {
            Some(Field::Text(s)) => s.to_string(),
            Some(Field::Date(d)) => d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default(),
            Some(Field::Units(n)) => formatting::format_count(n),
            Some(Field::Amount(a)) => formatting::format_currency(a),
            None => String::new(),
        })
        .collect();
    cells.push(t.period.label());
    cells
}

/// Render a window of the full dataset starting at row `offset`.
///
/// `offset` is clamped so the last page stays full.
pub fn render_dataset_table(
    frame: &mut Frame,
    area: Rect,
    dataset: &Dataset,
    offset: usize,
    theme: &Theme,
) {
    let page = visible_rows(area);
    let offset = offset.min(dataset.len().saturating_sub(page));
    let end = (offset + page).min(dataset.len());

    let header: Vec<String> = dataset
        .columns()
        .iter()
        .cloned()
        .chain(std::iter::once(COL_PERIOD.to_string()))
        .collect();

    let body: Vec<Vec<String>> = dataset.rows()[offset..end]
        .iter()
        .map(|t| transaction_cells(dataset, t))
        .collect();

    let widths = column_widths(&header, &body);

    let header_row = Row::new(
        header
            .iter()
            .map(|h| Cell::from(h.clone()).style(theme.table_header)),
    );
    let rows: Vec<Row> = body
        .into_iter()
        .enumerate()
        .map(|(i, cells)| {
            let style = if (offset + i) % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            Row::new(cells.into_iter().map(Cell::from)).style(style)
        })
        .collect();

    let title = if dataset.is_empty() {
        " Full Dataset (empty) ".to_string()
    } else {
        format!(
            " Full Dataset (rows {}-{} of {}) ",
            offset + 1,
            end,
            formatting::format_count(dataset.len() as u64)
        )
    };

    let table = Table::new(rows, widths)
        .header(header_row)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(title),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Render a "no data" placeholder for a chart or table with nothing to show.
pub fn render_no_data(frame: &mut Frame, area: Rect, title: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No transactions to show", theme.warning)),
    ];
    frame.render_widget(
        Paragraph::new(Text::from(text))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", title)),
            ),
        area,
    );
}

/// Full-screen error shown when the source could not be loaded.
pub fn render_error(frame: &mut Frame, area: Rect, message: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("Unable to load sales data", theme.error)),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme.text)),
        Line::from(""),
        Line::from(Span::styled(
            "Fix the file and press 'r' to reload.",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(Text::from(text))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.error)
                    .title(" Sales Dashboard "),
            ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dashboard_core::period::Period;
    use dashboard_data::aggregator::{AggregateRow, KeyValue};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::path::PathBuf;

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn make_view() -> AggregateTable {
        AggregateTable::new(
            vec!["Retailer".to_string()],
            vec!["TotalSales".to_string(), "UnitsSold".to_string()],
            vec![
                AggregateRow {
                    keys: vec![KeyValue::Text("RetailerA".to_string())],
                    values: vec![MeasureValue::Amount(150.0), MeasureValue::Integer(15)],
                },
                AggregateRow {
                    keys: vec![KeyValue::Text("RetailerB".to_string())],
                    values: vec![MeasureValue::Amount(200.0), MeasureValue::Integer(8)],
                },
            ],
        )
    }

    fn make_dataset(n: usize) -> Dataset {
        let date = NaiveDate::from_ymd_opt(2023, 1, 5);
        let rows = (0..n)
            .map(|i| Transaction {
                retailer: format!("Retailer{i}"),
                region: "East".to_string(),
                state: "NY".to_string(),
                city: "NYC".to_string(),
                product: "Shoes".to_string(),
                invoice_date: date,
                units_sold: 10,
                total_sales: 100.0,
                operating_profit: 20.0,
                period: Period::from_date(date),
                extra: Vec::new(),
            })
            .collect();
        Dataset::new(PathBuf::from("sales.csv"), Vec::new(), rows, Vec::new())
    }

    #[test]
    fn test_format_measure() {
        assert_eq!(format_measure(MeasureValue::Integer(9648)), "9,648");
        assert_eq!(format_measure(MeasureValue::Amount(1234.5)), "$1,234.50");
        assert_eq!(format_measure(MeasureValue::Amount(-20.0)), "-$20.00");
    }

    #[test]
    fn test_visible_rows() {
        assert_eq!(visible_rows(Rect::new(0, 0, 80, 13)), 10);
        assert_eq!(visible_rows(Rect::new(0, 0, 80, 2)), 0);
    }

    #[test]
    fn test_render_aggregate_table_with_totals() {
        let backend = TestBackend::new(80, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        let view = make_view();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_aggregate_table(frame, area, "Retailer Data", &view, true, &theme);
            })
            .unwrap();

        let text = screen(&terminal);
        assert!(text.contains("Retailer Data"));
        assert!(text.contains("RetailerA"));
        assert!(text.contains("TOTAL"));
        assert!(text.contains("$350.00"));
        assert!(text.contains("23"));
    }

    #[test]
    fn test_render_aggregate_table_empty_does_not_panic() {
        let backend = TestBackend::new(80, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::light();
        let view = AggregateTable::default();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_aggregate_table(frame, area, "Empty", &view, true, &theme);
            })
            .unwrap();
    }

    #[test]
    fn test_render_dataset_table_scrolls() {
        let backend = TestBackend::new(160, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        let dataset = make_dataset(20);

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_dataset_table(frame, area, &dataset, 10, &theme);
            })
            .unwrap();

        let text = screen(&terminal);
        assert!(text.contains("rows 11-15 of 20"), "screen: {text}");
        assert!(text.contains("Retailer10"));
        assert!(!text.contains("Retailer9 "));
        assert!(text.contains("Jan'23"));
    }

    #[test]
    fn test_render_dataset_table_offset_clamped() {
        let backend = TestBackend::new(160, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        let dataset = make_dataset(6);

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_dataset_table(frame, area, &dataset, 100, &theme);
            })
            .unwrap();

        assert!(screen(&terminal).contains("rows 2-6 of 6"));
    }

    #[test]
    fn test_render_dataset_table_empty() {
        let backend = TestBackend::new(160, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        let dataset = Dataset::empty();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_dataset_table(frame, area, &dataset, 0, &theme);
            })
            .unwrap();

        assert!(screen(&terminal).contains("Full Dataset (empty)"));
    }

    #[test]
    fn test_render_no_data_does_not_panic() {
        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_no_data(frame, area, "Sales by Retailer", &theme);
            })
            .unwrap();
    }

    #[test]
    fn test_render_error_shows_message() {
        let backend = TestBackend::new(80, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_error(frame, area, "Source file not found: x.xlsx", &theme);
            })
            .unwrap();

        let text = screen(&terminal);
        assert!(text.contains("Unable to load sales data"));
        assert!(text.contains("Source file not found: x.xlsx"));
    }
}
