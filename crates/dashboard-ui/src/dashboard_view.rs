//! The five dashboard tabs.
//!
//! Each tab lays out charts and tables for one slice of a
//! [`DashboardSnapshot`]. Pie, treemap, sunburst and box plots have no
//! terminal counterpart, so they are drawn as share bars and tables.

use std::path::Path;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    symbols,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType, Paragraph, Tabs},
    Frame,
};

use dashboard_core::formatting::format_compact_currency;
use dashboard_data::aggregator::{AggregateTable, Measure};
use dashboard_data::export::ExportKind;
use dashboard_runtime::orchestrator::DashboardSnapshot;

use crate::components::share_bar::{fit_label, max_abs, ShareBar, SignedBar};
use crate::table_view;
use crate::themes::Theme;

/// Columns given to each bar label under a bar chart.
const BAR_LABEL_WIDTH: usize = 10;

// ── Tab ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    SalesOverview,
    Geography,
    Products,
    Data,
    Advanced,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::SalesOverview,
        Tab::Geography,
        Tab::Products,
        Tab::Data,
        Tab::Advanced,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::SalesOverview => "Sales Overview",
            Tab::Geography => "Geography",
            Tab::Products => "Products",
            Tab::Data => "Data",
            Tab::Advanced => "Advanced",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::SalesOverview => 0,
            Tab::Geography => 1,
            Tab::Products => 2,
            Tab::Data => 3,
            Tab::Advanced => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Tab> {
        Tab::ALL.get(index).copied()
    }

    /// Next tab, wrapping around.
    pub fn next(self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    /// Previous tab, wrapping around.
    pub fn prev(self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// What a tab needs besides the frame and area.
pub struct TabContext<'a> {
    pub snapshot: &'a DashboardSnapshot,
    /// First visible row of the data explorer.
    pub scroll: usize,
    /// Where `e` writes the CSV files.
    pub export_dir: &'a Path,
    pub theme: &'a Theme,
}

/// Render the tab bar with `active` highlighted.
pub fn render_tabs(frame: &mut Frame, area: Rect, active: Tab, theme: &Theme) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|t| Line::from(format!(" {} {} ", t.index() + 1, t.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(active.index())
        .style(theme.tab)
        .highlight_style(theme.tab_active)
        .divider(Span::styled("|", theme.separator));
    frame.render_widget(tabs, area);
}

/// Render the body of `tab`.
pub fn render_tab(frame: &mut Frame, area: Rect, tab: Tab, ctx: &TabContext) {
    match tab {
        Tab::SalesOverview => render_sales_overview(frame, area, ctx),
        Tab::Geography => render_geography(frame, area, ctx),
        Tab::Products => render_products(frame, area, ctx),
        Tab::Data => render_data(frame, area, ctx),
        Tab::Advanced => render_advanced(frame, area, ctx),
    }
}

// ── Tabs ──────────────────────────────────────────────────────────────────────

fn render_sales_overview(frame: &mut Frame, area: Rect, ctx: &TabContext) {
    let data = &ctx.snapshot.data;
    let [charts, states] =
        Layout::vertical([Constraint::Percentage(55), Constraint::Min(5)]).areas(area);
    let [retailers, trend] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(charts);

    render_bar_chart(
        frame,
        retailers,
        "Total Sales by Retailer",
        &data.retailer_sales.series(Measure::TotalSales),
        ctx.theme.bar_primary,
        ctx.theme,
    );

    let monthly = data.sales_by_period.series(Measure::TotalSales);
    let labels: Vec<String> = monthly.iter().map(|(label, _)| label.clone()).collect();
    let points = index_points(monthly.iter().map(|(_, v)| *v));
    render_line_chart(
        frame,
        trend,
        "Monthly Sales Trend",
        &labels,
        &[("Sales".to_string(), points)],
        ctx.theme,
    );

    table_view::render_aggregate_table(
        frame,
        states,
        "State-wise Performance",
        &data.state_sales.sorted_desc(Measure::TotalSales),
        true,
        ctx.theme,
    );
}

fn render_geography(frame: &mut Frame, area: Rect, ctx: &TabContext) {
    let data = &ctx.snapshot.data;
    let [cities, right] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(area);
    let [regions, shares] =
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(right);

    table_view::render_aggregate_table(
        frame,
        cities,
        "Sales Distribution by Region / City",
        &data.region_city_sales,
        true,
        ctx.theme,
    );

    let region_sales = data.region_sales.series(Measure::TotalSales);
    render_bar_chart(
        frame,
        regions,
        "Sales by Region",
        &region_sales,
        ctx.theme.bar_primary,
        ctx.theme,
    );
    render_share_bars(frame, shares, "Sales Distribution", &region_sales, ctx.theme);
}

fn render_products(frame: &mut Frame, area: Rect, ctx: &TabContext) {
    let data = &ctx.snapshot.data;
    let [top, bottom] =
        Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
    let [sales, units] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(top);
    let [profit, distribution] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(bottom);

    render_bar_chart(
        frame,
        sales,
        "Total Sales by Product",
        &data.product_performance.series(Measure::TotalSales),
        ctx.theme.bar_secondary,
        ctx.theme,
    );
    render_share_bars(
        frame,
        units,
        "Units Sold Distribution",
        &data.product_performance.series(Measure::UnitsSold),
        ctx.theme,
    );
    table_view::render_aggregate_table(
        frame,
        profit,
        "Profit Analysis",
        &data.product_performance.sorted_desc(Measure::OperatingProfit),
        true,
        ctx.theme,
    );
    table_view::render_aggregate_table(
        frame,
        distribution,
        "Sales Distribution by Product",
        &data.product_distribution,
        false,
        ctx.theme,
    );
}

fn render_data(frame: &mut Frame, area: Rect, ctx: &TabContext) {
    let export_height = ExportKind::ALL.len() as u16 + 3;
    let [dataset, exports] =
        Layout::vertical([Constraint::Min(5), Constraint::Length(export_height)]).areas(area);

    table_view::render_dataset_table(frame, dataset, &ctx.snapshot.table, ctx.scroll, ctx.theme);

    let mut lines: Vec<Line> = ExportKind::ALL
        .iter()
        .map(|kind| {
            Line::from(vec![
                Span::styled(fit_label(kind.title(), 18), ctx.theme.label),
                Span::styled(kind.file_name(), ctx.theme.value),
            ])
        })
        .collect();
    lines.push(Line::from(Span::styled(
        format!("Press 'e' to write all files to {}", ctx.export_dir.display()),
        ctx.theme.dim,
    )));

    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(ctx.theme.card_border)
                .title(" Data Export "),
        ),
        exports,
    );
}

fn render_advanced(frame: &mut Frame, area: Rect, ctx: &TabContext) {
    let data = &ctx.snapshot.data;
    let waterfall = first_value_series(&data.waterfall);
    let funnel = data.profit_funnel.series(Measure::OperatingProfit);
    let bars_height = waterfall.len().max(funnel.len()).max(1) as u16 + 2;

    let [bars, trend, hierarchy] = Layout::vertical([
        Constraint::Length(bars_height),
        Constraint::Percentage(50),
        Constraint::Min(5),
    ])
    .areas(area);
    let [waterfall_area, funnel_area] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(bars);

    render_signed_bars(frame, waterfall_area, "Profit Waterfall", &waterfall, ctx.theme);
    render_signed_bars(frame, funnel_area, "Profit Funnel by Region", &funnel, ctx.theme);

    let (labels, series) = region_profit_series(&data.monthly_profit);
    render_line_chart(
        frame,
        trend,
        "Monthly Profit by Region",
        &labels,
        &series,
        ctx.theme,
    );

    table_view::render_aggregate_table(
        frame,
        hierarchy,
        "Profit Hierarchy: Region > State > Retailer",
        &data.profit_hierarchy,
        true,
        ctx.theme,
    );
}

// ── Series helpers ────────────────────────────────────────────────────────────

/// `(label, first value)` for every row, whatever the value column is named.
pub fn first_value_series(view: &AggregateTable) -> Vec<(String, f64)> {
    view.rows()
        .iter()
        .map(|r| (r.label(), r.value(0).map_or(0.0, |v| v.as_f64())))
        .collect()
}

/// Plot points with the row index on the x axis.
pub fn index_points(values: impl IntoIterator<Item = f64>) -> Vec<(f64, f64)> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| (i as f64, v))
        .collect()
}

/// Split a `[Month_Year, Region] -> value` view into x labels and one series
/// per region. x is the period's position among all periods present.
pub fn region_profit_series(view: &AggregateTable) -> (Vec<String>, Vec<(String, Vec<(f64, f64)>)>) {
    let mut periods = Vec::new();
    let mut series: Vec<(String, Vec<(f64, f64)>)> = Vec::new();

    for row in view.rows() {
        let (Some(period), Some(region)) = (row.key(0), row.key(1)) else {
            continue;
        };
        if periods.last() != Some(period) {
            periods.push(period.clone());
        }
        let x = (periods.len() - 1) as f64;
        let y = row.value(0).map_or(0.0, |v| v.as_f64());
        let region = region.to_string();
        match series.iter_mut().find(|(name, _)| *name == region) {
            Some((_, points)) => points.push((x, y)),
            None => series.push((region, vec![(x, y)])),
        }
    }

    series.sort_by(|a, b| a.0.cmp(&b.0));
    let labels = periods.iter().map(ToString::to_string).collect();
    (labels, series)
}

/// Y bounds that always include zero, padded so lines don't hug the border.
pub fn value_bounds(values: impl IntoIterator<Item = f64>) -> [f64; 2] {
    let (lo, hi) = values
        .into_iter()
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo == hi {
        return [lo, lo + 1.0];
    }
    let pad = (hi - lo) * 0.05;
    [if lo < 0.0 { lo - pad } else { lo }, hi + pad]
}

// ── Chart helpers ─────────────────────────────────────────────────────────────

fn titled_block<'a>(title: &str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.card_border)
        .title(Span::styled(format!(" {} ", title), theme.bold))
}

fn render_bar_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    series: &[(String, f64)],
    style: Style,
    theme: &Theme,
) {
    if series.is_empty() {
        table_view::render_no_data(frame, area, title, theme);
        return;
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let bar_width = (inner_width / series.len())
        .saturating_sub(1)
        .clamp(3, BAR_LABEL_WIDTH) as u16;

    let bars: Vec<Bar> = series
        .iter()
        .map(|(label, value)| {
            Bar::default()
                .value(value.max(0.0).round() as u64)
                .text_value(format_compact_currency(*value))
                .label(Line::from(fit_label(label, bar_width as usize).trim_end().to_string()))
                .style(style)
        })
        .collect();

    let chart = BarChart::default()
        .block(titled_block(title, theme))
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .value_style(theme.bar_value)
        .label_style(theme.label);
    frame.render_widget(chart, area);
}

fn render_line_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    x_labels: &[String],
    series: &[(String, Vec<(f64, f64)>)],
    theme: &Theme,
) {
    if series.iter().all(|(_, points)| points.is_empty()) {
        table_view::render_no_data(frame, area, title, theme);
        return;
    }

    let datasets: Vec<Dataset> = series
        .iter()
        .enumerate()
        .map(|(i, (name, points))| {
            Dataset::default()
                .name(name.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(theme.series_style(i))
                .data(points)
        })
        .collect();

    let x_max = x_labels.len().saturating_sub(1).max(1) as f64;
    let x_axis_labels: Vec<Span> = match x_labels {
        [] => Vec::new(),
        [only] => vec![Span::raw(only.clone())],
        [first, .., last] => vec![
            Span::raw(first.clone()),
            Span::raw(x_labels[x_labels.len() / 2].clone()),
            Span::raw(last.clone()),
        ],
    };

    let [y_lo, y_hi] = value_bounds(series.iter().flat_map(|(_, p)| p.iter().map(|(_, y)| *y)));
    let y_axis_labels = vec![
        Span::raw(format_compact_currency(y_lo)),
        Span::raw(format_compact_currency((y_lo + y_hi) / 2.0)),
        Span::raw(format_compact_currency(y_hi)),
    ];

    let chart = Chart::new(datasets)
        .block(titled_block(title, theme))
        .x_axis(
            Axis::default()
                .style(theme.axis)
                .bounds([0.0, x_max])
                .labels(x_axis_labels),
        )
        .y_axis(
            Axis::default()
                .style(theme.axis)
                .bounds([y_lo, y_hi])
                .labels(y_axis_labels),
        );
    frame.render_widget(chart, area);
}

fn render_share_bars(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    series: &[(String, f64)],
    theme: &Theme,
) {
    if series.is_empty() {
        table_view::render_no_data(frame, area, title, theme);
        return;
    }
    let whole: f64 = series.iter().map(|(_, v)| v.max(0.0)).sum();
    let lines: Vec<Line> = series
        .iter()
        .map(|(label, value)| ShareBar::new(label.clone(), *value, whole, theme).to_line())
        .collect();
    frame.render_widget(Paragraph::new(lines).block(titled_block(title, theme)), area);
}

fn render_signed_bars(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    series: &[(String, f64)],
    theme: &Theme,
) {
    if series.is_empty() {
        table_view::render_no_data(frame, area, title, theme);
        return;
    }
    let largest = max_abs(series.iter().map(|(_, v)| *v));
    let lines: Vec<Line> = series
        .iter()
        .map(|(label, value)| SignedBar::new(label.clone(), *value, largest, theme).to_line())
        .collect();
    frame.render_widget(Paragraph::new(lines).block(titled_block(title, theme)), area);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dashboard_core::models::{Table, Transaction};
    use dashboard_core::period::Period;
    use dashboard_data::aggregator::monthly_profit_by_region;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn tx(retailer: &str, region: &str, date: Option<NaiveDate>, sales: f64, profit: f64) -> Transaction {
        Transaction {
            retailer: retailer.to_string(),
            region: region.to_string(),
            state: "NY".to_string(),
            city: "NYC".to_string(),
            product: "Shoes".to_string(),
            invoice_date: date,
            units_sold: 10,
            total_sales: sales,
            operating_profit: profit,
            period: Period::from_date(date),
            extra: Vec::new(),
        }
    }

    fn make_table() -> Table {
        let jan = NaiveDate::from_ymd_opt(2023, 1, 5);
        let feb = NaiveDate::from_ymd_opt(2023, 2, 5);
        Table::new(
            PathBuf::from("sales.csv"),
            Vec::new(),
            vec![
                tx("RetailerA", "East", jan, 100.0, 30.0),
                tx("RetailerA", "West", jan, 50.0, 10.0),
                tx("RetailerB", "East", feb, 200.0, -5.0),
                tx("RetailerB", "West", None, 20.0, 2.0),
            ],
            Vec::new(),
        )
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn draw_tab(tab: Tab, table: Table) -> String {
        let snapshot = DashboardSnapshot::new(Arc::new(table));
        let theme = Theme::dark();
        let backend = TestBackend::new(140, 45);
        let mut terminal = Terminal::new(backend).unwrap();
        let ctx = TabContext {
            snapshot: &snapshot,
            scroll: 0,
            export_dir: Path::new("/tmp/exports"),
            theme: &theme,
        };
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_tab(frame, area, tab, &ctx);
            })
            .unwrap();
        screen(&terminal)
    }

    #[test]
    fn test_tab_navigation_wraps() {
        assert_eq!(Tab::SalesOverview.next(), Tab::Geography);
        assert_eq!(Tab::Advanced.next(), Tab::SalesOverview);
        assert_eq!(Tab::SalesOverview.prev(), Tab::Advanced);
        assert_eq!(Tab::from_index(3), Some(Tab::Data));
        assert_eq!(Tab::from_index(5), None);
        for tab in Tab::ALL {
            assert_eq!(Tab::from_index(tab.index()), Some(tab));
        }
    }

    #[test]
    fn test_first_value_series() {
        let snapshot = DashboardSnapshot::new(Arc::new(make_table()));
        let series = first_value_series(&snapshot.data.waterfall);
        let labels: Vec<&str> = series.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, ["Revenue", "Costs", "Profit"]);
        assert_eq!(series[0].1, 370.0);
        assert_eq!(series[1].1, -333.0);
        assert_eq!(series[2].1, 37.0);
    }

    #[test]
    fn test_region_profit_series() {
        let view = monthly_profit_by_region(&make_table());
        let (labels, series) = region_profit_series(&view);
        assert_eq!(labels, ["Jan'23", "Feb'23", "Unknown"]);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].0, "East");
        assert_eq!(series[0].1, vec![(0.0, 30.0), (1.0, -5.0)]);
        assert_eq!(series[1].0, "West");
        assert_eq!(series[1].1, vec![(0.0, 10.0), (2.0, 2.0)]);
    }

    #[test]
    fn test_index_points() {
        assert_eq!(index_points([5.0, 7.0]), vec![(0.0, 5.0), (1.0, 7.0)]);
    }

    #[test]
    fn test_value_bounds() {
        assert_eq!(value_bounds(Vec::<f64>::new()), [0.0, 1.0]);
        let [lo, hi] = value_bounds([10.0, 20.0]);
        assert_eq!(lo, 0.0);
        assert!(hi > 20.0);
        let [lo, _] = value_bounds([-10.0, 20.0]);
        assert!(lo < -10.0);
    }

    #[test]
    fn test_render_sales_overview() {
        let text = draw_tab(Tab::SalesOverview, make_table());
        assert!(text.contains("Total Sales by Retailer"));
        assert!(text.contains("Monthly Sales Trend"));
        assert!(text.contains("State-wise Performance"));
    }

    #[test]
    fn test_render_geography() {
        let text = draw_tab(Tab::Geography, make_table());
        assert!(text.contains("Sales by Region"));
        assert!(text.contains("Sales Distribution"));
    }

    #[test]
    fn test_render_products() {
        let text = draw_tab(Tab::Products, make_table());
        assert!(text.contains("Total Sales by Product"));
        assert!(text.contains("Profit Analysis"));
        assert!(text.contains("Median"));
    }

    #[test]
    fn test_render_data_lists_exports() {
        let text = draw_tab(Tab::Data, make_table());
        assert!(text.contains("Full Dataset"));
        assert!(text.contains("retailer_sales.csv"));
        assert!(text.contains("monthly_profit_trends.csv"));
        assert!(text.contains("/tmp/exports"));
    }

    #[test]
    fn test_render_advanced() {
        let text = draw_tab(Tab::Advanced, make_table());
        assert!(text.contains("Profit Waterfall"));
        assert!(text.contains("Revenue"));
        assert!(text.contains("Profit Funnel by Region"));
        assert!(text.contains("Monthly Profit by Region"));
    }

    #[test]
    fn test_render_every_tab_on_empty_table() {
        for tab in Tab::ALL {
            let text = draw_tab(tab, Table::empty());
            assert!(!text.is_empty());
        }
    }

    #[test]
    fn test_render_tabs_highlights_active() {
        let theme = Theme::dark();
        let backend = TestBackend::new(100, 1);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_tabs(frame, area, Tab::Products, &theme);
            })
            .unwrap();
        let text = screen(&terminal);
        assert!(text.contains("1 Sales Overview"));
        assert!(text.contains("3 Products"));
    }
}
