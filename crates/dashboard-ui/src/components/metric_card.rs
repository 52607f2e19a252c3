use dashboard_core::formatting::{format_count, format_millions, format_thousands};
use dashboard_data::analysis::Summary;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::themes::Theme;

/// One headline figure: a caption over a large formatted value.
pub struct MetricCard<'a> {
    pub label: &'static str,
    pub value: String,
    pub theme: &'a Theme,
}

impl<'a> MetricCard<'a> {
    pub fn new(label: &'static str, value: String, theme: &'a Theme) -> Self {
        Self {
            label,
            value,
            theme,
        }
    }

    /// Render as two lines: the caption and the value.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        vec![
            Line::from(Span::styled(self.label, self.theme.metric_label)),
            Line::from(Span::styled(self.value.clone(), self.theme.metric_value)),
        ]
    }
}

/// The four headline cards, in display order.
///
/// | Card              | Format        |
/// |-------------------|---------------|
/// | Total Units Sold  | `2478.86K`    |
/// | Total Sales       | `$899.90M`    |
/// | Total Profit      | `$332.13M`    |
/// | Total Transactions| `9,648`       |
pub fn summary_cards<'a>(summary: &Summary, theme: &'a Theme) -> [MetricCard<'a>; 4] {
    [
        MetricCard::new(
            "Total Units Sold",
            format_thousands(summary.total_units),
            theme,
        ),
        MetricCard::new("Total Sales", format_millions(summary.total_sales), theme),
        MetricCard::new("Total Profit", format_millions(summary.total_profit), theme),
        MetricCard::new(
            "Total Transactions",
            format_count(summary.transaction_count as u64),
            theme,
        ),
    ]
}

/// Lay the four cards out side by side in `area`.
pub fn render_metric_cards(frame: &mut Frame, area: Rect, summary: &Summary, theme: &Theme) {
    let columns = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);
    for (card, column) in summary_cards(summary, theme).iter().zip(columns.iter()) {
        let widget = Paragraph::new(card.to_lines())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.card_border),
            );
        frame.render_widget(widget, *column);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn make_summary() -> Summary {
        Summary {
            total_units: 2_478_861,
            total_sales: 899_902_125.0,
            total_profit: 332_134_761.45,
            transaction_count: 9_648,
            warning_count: 0,
        }
    }

    #[test]
    fn test_summary_cards_values() {
        let theme = Theme::dark();
        let cards = summary_cards(&make_summary(), &theme);
        let values: Vec<&str> = cards.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, ["2478.86K", "$899.90M", "$332.13M", "9,648"]);
    }

    #[test]
    fn test_summary_cards_empty_table() {
        let theme = Theme::dark();
        let cards = summary_cards(&Summary::default(), &theme);
        assert_eq!(cards[0].value, "0.00K");
        assert_eq!(cards[1].value, "$0.00M");
        assert_eq!(cards[3].value, "0");
    }

    #[test]
    fn test_metric_card_to_lines() {
        let theme = Theme::dark();
        let card = MetricCard::new("Total Sales", "$1.00M".to_string(), &theme);
        let lines = card.to_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].content, "Total Sales");
        assert_eq!(lines[1].spans[0].style, theme.metric_value);
    }

    #[test]
    fn test_render_metric_cards_does_not_panic() {
        let backend = TestBackend::new(100, 4);
        let mut terminal = Terminal::new(backend).unwrap();
        let theme = Theme::dark();
        let summary = make_summary();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render_metric_cards(frame, area, &summary, &theme);
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("$899.90M"));
        assert!(text.contains("9,648"));
    }
}
