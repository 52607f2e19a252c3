use dashboard_core::formatting::{format_compact_currency, percentage};
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::themes::Theme;

/// Configuration controlling visual appearance of a share bar.
pub struct ShareBarConfig {
    /// Width in terminal columns of the bar portion (excluding labels).
    pub width: u16,
    /// Columns reserved for the leading label.
    pub label_width: usize,
    pub filled_char: char,
    pub empty_char: char,
}

impl Default for ShareBarConfig {
    fn default() -> Self {
        Self {
            width: 30,
            label_width: 14,
            filled_char: '\u{2588}', // █  FULL BLOCK
            empty_char: '\u{2591}',  // ░  LIGHT SHADE
        }
    }
}

/// Pad or truncate `label` to exactly `width` display columns.
pub fn fit_label(label: &str, width: usize) -> String {
    if label.width() <= width {
        return format!("{}{}", label, " ".repeat(width - label.width()));
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in label.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    used += 1;
    out.push_str(&" ".repeat(width.saturating_sub(used)));
    out
}

// ── ShareBar ──────────────────────────────────────────────────────────────────

/// Horizontal bar showing one part's share of a whole, used in place of a
/// pie chart.
///
/// Renders as `label ████░░░░ 35.2% ($1.2M)`.
pub struct ShareBar<'a> {
    pub label: String,
    pub value: f64,
    /// Share of the whole in percent, clamped to `[0.0, 100.0]`.
    pub percentage: f64,
    pub theme: &'a Theme,
    pub config: ShareBarConfig,
}

impl<'a> ShareBar<'a> {
    /// Construct a bar for `value` out of `whole`. A zero whole gives 0 %.
    pub fn new(label: impl Into<String>, value: f64, whole: f64, theme: &'a Theme) -> Self {
        Self {
            label: label.into(),
            value,
            percentage: percentage(value, whole, 1).clamp(0.0, 100.0),
            theme,
            config: ShareBarConfig::default(),
        }
    }

    pub fn to_line(&self) -> Line<'a> {
        let filled = ((self.percentage / 100.0) * self.config.width as f64).round() as u16;
        let filled = filled.min(self.config.width);
        let empty = self.config.width - filled;

        let filled_str: String =
            std::iter::repeat_n(self.config.filled_char, filled as usize).collect();
        let empty_str: String =
            std::iter::repeat_n(self.config.empty_char, empty as usize).collect();

        Line::from(vec![
            Span::styled(
                fit_label(&self.label, self.config.label_width),
                self.theme.label,
            ),
            Span::raw(" "),
            Span::styled(filled_str, self.theme.share_fill),
            Span::styled(empty_str, self.theme.share_empty),
            Span::styled(
                format!(
                    " {:.1}% ({})",
                    self.percentage,
                    format_compact_currency(self.value)
                ),
                self.theme.dim,
            ),
        ])
    }
}

// ── SignedBar ─────────────────────────────────────────────────────────────────

/// Bar whose length is `|value|` relative to the largest magnitude in its
/// group, coloured by sign. Used for the funnel and waterfall.
///
/// Renders as `label ██████ $1.2M`.
pub struct SignedBar<'a> {
    pub label: String,
    pub value: f64,
    /// Largest absolute value among the bars drawn together.
    pub max_abs: f64,
    pub theme: &'a Theme,
    pub config: ShareBarConfig,
}

impl<'a> SignedBar<'a> {
    pub fn new(label: impl Into<String>, value: f64, max_abs: f64, theme: &'a Theme) -> Self {
        Self {
            label: label.into(),
            value,
            max_abs,
            theme,
            config: ShareBarConfig::default(),
        }
    }

    /// Number of filled columns; at least one for any non-zero value.
    pub fn filled_width(&self) -> u16 {
        if self.max_abs <= 0.0 || self.value == 0.0 {
            return 0;
        }
        let ratio = (self.value.abs() / self.max_abs).min(1.0);
        ((ratio * self.config.width as f64).round() as u16).max(1)
    }

    pub fn to_line(&self) -> Line<'a> {
        let filled: String =
            std::iter::repeat_n(self.config.filled_char, self.filled_width() as usize).collect();
        let style = self.theme.profit_style(self.value);

        Line::from(vec![
            Span::styled(
                fit_label(&self.label, self.config.label_width),
                self.theme.label,
            ),
            Span::raw(" "),
            Span::styled(filled, style),
            Span::styled(format!(" {}", format_compact_currency(self.value)), style),
        ])
    }
}

/// Largest absolute value in `values`, `0.0` when empty.
pub fn max_abs(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_share_bar_to_line() {
        let theme = Theme::dark();
        let bar = ShareBar::new("West", 250.0, 1000.0, &theme);
        let line = bar.to_line();
        assert_eq!(line.spans.len(), 5, "label, gap, filled, empty, figure");

        // 25 % of 30 columns rounds to 8.
        assert_eq!(line.spans[2].content.chars().count(), 8);
        assert!(line.spans[2].content.chars().all(|c| c == '█'));
        assert_eq!(line.spans[3].content.chars().count(), 22);

        let figure = &line.spans[4].content;
        assert!(figure.contains("25.0%"), "figure was: {figure}");
        assert!(figure.contains("$250"), "figure was: {figure}");
    }

    #[test]
    fn test_share_bar_zero_whole() {
        let theme = Theme::dark();
        let bar = ShareBar::new("East", 500.0, 0.0, &theme);
        assert_eq!(bar.percentage, 0.0);
        let line = bar.to_line();
        assert!(line.spans[2].content.is_empty());
        assert_eq!(line.spans[3].content.chars().count(), 30);
    }

    #[test]
    fn test_share_bar_full() {
        let theme = Theme::dark();
        let line = ShareBar::new("All", 80.0, 80.0, &theme).to_line();
        assert_eq!(line.spans[2].content.chars().count(), 30);
        assert!(line.spans[3].content.is_empty());
        assert!(line.spans[4].content.contains("100.0%"));
    }

    #[test]
    fn test_share_bar_negative_value_clamped() {
        let theme = Theme::dark();
        let bar = ShareBar::new("Loss", -10.0, 100.0, &theme);
        assert_eq!(bar.percentage, 0.0);
    }

    #[test]
    fn test_signed_bar_width_and_style() {
        let theme = Theme::dark();
        let bar = SignedBar::new("Costs", -50.0, 100.0, &theme);
        assert_eq!(bar.filled_width(), 15);
        let line = bar.to_line();
        assert_eq!(line.spans[2].style, theme.profit_negative);
        assert!(text(&line).contains("-$50"));
    }

    #[test]
    fn test_signed_bar_tiny_value_still_visible() {
        let theme = Theme::dark();
        assert_eq!(SignedBar::new("x", 0.01, 1e9, &theme).filled_width(), 1);
        assert_eq!(SignedBar::new("x", 0.0, 1e9, &theme).filled_width(), 0);
        assert_eq!(SignedBar::new("x", 5.0, 0.0, &theme).filled_width(), 0);
    }

    #[test]
    fn test_max_abs() {
        assert_eq!(max_abs([3.0, -7.0, 5.0]), 7.0);
        assert_eq!(max_abs(Vec::<f64>::new()), 0.0);
    }

    #[test]
    fn test_fit_label_pads_and_truncates() {
        assert_eq!(fit_label("West", 6), "West  ");
        let cut = fit_label("Men's Street Footwear", 10);
        assert_eq!(cut.width(), 10);
        assert!(cut.contains('…'));
    }
}
