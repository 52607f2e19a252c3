use ratatui::style::{Color, Modifier, Style};

/// Terminal background type detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundType {
    Dark,
    Light,
    Unknown,
}

/// Detect terminal background type from the `COLORFGBG` environment variable.
///
/// The variable has the format `"foreground;background"`. Background values
/// 0–6 are considered dark; 7–15 are considered light. If the variable is
/// absent or unparseable, `BackgroundType::Dark` is returned.
pub fn detect_background() -> BackgroundType {
    if let Ok(val) = std::env::var("COLORFGBG") {
        return parse_colorfgbg(&val);
    }
    BackgroundType::Dark
}

fn parse_colorfgbg(val: &str) -> BackgroundType {
    match val.split(';').next_back().and_then(|bg| bg.parse::<u8>().ok()) {
        Some(bg) if bg <= 6 => BackgroundType::Dark,
        Some(_) => BackgroundType::Light,
        None => BackgroundType::Unknown,
    }
}

/// Every style the dashboard widgets draw with.
#[derive(Debug, Clone)]
pub struct Theme {
    // ── Header ───────────────────────────────────────────────────────────────
    pub header: Style,
    pub header_accent: Style,
    pub separator: Style,

    // ── Text ─────────────────────────────────────────────────────────────────
    pub text: Style,
    pub dim: Style,
    pub bold: Style,
    pub label: Style,
    pub value: Style,

    // ── Status ───────────────────────────────────────────────────────────────
    pub info: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,

    // ── Tabs ─────────────────────────────────────────────────────────────────
    pub tab: Style,
    pub tab_active: Style,

    // ── Metric cards ─────────────────────────────────────────────────────────
    pub card_border: Style,
    pub metric_label: Style,
    pub metric_value: Style,

    // ── Charts ───────────────────────────────────────────────────────────────
    /// Main bar colour (sales).
    pub bar_primary: Style,
    /// Second series colour (units).
    pub bar_secondary: Style,
    /// Bar value labels drawn inside the bars.
    pub bar_value: Style,
    pub profit_positive: Style,
    pub profit_negative: Style,
    /// Filled part of a share bar.
    pub share_fill: Style,
    /// Unfilled part of a share bar.
    pub share_empty: Style,
    pub axis: Style,
    /// Colours cycled through for multi-series line charts.
    pub series: Vec<Style>,

    // ── Table ────────────────────────────────────────────────────────────────
    pub table_header: Style,
    pub table_border: Style,
    pub table_row: Style,
    pub table_row_alt: Style,
    pub table_total: Style,
}

impl Theme {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Dark-background terminal theme (default).
    pub fn dark() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::Yellow),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::Gray),
            value: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            tab: Style::default().fg(Color::Gray),
            tab_active: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),

            card_border: Style::default().fg(Color::DarkGray),
            metric_label: Style::default().fg(Color::Gray),
            metric_value: Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),

            bar_primary: Style::default().fg(Color::Blue),
            bar_secondary: Style::default().fg(Color::Magenta),
            bar_value: Style::default().fg(Color::White).bg(Color::Blue),
            profit_positive: Style::default().fg(Color::Green),
            profit_negative: Style::default().fg(Color::Red),
            share_fill: Style::default().fg(Color::Cyan),
            share_empty: Style::default().fg(Color::DarkGray),
            axis: Style::default().fg(Color::Gray),
            series: vec![
                Style::default().fg(Color::Cyan),
                Style::default().fg(Color::Yellow),
                Style::default().fg(Color::Green),
                Style::default().fg(Color::Magenta),
                Style::default().fg(Color::LightRed),
                Style::default().fg(Color::LightBlue),
            ],

            table_header: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Light-background terminal theme.
    ///
    /// Uses dark colours for text and saturated accents so that content
    /// remains legible against a white/light-grey terminal canvas.
    pub fn light() -> Self {
        Self {
            header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            header_accent: Style::default().fg(Color::Magenta),
            separator: Style::default().fg(Color::Gray),

            text: Style::default().fg(Color::Black),
            dim: Style::default().fg(Color::Gray),
            bold: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            label: Style::default().fg(Color::DarkGray),
            value: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),

            info: Style::default().fg(Color::Blue),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            tab: Style::default().fg(Color::DarkGray),
            tab_active: Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),

            card_border: Style::default().fg(Color::Gray),
            metric_label: Style::default().fg(Color::DarkGray),
            metric_value: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),

            bar_primary: Style::default().fg(Color::Blue),
            bar_secondary: Style::default().fg(Color::Magenta),
            bar_value: Style::default().fg(Color::White).bg(Color::Blue),
            profit_positive: Style::default().fg(Color::Green),
            profit_negative: Style::default().fg(Color::Red),
            share_fill: Style::default().fg(Color::Blue),
            share_empty: Style::default().fg(Color::Gray),
            axis: Style::default().fg(Color::DarkGray),
            series: vec![
                Style::default().fg(Color::Blue),
                Style::default().fg(Color::Magenta),
                Style::default().fg(Color::Green),
                Style::default().fg(Color::Red),
                Style::default().fg(Color::Cyan),
                Style::default().fg(Color::DarkGray),
            ],

            table_header: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            table_border: Style::default().fg(Color::Gray),
            table_row: Style::default().fg(Color::Black),
            table_row_alt: Style::default().fg(Color::DarkGray),
            table_total: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        }
    }

    /// Classic terminal theme using only the basic 8-colour ANSI palette.
    ///
    /// Avoids bold modifiers to maximise compatibility with minimal terminal
    /// emulators.
    pub fn classic() -> Self {
        Self {
            header: Style::default().fg(Color::Cyan),
            header_accent: Style::default().fg(Color::White),
            separator: Style::default().fg(Color::DarkGray),

            text: Style::default().fg(Color::White),
            dim: Style::default().fg(Color::DarkGray),
            bold: Style::default().fg(Color::White),
            label: Style::default().fg(Color::Gray),
            value: Style::default().fg(Color::White),

            info: Style::default().fg(Color::Cyan),
            success: Style::default().fg(Color::Green),
            warning: Style::default().fg(Color::Yellow),
            error: Style::default().fg(Color::Red),

            tab: Style::default().fg(Color::White),
            tab_active: Style::default().fg(Color::Black).bg(Color::White),

            card_border: Style::default().fg(Color::DarkGray),
            metric_label: Style::default().fg(Color::Gray),
            metric_value: Style::default().fg(Color::Cyan),

            bar_primary: Style::default().fg(Color::Cyan),
            bar_secondary: Style::default().fg(Color::Magenta),
            bar_value: Style::default().fg(Color::Black).bg(Color::Cyan),
            profit_positive: Style::default().fg(Color::Green),
            profit_negative: Style::default().fg(Color::Red),
            share_fill: Style::default().fg(Color::Cyan),
            share_empty: Style::default().fg(Color::DarkGray),
            axis: Style::default().fg(Color::White),
            series: vec![
                Style::default().fg(Color::Cyan),
                Style::default().fg(Color::Yellow),
                Style::default().fg(Color::Green),
                Style::default().fg(Color::Magenta),
                Style::default().fg(Color::Red),
                Style::default().fg(Color::Blue),
            ],

            table_header: Style::default().fg(Color::Cyan),
            table_border: Style::default().fg(Color::DarkGray),
            table_row: Style::default().fg(Color::White),
            table_row_alt: Style::default().fg(Color::Gray),
            table_total: Style::default().fg(Color::Yellow),
        }
    }

    /// Choose a theme automatically based on the detected terminal background.
    pub fn auto_detect() -> Self {
        match detect_background() {
            BackgroundType::Light => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Construct a theme by name. Falls back to `auto_detect` for unknown
    /// names.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            "dark" => Self::dark(),
            "classic" => Self::classic(),
            _ => Self::auto_detect(),
        }
    }

    // ── Style helpers ────────────────────────────────────────────────────────

    /// Green for gains, red for losses. Zero counts as a gain.
    pub fn profit_style(&self, amount: f64) -> Style {
        if amount < 0.0 {
            self.profit_negative
        } else {
            self.profit_positive
        }
    }

    /// Style for the `index`-th series of a multi-line chart, cycling.
    pub fn series_style(&self, index: usize) -> Style {
        if self.series.is_empty() {
            return self.text;
        }
        self.series[index % self.series.len()]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dark_theme_creation() {
        let t = Theme::dark();
        assert_eq!(t.header.fg, Some(Color::Cyan));
        assert_eq!(t.success.fg, Some(Color::Green));
        assert_eq!(t.error.fg, Some(Color::Red));
        assert_eq!(t.bar_primary.fg, Some(Color::Blue));
        assert_eq!(t.tab_active.bg, Some(Color::Cyan));
    }

    #[test]
    fn test_light_theme_creation() {
        let t = Theme::light();
        assert_eq!(t.header.fg, Some(Color::Blue));
        assert_eq!(t.text.fg, Some(Color::Black));
        assert_eq!(t.table_row.fg, Some(Color::Black));
    }

    #[test]
    fn test_classic_theme_has_no_bold() {
        let t = Theme::classic();
        assert!(!t.bold.add_modifier.contains(Modifier::BOLD));
        assert!(!t.metric_value.add_modifier.contains(Modifier::BOLD));
        assert!(!t.tab_active.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Theme::from_name("dark").header.fg, Some(Color::Cyan));
        assert_eq!(Theme::from_name("light").header.fg, Some(Color::Blue));
        assert!(!Theme::from_name("classic")
            .header
            .add_modifier
            .contains(Modifier::BOLD));
    }

    #[test]
    fn test_from_name_unknown_does_not_panic() {
        let _ = Theme::from_name("neon");
    }

    #[test]
    fn test_parse_colorfgbg() {
        assert_eq!(parse_colorfgbg("15;0"), BackgroundType::Dark);
        assert_eq!(parse_colorfgbg("0;15"), BackgroundType::Light);
        assert_eq!(parse_colorfgbg("0;default"), BackgroundType::Unknown);
    }

    #[test]
    fn test_profit_style() {
        let t = Theme::dark();
        assert_eq!(t.profit_style(-1.0), t.profit_negative);
        assert_eq!(t.profit_style(0.0), t.profit_positive);
        assert_eq!(t.profit_style(10.0), t.profit_positive);
    }

    #[test]
    fn test_series_style_cycles() {
        let t = Theme::dark();
        let n = t.series.len();
        assert_eq!(t.series_style(0), t.series_style(n));
        assert_ne!(t.series_style(0), t.series_style(1));
    }
}
