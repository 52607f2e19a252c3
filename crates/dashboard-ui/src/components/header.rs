use crate::themes::Theme;
use ratatui::text::{Line, Span};

/// Title shown on the first header line.
pub const TITLE: &str = "📊 INTERACTIVE SALES DASHBOARD";

/// Width of the `=` separator under the title.
pub const SEPARATOR_WIDTH: usize = 60;

/// Dashboard header rendering four lines:
///
/// 1. Application title.
/// 2. A 60-column `=` separator.
/// 3. Source file and timezone in `[ source | timezone ]` format.
/// 4. An empty line.
pub struct Header<'a> {
    /// File name of the loaded spreadsheet.
    pub source: &'a str,
    /// Display timezone (e.g. "UTC", "America/New_York").
    pub timezone: &'a str,
    pub theme: &'a Theme,
}

impl<'a> Header<'a> {
    pub fn new(source: &'a str, timezone: &'a str, theme: &'a Theme) -> Self {
        Self {
            source,
            timezone,
            theme,
        }
    }

    /// Render the header as exactly four lines.
    pub fn to_lines(&self) -> Vec<Line<'a>> {
        vec![
            Line::from(Span::styled(TITLE, self.theme.header)),
            Line::from(Span::styled(
                "=".repeat(SEPARATOR_WIDTH),
                self.theme.separator,
            )),
            Line::from(vec![
                Span::styled("[ ", self.theme.label),
                Span::styled(self.source, self.theme.header_accent),
                Span::styled(" | ", self.theme.label),
                Span::styled(self.timezone, self.theme.value),
                Span::styled(" ]", self.theme.label),
            ]),
            Line::from(""),
        ]
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_header_to_lines_count() {
        let theme = Theme::dark();
        let lines = Header::new("sales.xlsx", "UTC", &theme).to_lines();
        assert_eq!(lines.len(), 4, "header must produce exactly 4 lines");
    }

    #[test]
    fn test_header_title_line_content() {
        let theme = Theme::dark();
        let lines = Header::new("sales.xlsx", "UTC", &theme).to_lines();
        assert_eq!(text(&lines[0]), TITLE);
    }

    #[test]
    fn test_header_separator_line() {
        let theme = Theme::dark();
        let lines = Header::new("sales.xlsx", "Europe/London", &theme).to_lines();
        let sep = text(&lines[1]);
        assert_eq!(sep.chars().count(), 60);
        assert!(sep.chars().all(|c| c == '='), "got: {sep}");
    }

    #[test]
    fn test_header_info_line_keeps_case() {
        let theme = Theme::dark();
        let lines = Header::new("Adidas data.xlsx", "America/New_York", &theme).to_lines();
        assert_eq!(text(&lines[2]), "[ Adidas data.xlsx | America/New_York ]");
        assert_eq!(lines[2].spans.len(), 5);
    }

    #[test]
    fn test_header_empty_fourth_line() {
        let theme = Theme::dark();
        let lines = Header::new("sales.xlsx", "UTC", &theme).to_lines();
        assert!(text(&lines[3]).is_empty());
    }
}
