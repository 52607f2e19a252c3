//! Main application state and TUI event loop for the sales dashboard.
//!
//! [`App`] owns the theme, the active tab and the last received snapshot.
//! Key events and [`DashboardUpdate`]s from the reload loop are the only
//! things that change it.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use tokio::sync::mpsc;

use dashboard_core::time_utils::format_last_updated;
use dashboard_data::export;
use dashboard_runtime::orchestrator::{DashboardHandle, DashboardSnapshot, DashboardUpdate};

use crate::components::header::Header;
use crate::components::metric_card::render_metric_cards;
use crate::dashboard_view::{self, Tab, TabContext};
use crate::table_view;
use crate::themes::Theme;

/// Rows moved by PageUp / PageDown in the data explorer.
const PAGE_SCROLL: usize = 10;

/// Side effects a key press asks the event loop to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    /// Force the reload loop to re-read the source file.
    Reload,
    /// Write every CSV download to the export directory.
    Export,
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the dashboard TUI.
pub struct App {
    pub theme: Theme,
    /// Display timezone name (IANA).
    pub timezone: String,
    pub export_dir: PathBuf,
    pub active_tab: Tab,
    /// First visible row of the data explorer.
    pub scroll: usize,
    /// Last successfully built snapshot. Cleared when a load fails.
    pub snapshot: Option<Arc<DashboardSnapshot>>,
    /// Message of the last load failure.
    pub error: Option<String>,
    /// One-line feedback for the last action (export, reload).
    pub status: Option<String>,
    /// When the current snapshot arrived.
    pub last_updated: Option<DateTime<Utc>>,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
}

impl App {
    pub fn new(theme_name: &str, timezone: String, export_dir: PathBuf) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            timezone,
            export_dir,
            active_tab: Tab::SalesOverview,
            scroll: 0,
            snapshot: None,
            error: None,
            status: None,
            last_updated: None,
            should_quit: false,
        }
    }

    // ── State transitions ─────────────────────────────────────────────────────

    /// Apply one message from the reload loop.
    ///
    /// A failure drops the current snapshot: charts are never drawn from a
    /// table that no longer matches the source file.
    pub fn apply_update(&mut self, update: DashboardUpdate) {
        match update {
            DashboardUpdate::Ready(snapshot) => {
                let rows = snapshot.table.len();
                self.scroll = self.scroll.min(rows.saturating_sub(1));
                self.snapshot = Some(snapshot);
                self.error = None;
                self.last_updated = Some(Utc::now());
                self.status = Some(format!("Loaded {} transactions", rows));
            }
            DashboardUpdate::Failed(message) => {
                tracing::warn!(error = %message, "dashboard load failed");
                self.snapshot = None;
                self.error = Some(message);
                self.status = None;
            }
        }
    }

    /// Update state for one key press and return any side effect the event
    /// loop must perform.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => {
                self.active_tab = self.active_tab.next();
            }
            KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
                self.active_tab = self.active_tab.prev();
            }
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                if let Some(tab) = Tab::from_index(index) {
                    self.active_tab = tab;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.scroll_by(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll_by(PAGE_SCROLL),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(PAGE_SCROLL),
            KeyCode::Home | KeyCode::Char('g') => self.scroll = 0,
            KeyCode::Char('e') => return Some(AppAction::Export),
            KeyCode::Char('r') => return Some(AppAction::Reload),
            _ => {}
        }
        None
    }

    fn scroll_by(&mut self, rows: usize) {
        let max = self
            .snapshot
            .as_ref()
            .map_or(0, |s| s.table.len().saturating_sub(1));
        self.scroll = (self.scroll + rows).min(max);
    }

    /// Write every CSV download for the current snapshot and record the
    /// outcome in the status line.
    pub fn export(&mut self) {
        let Some(snapshot) = self.snapshot.as_ref() else {
            self.status = Some("Nothing to export: no data loaded".to_string());
            return;
        };
        match export::export_all(&snapshot.data, &snapshot.table, &self.export_dir) {
            Ok(paths) => {
                self.status = Some(format!(
                    "Exported {} files to {}",
                    paths.len(),
                    self.export_dir.display()
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "export failed");
                self.status = Some(format!("Export failed: {}", e));
            }
        }
    }

    // ── Public event loop ─────────────────────────────────────────────────────

    /// Run the dashboard TUI, receiving snapshots from `rx`.
    ///
    /// Uses `crossterm::event::poll` (synchronous, with a 250 ms timeout) so
    /// that the terminal event loop stays on the current thread while
    /// updates arrive on the async channel via `try_recv`.
    pub async fn run(
        mut self,
        mut rx: mpsc::Receiver<DashboardUpdate>,
        handle: DashboardHandle,
    ) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) => match self.handle_key(key) {
                        Some(AppAction::Export) => self.export(),
                        Some(AppAction::Reload) => {
                            self.status = Some(if handle.request_reload() {
                                "Reloading...".to_string()
                            } else {
                                "Reload already pending".to_string()
                            });
                        }
                        None => {}
                    },
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            // Drain any pending updates (non-blocking).
            loop {
                match rx.try_recv() {
                    Ok(update) => self.apply_update(update),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        self.should_quit = true;
                        break;
                    }
                }
            }

            if self.should_quit {
                break Ok(());
            }
        };

        handle.abort();

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render the current application state into `frame`.
    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let Some(snapshot) = self.snapshot.as_ref() else {
            match self.error.as_deref() {
                Some(message) => table_view::render_error(frame, area, message, &self.theme),
                None => frame.render_widget(
                    Paragraph::new(Line::from(Span::styled(
                        "Loading sales data...",
                        self.theme.info,
                    )))
                    .alignment(Alignment::Center),
                    area,
                ),
            }
            return;
        };

        let [header, cards, tabs, body, footer] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .areas(area);

        let source = snapshot
            .table
            .source()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let header_lines = Header::new(&source, &self.timezone, &self.theme).to_lines();
        frame.render_widget(Paragraph::new(header_lines), header);

        render_metric_cards(frame, cards, &snapshot.data.summary, &self.theme);
        dashboard_view::render_tabs(frame, tabs, self.active_tab, &self.theme);

        let ctx = TabContext {
            snapshot,
            scroll: self.scroll,
            export_dir: &self.export_dir,
            theme: &self.theme,
        };
        dashboard_view::render_tab(frame, body, self.active_tab, &ctx);

        self.render_footer(frame, footer, snapshot);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot) {
        let updated = self.last_updated.unwrap_or_else(Utc::now);
        let mut spans = vec![
            Span::styled("Sales Dashboard • Last Updated: ", self.theme.dim),
            Span::styled(
                format_last_updated(updated, &self.timezone),
                self.theme.label,
            ),
        ];

        let warnings = snapshot.data.summary.warning_count;
        if warnings > 0 {
            spans.push(Span::styled(
                format!("  ⚠ {} cells replaced", warnings),
                self.theme.warning,
            ));
        }
        if let Some(status) = &self.status {
            spans.push(Span::styled(format!("  {}", status), self.theme.info));
        }
        spans.push(Span::styled(
            "  [tab] switch  [e] export  [r] reload  [q] quit",
            self.theme.dim,
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
