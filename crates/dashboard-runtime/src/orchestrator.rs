//! Async reload orchestrator.
//!
//! Runs [`DataManager`] in a tokio task that loads the source file once,
//! then checks it for changes every refresh interval. Each new table is turned
//! into a [`DashboardSnapshot`] and sent through an `mpsc` channel so the TUI
//! event loop can consume it without any shared mutable state.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dashboard_core::models::Table;
use dashboard_data::analysis::{build_dashboard, DashboardData};
use tokio::sync::mpsc;
use tokio::time;

use crate::data_manager::DataManager;

// ── Public types ──────────────────────────────────────────────────────────────

/// One loaded table and everything computed from it.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub table: Arc<Table>,
    pub data: DashboardData,
}

impl DashboardSnapshot {
    pub fn new(table: Arc<Table>) -> Self {
        let data = build_dashboard(&table);
        Self { table, data }
    }
}

/// A message from the background runtime to the presentation layer.
#[derive(Debug, Clone)]
pub enum DashboardUpdate {
    /// A table was (re)loaded.
    Ready(Arc<DashboardSnapshot>),
    /// Loading failed; the previous snapshot must no longer be shown.
    Failed(String),
}

/// Ask the loop to re-read the source file immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadRequest;

// ── DashboardOrchestrator ─────────────────────────────────────────────────────

/// Background reload coordinator.
///
/// Call [`DashboardOrchestrator::start`] to spin up the loop in a dedicated
/// tokio task and receive a channel endpoint for [`DashboardUpdate`]s.
pub struct DashboardOrchestrator {
    /// How often the source file is checked for changes.
    refresh_interval: Duration,
    source: PathBuf,
}

impl DashboardOrchestrator {
    pub fn new(refresh_interval_secs: u64, source: impl Into<PathBuf>) -> Self {
        Self {
            refresh_interval: Duration::from_secs(refresh_interval_secs.max(1)),
            source: source.into(),
        }
    }

    /// Start the reload loop.
    ///
    /// Returns the update receiver and a [`DashboardHandle`] used to request
    /// reloads and to stop the loop.
    pub fn start(self) -> (mpsc::Receiver<DashboardUpdate>, DashboardHandle) {
        // Buffer a few snapshots so a slow consumer doesn't stall the loop.
        let (tx, rx) = mpsc::channel(16);
        let (reload_tx, reload_rx) = mpsc::channel(4);

        let handle = tokio::spawn(async move {
            self.reload_loop(tx, reload_rx).await;
        });

        (rx, DashboardHandle { handle, reload_tx })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// Loads immediately, then on every tick or reload request. Exits when
    /// either channel is closed.
    async fn reload_loop(
        self,
        tx: mpsc::Sender<DashboardUpdate>,
        mut reload_rx: mpsc::Receiver<ReloadRequest>,
    ) {
        let mut state = LoopState {
            manager: DataManager::new(&self.source),
            last_table: None,
            last_error: None,
        };

        if !state.refresh(&tx, true).await {
            return;
        }

        let mut interval = time::interval(self.refresh_interval);
        // The first tick fires immediately; the initial load already ran.
        interval.tick().await;

        loop {
            let force = tokio::select! {
                _ = interval.tick() => false,
                request = reload_rx.recv() => match request {
                    Some(ReloadRequest) => true,
                    None => {
                        tracing::debug!("reload handle dropped; exiting loop");
                        break;
                    }
                },
            };

            if tx.is_closed() || !state.refresh(&tx, force).await {
                tracing::debug!("dashboard channel closed; exiting loop");
                break;
            }
        }
    }
}

/// Mutable state owned by the reload task.
struct LoopState {
    manager: DataManager,
    /// Table behind the last `Ready` sent, to skip unchanged reloads.
    last_table: Option<Arc<Table>>,
    /// Message of the last `Failed` sent, to avoid repeating it every tick.
    last_error: Option<String>,
}

impl LoopState {
    /// Reload if needed and send an update when something changed. Returns
    /// `false` once the receiver is gone.
    async fn refresh(&mut self, tx: &mpsc::Sender<DashboardUpdate>, force: bool) -> bool {
        let update = match self.manager.get_table(force) {
            Ok(table) => {
                let unchanged = self
                    .last_table
                    .as_ref()
                    .is_some_and(|last| Arc::ptr_eq(last, &table));
                if unchanged {
                    return true;
                }
                self.last_table = Some(Arc::clone(&table));
                self.last_error = None;
                tracing::info!(rows = table.len(), "dashboard snapshot rebuilt");
                DashboardUpdate::Ready(Arc::new(DashboardSnapshot::new(table)))
            }
            Err(e) => {
                let message = e.to_string();
                if self.last_error.as_deref() == Some(message.as_str()) && !force {
                    return true;
                }
                self.last_table = None;
                self.last_error = Some(message.clone());
                DashboardUpdate::Failed(message)
            }
        };

        if let Err(e) = tx.send(update).await {
            tracing::warn!(error = %e, "failed to send dashboard update; receiver dropped");
            return false;
        }
        true
    }
}

// ── DashboardHandle ───────────────────────────────────────────────────────────

/// A handle to the background reload task.
///
/// Dropping the handle closes the reload channel, which ends the loop.
pub struct DashboardHandle {
    handle: tokio::task::JoinHandle<()>,
    reload_tx: mpsc::Sender<ReloadRequest>,
}

impl DashboardHandle {
    /// Ask for an immediate reload. Returns `false` when a reload is already
    /// queued or the loop has stopped.
    pub fn request_reload(&self) -> bool {
        self.reload_tx.try_send(ReloadRequest).is_ok()
    }

    /// Immediately abort the reload loop.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
