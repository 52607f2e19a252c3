//! Source-file-keyed table cache for the dashboard runtime.
//!
//! Wraps [`reader::load`] with a cache keyed on the source file's
//! fingerprint (modified time and length). Callers use
//! [`DataManager::get_table`] to obtain the current [`Table`]; the manager
//! reloads only when forced or when the file changed on disk, and retries a
//! read that failed mid-write with a short back-off.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime};

use dashboard_core::error::LoadError;
use dashboard_core::models::Table;
use dashboard_data::reader;

/// Maximum number of load attempts for a file that exists but fails to read.
const MAX_RETRY_ATTEMPTS: u32 = 3;

// ── Fingerprint ───────────────────────────────────────────────────────────────

/// What identifies one version of the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl Fingerprint {
    /// Fingerprint of the file at `path`, or `None` when it cannot be stat'ed.
    pub fn of(path: &Path) -> Option<Self> {
        let meta = std::fs::metadata(path).ok()?;
        Some(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

// ── DataManager ───────────────────────────────────────────────────────────────

/// Owns the source path and the most recently loaded table.
///
/// # Example
/// ```no_run
/// use dashboard_runtime::data_manager::DataManager;
///
/// let mut mgr = DataManager::new("Adidas data.xlsx");
/// match mgr.get_table(false) {
///     Ok(table) => println!("{} transactions", table.len()),
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
pub struct DataManager {
    source: PathBuf,
    /// Most recently loaded table.
    cache: Option<Arc<Table>>,
    /// Fingerprint of the file the cached table was loaded from.
    fingerprint: Option<Fingerprint>,
}

impl DataManager {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            cache: None,
            fingerprint: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Return the current table, loading it when needed.
    ///
    /// With `force` the file is always re-read. Otherwise the cached table is
    /// returned as long as the file's fingerprint is unchanged. A failed
    /// load drops the cache: a table that no longer matches its source is
    /// never served.
    pub fn get_table(&mut self, force: bool) -> Result<Arc<Table>, LoadError> {
        let current = Fingerprint::of(&self.source);

        if !force {
            if let (Some(table), Some(cached)) = (self.cache.as_ref(), self.fingerprint) {
                if current == Some(cached) {
                    tracing::debug!("returning cached table");
                    return Ok(Arc::clone(table));
                }
            }
        }

        match self.load_with_retry() {
            Ok(table) => {
                tracing::debug!(
                    rows = table.len(),
                    warnings = table.warning_count(),
                    "table cache updated"
                );
                let table = Arc::new(table);
                self.cache = Some(Arc::clone(&table));
                self.fingerprint = current;
                Ok(table)
            }
            Err(e) => {
                tracing::warn!(error = %e, "load failed; dropping cached table");
                self.invalidate_cache();
                Err(e)
            }
        }
    }

    /// Discard the current cache, forcing the next [`get_table`] call to load.
    ///
    /// [`get_table`]: DataManager::get_table
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        self.fingerprint = None;
    }

    // ── Private helpers ───────────────────────────────────────────────────

    /// Load the source, retrying [`LoadError::Read`] with back-off
    /// (0 ms, 100 ms, 200 ms). Missing files and schema problems fail at once.
    fn load_with_retry(&self) -> Result<Table, LoadError> {
        let mut attempt = 0;
        loop {
            match reader::load(&self.source) {
                Ok(table) => return Ok(table),
                Err(e @ LoadError::Read { .. }) if attempt + 1 < MAX_RETRY_ATTEMPTS => {
                    attempt += 1;
                    let sleep_ms = u64::from(attempt) * 100;
                    tracing::debug!(attempt, sleep_ms, error = %e, "retrying load after back-off");
                    thread::sleep(Duration::from_millis(sleep_ms));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
