use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dashboard_core::settings::APP_DIR_NAME;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Spreadsheets looked for in the working directory when `--file` is not
/// given, in order.
pub const DATA_FILE_CANDIDATES: [&str; 3] = ["Adidas data.xlsx", "sales_data.xlsx", "sales_data.csv"];

/// Log file written in dashboard mode when `--log-file` is not given.
pub const DEFAULT_LOG_FILE: &str = "dashboard.log";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure the `~/.sales-dashboard/` directory hierarchy exists and return
/// its root.
pub fn ensure_directories() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    ensure_directories_in(&home)
}

/// Create `<base>/.sales-dashboard/{logs,exports}` if absent.
pub fn ensure_directories_in(base: &Path) -> anyhow::Result<PathBuf> {
    let app_dir = base.join(APP_DIR_NAME);
    std::fs::create_dir_all(app_dir.join("logs"))?;
    std::fs::create_dir_all(app_dir.join("exports"))?;
    Ok(app_dir)
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name to an [`EnvFilter`] directive.
///
/// `CRITICAL` has no tracing counterpart and maps to `error`. Unknown names
/// are passed through so `RUST_LOG`-style directives still work.
pub fn filter_directive(log_level: &str) -> String {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// With `log_file` every event is appended to that file and nothing is
/// written to the terminal, which the TUI owns. Without it events go to
/// stderr.
pub fn setup_logging(log_level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    let stderr_layer = file_layer
        .is_none()
        .then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(())
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// First of [`DATA_FILE_CANDIDATES`] that exists in `dir`.
pub fn discover_data_path(dir: &Path) -> Option<PathBuf> {
    DATA_FILE_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// The source file to load: `--file` when given, else a discovered file in
/// `cwd`, else `cwd/Adidas data.xlsx` so the loader reports it as missing.
pub fn resolve_data_path(explicit: Option<&Path>, cwd: &Path) -> PathBuf {
    match explicit {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => discover_data_path(cwd).unwrap_or_else(|| cwd.join(DATA_FILE_CANDIDATES[0])),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
