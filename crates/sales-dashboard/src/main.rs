mod bootstrap;

use std::path::Path;

use anyhow::{Context, Result};
use dashboard_core::settings::Settings;
use dashboard_data::analysis::analyze_file;
use dashboard_data::export::export_all;
use dashboard_runtime::orchestrator::DashboardOrchestrator;
use dashboard_ui::app::App;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    let app_dir = bootstrap::ensure_directories()?;
    let dashboard_mode = settings.view == "dashboard";
    // The TUI owns the terminal, so dashboard mode always logs to a file.
    let log_file = settings.log_file.clone().or_else(|| {
        dashboard_mode.then(|| app_dir.join("logs").join(bootstrap::DEFAULT_LOG_FILE))
    });
    bootstrap::setup_logging(&settings.log_level, log_file.as_deref())?;

    tracing::info!("Sales Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Theme: {}, Timezone: {}",
        settings.view,
        settings.theme,
        settings.timezone
    );

    let cwd = std::env::current_dir().context("cannot read the working directory")?;
    let source = bootstrap::resolve_data_path(settings.file.as_deref(), &cwd);
    tracing::info!("Source: {}", source.display());

    match settings.view.as_str() {
        "dashboard" => run_dashboard(&settings, &source).await,
        "summary" => print_summary(&source),
        "export" => run_export(&settings, &source),
        unknown => anyhow::bail!("Unknown view: {}", unknown),
    }
}

async fn run_dashboard(settings: &Settings, source: &Path) -> Result<()> {
    tracing::info!("Starting dashboard...");

    let orchestrator = DashboardOrchestrator::new(u64::from(settings.refresh_rate), source);
    let (rx, handle) = orchestrator.start();

    let app = App::new(
        &settings.theme,
        settings.timezone.clone(),
        settings.export_dir_or_default(),
    );

    // The loop exits on 'q' / Ctrl+C inside the TUI. The OS-level handler
    // covers signals that arrive before raw mode is enabled.
    tokio::select! {
        result = app.run(rx, handle) => {
            result.context("terminal UI failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received; shutting down");
        }
    }
    Ok(())
}

fn print_summary(source: &Path) -> Result<()> {
    let (_, data) =
        analyze_file(source).with_context(|| format!("failed to load {}", source.display()))?;
    println!("{}", serde_json::to_string_pretty(&data.summary)?);
    Ok(())
}

fn run_export(settings: &Settings, source: &Path) -> Result<()> {
    let (table, data) =
        analyze_file(source).with_context(|| format!("failed to load {}", source.display()))?;
    let dir = settings.export_dir_or_default();
    let paths = export_all(&data, &table, &dir)
        .with_context(|| format!("failed to export to {}", dir.display()))?;
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}
