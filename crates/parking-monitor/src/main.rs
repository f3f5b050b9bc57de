mod bootstrap;

use anyhow::{Context, Result};
use monitor_core::settings::Settings;
use monitor_data::analysis::ingest_from;
use monitor_data::reader::{FileTableSource, TableSource};
use monitor_runtime::orchestrator::MonitoringOrchestrator;
use monitor_ui::app::{self, App};

use crate::bootstrap::LogTarget;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    let log_target = match settings.view.as_str() {
        "report" => LogTarget::Stderr,
        _ => LogTarget::File(
            settings
                .log_file
                .clone()
                .unwrap_or_else(bootstrap::default_log_file),
        ),
    };
    bootstrap::setup_logging(&settings.log_level, log_target)?;

    tracing::info!("Parking Monitor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "View: {}, Theme: {}, Timezone: {}, Refresh: {}s",
        settings.view,
        settings.theme,
        settings.timezone,
        settings.refresh_rate
    );

    let source = FileTableSource::new(settings.source_or_default());
    tracing::info!("Reading detections from {}", source.describe());

    match settings.view.as_str() {
        "realtime" => run_realtime(&settings, source).await?,
        "report" => run_report(&source)?,
        unknown => eprintln!("Unknown view mode: {}", unknown),
    }

    Ok(())
}

async fn run_realtime(settings: &Settings, source: FileTableSource) -> Result<()> {
    tracing::info!("Starting real-time monitoring...");

    let refresh_secs = u64::from(settings.refresh_rate);
    let orchestrator = MonitoringOrchestrator::new(refresh_secs, Box::new(source));
    let (rx, handle) = orchestrator.start();

    let app = App::new(
        &settings.theme,
        &settings.timezone,
        refresh_secs,
        usize::from(settings.history_rows),
    );

    // The TUI handles 'q' / Ctrl+C itself; the OS-level signal covers the
    // case where the key never reaches it.
    tokio::select! {
        result = app.run_realtime(rx, &handle) => {
            handle.abort();
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received; shutting down monitoring task");
            handle.abort();
            app::restore_terminal()?;
        }
    }

    Ok(())
}

/// Ingest once and print the statistics as JSON. Fails on schema errors.
fn run_report(source: &FileTableSource) -> Result<()> {
    let ingestion = ingest_from(source)
        .with_context(|| format!("failed to ingest {}", source.describe()))?;

    println!("{}", serde_json::to_string_pretty(&ingestion.stats)?);
    Ok(())
}
