use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use monitor_core::settings::APP_DIR;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name of the realtime view's log inside `~/.parking-monitor/logs/`.
pub const LOG_FILE_NAME: &str = "parking-monitor.log";

// ── Directory bootstrap ────────────────────────────────────────────────────────

/// Ensure the `~/.parking-monitor/` hierarchy exists and return its root.
///
/// Creates, including any missing parents:
/// - `~/.parking-monitor/`
/// - `~/.parking-monitor/logs/`
/// - `~/.parking-monitor/data/` (default place to drop exports)
pub fn ensure_directories() -> anyhow::Result<PathBuf> {
    let monitor_dir = app_dir();
    std::fs::create_dir_all(monitor_dir.join("logs"))?;
    std::fs::create_dir_all(monitor_dir.join("data"))?;
    Ok(monitor_dir)
}

fn app_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Default log file used by the realtime view.
pub fn default_log_file() -> PathBuf {
    app_dir().join("logs").join(LOG_FILE_NAME)
}

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Where log lines go.
#[derive(Debug, Clone, PartialEq)]
pub enum LogTarget {
    /// Append to a file; keeps the TUI clean.
    File(PathBuf),
    Stderr,
}

/// Map a `--log-level` name to a tracing filter directive.
pub fn level_directive(log_level: &str) -> &'static str {
    match log_level.to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        _ => "info",
    }
}

/// Initialise the global `tracing` subscriber.
///
/// `RUST_LOG` overrides `log_level` when set.
pub fn setup_logging(log_level: &str, target: LogTarget) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(log_level)));

    match target {
        LogTarget::File(path) => {
            let file = open_log_file(&path)?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()?;
        }
        LogTarget::Stderr => {
            let layer = fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()?;
        }
    }

    Ok(())
}

fn open_log_file(path: &Path) -> anyhow::Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
