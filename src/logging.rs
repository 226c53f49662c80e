use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "installer.log";
pub const LOG_ENV: &str = "DESK_INSTALLER_LOG";

pub fn logs_dir(temp_dir: &Path, app_name: &str) -> PathBuf {
    temp_dir.join(format!("{app_name}-installer")).join("logs")
}

/// Opens the log file and routes `tracing` output to it. A subscriber that is
/// already installed is left in place.
pub fn init(temp_dir: &Path, app_name: &str) -> Result<PathBuf> {
    let dir = logs_dir(temp_dir, app_name);
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    let log_path = dir.join(LOG_FILE_NAME);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("open {}", log_path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(log_path)
}
