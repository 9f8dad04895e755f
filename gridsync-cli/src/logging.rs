use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Installs the global subscriber. `RUST_LOG`, when set, wins over the configured level.
pub fn init_logging(log: &LogConfig) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log.filter_directive()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if log.logs_to_file() {
        let path = Path::new(&log.file);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Cannot create log directory {}: {}", parent.display(), e))?;
        }
        let file = File::create(path)
            .map_err(|e| format!("Cannot create log file {}: {}", path.display(), e))?;
        builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
            .map_err(|e| format!("Cannot install logger: {}", e))
    } else {
        builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| format!("Cannot install logger: {}", e))
    }
}
