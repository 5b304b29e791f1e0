//! tracing subscriber set-up.
//!
//! The dashboard owns the terminal, so it logs to a file under the user's
//! data directory. One-shot commands log to stderr. `RUST_LOG` overrides the
//! default `info` level for both.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn log_file_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;
    Ok(data_dir.join("phia").join("phia.log"))
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Log to `phia.log`. Returns the path written to.
pub fn init_file() -> Result<PathBuf> {
    let path = log_file_path()?;
    let file = open_log_file(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {e}"))?;

    Ok(path)
}

pub fn init_stderr() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn default_filter_is_info() {
        assert_eq!(EnvFilter::new(DEFAULT_FILTER).max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn log_file_parent_is_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("phia").join("phia.log");
        open_log_file(&path).unwrap();
        assert!(path.exists());
    }
}
