//! Logging configuration
//!
//! Describes where and how verbosely the router logs. The subscriber itself
//! is installed by the binary; this type only carries settings and the log
//! file housekeeping.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::level_filters::LevelFilter;

const LOG_FILE_PREFIX: &str = "lumenwall_";
const LOG_FILE_SUFFIX: &str = ".log";

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Minimum level: trace, debug, info, warn or error
    pub level: String,
    /// Log to stderr
    pub console_output: bool,
    /// Log to a file in `log_dir`
    pub file_output: bool,
    /// Directory receiving one log file per session
    pub log_dir: PathBuf,
    /// Number of session files kept
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_dir: PathBuf::from("logs"),
            max_files: 10,
        }
    }
}

impl LogConfig {
    /// Parse `level`, falling back to INFO
    pub fn parse_level(&self) -> LevelFilter {
        self.level.trim().parse().unwrap_or(LevelFilter::INFO)
    }

    /// Create `log_dir` if file output is enabled
    pub fn ensure_log_directory(&self) -> std::io::Result<()> {
        if self.file_output {
            std::fs::create_dir_all(&self.log_dir)?;
        }
        Ok(())
    }

    /// Path of this session's log file
    pub fn current_log_path(&self) -> PathBuf {
        static SESSION: OnceLock<String> = OnceLock::new();
        let stamp =
            SESSION.get_or_init(|| chrono::Local::now().format("%Y%m%d_%H%M%S").to_string());
        self.log_dir
            .join(format!("{}{}{}", LOG_FILE_PREFIX, stamp, LOG_FILE_SUFFIX))
    }

    /// Delete the oldest session files so that at most `max_files - 1` remain,
    /// leaving room for the file about to be created.
    ///
    /// Returns the number of files removed.
    pub fn cleanup_old_logs(&self) -> std::io::Result<usize> {
        if !self.log_dir.is_dir() {
            return Ok(0);
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.log_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_session_log(path))
            .collect();

        let keep = self.max_files.saturating_sub(1);
        if files.len() <= keep {
            return Ok(0);
        }

        // timestamped names sort chronologically
        files.sort();
        let excess = files.len() - keep;
        for path in &files[..excess] {
            std::fs::remove_file(path)?;
        }
        Ok(excess)
    }
}

fn is_session_log(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with(LOG_FILE_PREFIX) && name.ends_with(LOG_FILE_SUFFIX))
        .unwrap_or(false)
}
