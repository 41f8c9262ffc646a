//! Error types for loading installation files.
//!
//! Every variant is fatal at startup: the router refuses to run on a mapping,
//! patch or config file it could not read completely.

use std::path::PathBuf;

/// Result type alias for file loading.
pub type Result<T> = std::result::Result<T, IoError>;

/// Error type for file loading.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV sheet could not be parsed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON document could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RON document could not be parsed
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// TOML config could not be parsed
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// File extension not handled by the loader
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// File exceeds the loader's size limit
    #[error("File too large: {size} bytes (limit {limit})")]
    FileTooLarge {
        /// Actual size in bytes
        size: u64,
        /// Allowed size in bytes
        limit: u64,
    },

    /// Mapping rows that cannot describe a valid installation
    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),

    /// A required file is missing
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
}
