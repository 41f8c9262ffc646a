//! Error types for the network side of the router
use thiserror::Error;

/// Control system errors
#[derive(Error, Debug)]
pub enum ControlError {
    /// DMX error (bad payload size, unusable target)
    #[error("DMX error: {0}")]
    DmxError(String),

    /// A socket could not be bound; fatal at startup
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested local address
        addr: String,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A router thread panicked
    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
