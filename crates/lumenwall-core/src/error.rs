//! Error types for the eHuB codec
use thiserror::Error;

/// Reasons an eHuB datagram could not be turned into a [`Frame`](crate::Frame),
/// or a frame could not be encoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Datagram shorter than the fixed 10-byte header
    #[error("packet too short: {len} bytes (header needs 10)")]
    TooShort {
        /// Length of the rejected datagram
        len: usize,
    },

    /// First four bytes are not `eHuB`
    #[error("bad magic, expected \"eHuB\"")]
    BadMagic,

    /// Header announces more compressed bytes than the datagram carries
    #[error("truncated payload: header announces {expected} bytes, {available} available")]
    TruncatedPayload {
        /// `comp_len` from the header
        expected: usize,
        /// Bytes actually present after the header
        available: usize,
    },

    /// gzip stream could not be inflated
    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    /// gzip encoder failed while building a frame
    #[error("compression failed: {0}")]
    CompressionFailed(String),

    /// Type byte is neither CONFIG (1) nor UPDATE (2)
    #[error("unsupported frame type: {0}")]
    UnsupportedFrameType(u8),

    /// Entry count or compressed length does not fit the 16-bit header fields
    #[error("payload too large for eHuB header: {0}")]
    PayloadTooLarge(String),
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
