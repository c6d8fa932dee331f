//! Error types for the unpack crate.

use thiserror::Error;

/// Errors that can occur while unpacking a Data Center file.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The decrypted stream does not start with the zlib marker.
    #[error("incorrect key or IV: expected marker {expected:#06x}, got {actual:#06x}")]
    IncorrectKeyOrIv { expected: u16, actual: u16 },

    /// The stream ended before the size hint and marker could be read.
    #[error("truncated data: needed {needed} bytes but only {available} available")]
    TruncatedData { needed: usize, available: usize },

    /// Inflating the payload failed.
    #[error("decompression error: {0}")]
    Decompression(String),
}

/// Result type for unpack operations.
pub type Result<T> = std::result::Result<T, Error>;
