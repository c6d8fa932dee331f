//! Error types for Data Center decoding.

use thiserror::Error;

use crate::Coordinate;

/// Errors that can occur while loading or reading a Data Center.
///
/// Every variant except [`Error::UnresolvedName`] aborts the load; the format
/// has no resynchronization points to recover from.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The decrypted stream did not start with the zlib marker.
    #[error("incorrect key or IV (decrypted marker was {actual:#06x})")]
    IncorrectKeyOrIv { actual: u16 },

    /// The buffer ended before a read completed.
    #[error("truncated data at offset {offset}: needed {needed} bytes but only {available} available")]
    TruncatedData {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Inflating the payload failed.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// A coordinate points outside its region.
    #[error("coordinate {coordinate} out of range ({buckets} buckets, bucket capacity {capacity:?})")]
    AddressOutOfRange {
        coordinate: Coordinate,
        buckets: usize,
        capacity: Option<i32>,
    },

    /// A name index was decoded before the name table exists.
    ///
    /// Only raised while sampling bucket widths during the structural pass and
    /// replaced by a placeholder there. Never returned from the public API.
    #[error("name index {0} decoded before the name table was built")]
    UnresolvedName(u16),

    /// A name index does not fit the name table.
    #[error("name index {index} out of range (name table has {len} entries)")]
    NameOutOfRange { index: u16, len: usize },

    /// A bucket header is inconsistent.
    #[error("bucket {bucket} is invalid: capacity {capacity}, count {count}")]
    InvalidBucket { bucket: usize, capacity: i32, count: i32 },

    /// A stored count is negative or otherwise impossible.
    #[error("invalid {field} count: {count}")]
    InvalidCount { field: &'static str, count: i32 },
}

impl From<tdc_common::Error> for Error {
    fn from(e: tdc_common::Error) -> Self {
        match e {
            tdc_common::Error::UnexpectedEof {
                position,
                needed,
                available,
            } => Error::TruncatedData {
                offset: position,
                needed,
                available,
            },
        }
    }
}

impl From<tdc_unpack::Error> for Error {
    fn from(e: tdc_unpack::Error) -> Self {
        match e {
            tdc_unpack::Error::Io(e) => Error::Io(e),
            tdc_unpack::Error::IncorrectKeyOrIv { actual, .. } => Error::IncorrectKeyOrIv { actual },
            tdc_unpack::Error::TruncatedData { needed, available } => Error::TruncatedData {
                offset: available,
                needed,
                available,
            },
            tdc_unpack::Error::Decompression(message) => Error::Decompression(message),
        }
    }
}

/// Result type for Data Center operations.
pub type Result<T> = std::result::Result<T, Error>;
