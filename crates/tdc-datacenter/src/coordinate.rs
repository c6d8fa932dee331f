//! Region coordinates.

use std::fmt;

use tdc_common::BinaryReader;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::Result;

/// Address of one record inside a region: bucket index, then item index.
///
/// Stored on disk as two little-endian `u16`s in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[derive(FromBytes, IntoBytes, Immutable, KnownLayout)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(C)]
pub struct Coordinate {
    pub bucket: u16,
    pub item: u16,
}

impl Coordinate {
    /// Coordinate of the first record of a region (the Data Center root for
    /// the elements region).
    pub const ORIGIN: Self = Self { bucket: 0, item: 0 };

    #[inline]
    pub const fn new(bucket: u16, item: u16) -> Self {
        Self { bucket, item }
    }

    pub(crate) fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let bucket = reader.read_u16()?;
        let item = reader.read_u16()?;
        Ok(Self { bucket, item })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.bucket, self.item)
    }
}
