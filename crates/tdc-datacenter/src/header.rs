//! Data Center file header.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Eight 32-bit words at the start of the unpacked buffer.
///
/// Their meaning is unknown; they are kept so callers can compare files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct DataCenterHeader {
    pub words: [u32; 8],
}

impl DataCenterHeader {
    /// On-disk size in bytes.
    pub const SIZE: usize = 32;
}

const _: () = assert!(std::mem::size_of::<DataCenterHeader>() == DataCenterHeader::SIZE);
