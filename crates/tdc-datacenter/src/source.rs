//! Backing storage for the unpacked buffer.

use std::fs::File;
use std::ops::Deref;
use std::path::Path;

use memmap2::Mmap;

use crate::Result;

/// The inflated Data Center bytes, either owned or memory-mapped.
///
/// Never mutated after construction, so any number of readers may view it.
pub enum ByteSource {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl ByteSource {
    /// Memory-map a file holding an already unpacked Data Center.
    pub fn map<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the map is read-only. Truncating the file underneath it is
        // outside what this type can guard against.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self::Mapped(mmap))
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped(_))
    }
}

impl Deref for ByteSource {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Owned(data) => data,
            Self::Mapped(mmap) => mmap,
        }
    }
}

impl From<Vec<u8>> for ByteSource {
    fn from(data: Vec<u8>) -> Self {
        Self::Owned(data)
    }
}

impl std::fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_mapped() { "Mapped" } else { "Owned" };
        f.debug_tuple(kind).field(&self.len()).finish()
    }
}
