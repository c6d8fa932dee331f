//! String regions: UTF-16 character buckets, their metadata and index tables.

use std::sync::Arc;

use tdc_common::BinaryReader;
use tracing::{debug, trace};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::cache::{CacheStats, LazyCache};
use crate::region::Region;
use crate::{Coordinate, Error, Result};

/// On-disk size of one [`StringMetadata`] entry.
pub const STRING_METADATA_SIZE: usize = 16;

/// One entry of a string metadata slot list.
///
/// Only the address is understood; the other fields are carried as read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct StringMetadata {
    pub unknown: i32,
    /// Length of the string in UTF-16 units, terminator included.
    pub length: i32,
    pub unknown1: i32,
    pub address: Coordinate,
}

const _: () = assert!(std::mem::size_of::<StringMetadata>() == STRING_METADATA_SIZE);

/// A character region with memoized string resolution.
#[derive(Debug)]
pub struct StringsRegion {
    characters: Region<u16>,
    strings: LazyCache<Arc<str>>,
}

impl StringsRegion {
    pub(crate) fn read(reader: &mut BinaryReader<'_>, label: &'static str) -> Result<Self> {
        Ok(Self {
            characters: Region::read(reader, label)?,
            strings: LazyCache::new(),
        })
    }

    /// The zero-terminated string starting at `coordinate`.
    ///
    /// The read is linear over the buffer, so a string that runs past the end
    /// of its bucket's occupied slots continues into whatever follows.
    pub fn resolve(&self, source: &[u8], coordinate: Coordinate) -> Result<Arc<str>> {
        self.strings.get_or_try_insert_with(coordinate, || {
            let address = self.characters.address(coordinate)?;
            trace!(%coordinate, address, "resolving string");
            let mut reader = BinaryReader::new_at(source, address);
            Ok(Arc::from(reader.read_utf16z()?))
        })
    }

    pub fn characters(&self) -> &Region<u16> {
        &self.characters
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.strings.stats()
    }
}

fn read_count(reader: &mut BinaryReader<'_>, field: &'static str) -> Result<usize> {
    let count = reader.read_i32()?;
    if count < 0 {
        return Err(Error::InvalidCount { field, count });
    }
    Ok(count as usize)
}

fn ensure_available(reader: &BinaryReader<'_>, needed: usize) -> Result<()> {
    if reader.remaining() < needed {
        return Err(Error::TruncatedData {
            offset: reader.position(),
            needed,
            available: reader.remaining(),
        });
    }
    Ok(())
}

/// Skip `slots` metadata lists by their stored counts.
pub(crate) fn skip_metadata(reader: &mut BinaryReader<'_>, slots: usize, label: &'static str) -> Result<()> {
    let start = reader.position();
    for _ in 0..slots {
        let count = read_count(reader, label)?;
        let bytes = count * STRING_METADATA_SIZE;
        ensure_available(reader, bytes)?;
        reader.advance(bytes);
    }
    debug!(region = label, slots, bytes = reader.position() - start, "skipped string metadata");
    Ok(())
}

/// Parse `slots` metadata lists.
pub(crate) fn read_metadata(
    reader: &mut BinaryReader<'_>,
    slots: usize,
    label: &'static str,
) -> Result<Vec<Vec<StringMetadata>>> {
    let mut lists = Vec::with_capacity(slots);
    for _ in 0..slots {
        let count = read_count(reader, label)?;
        ensure_available(reader, count * STRING_METADATA_SIZE)?;
        let list = (0..count)
            .map(|_| reader.read_struct::<StringMetadata>())
            .collect::<tdc_common::Result<Vec<_>>>()?;
        lists.push(list);
    }
    debug!(
        region = label,
        slots,
        entries = lists.iter().map(Vec::len).sum::<usize>(),
        "parsed string metadata"
    );
    Ok(lists)
}

/// Read an index table: a stored count `k` followed by `k - 1` coordinates.
pub(crate) fn read_index_table(reader: &mut BinaryReader<'_>, label: &'static str) -> Result<Vec<Coordinate>> {
    let stored = reader.read_i32()?;
    if stored < 1 {
        return Err(Error::InvalidCount { field: label, count: stored });
    }
    let len = stored as usize - 1;
    ensure_available(reader, len * std::mem::size_of::<Coordinate>())?;

    let indices = (0..len)
        .map(|_| Coordinate::read(reader))
        .collect::<Result<Vec<_>>>()?;
    debug!(table = label, entries = indices.len(), "read index table");
    Ok(indices)
}
