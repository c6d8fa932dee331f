//! Bucketed regions and coordinate addressing.
//!
//! A region is a list of buckets, each a fixed-capacity array of records of
//! one width. The width is not stored in the file: the structural pass
//! decodes one sample record per bucket and measures how many bytes it used.
//! That is why buckets can only be discovered strictly in file order.

use std::marker::PhantomData;

use tdc_common::BinaryReader;
use tracing::debug;

use crate::cache::{CacheStats, LazyCache};
use crate::names::NameTable;
use crate::{Coordinate, Error, Result};

/// A record type that can be decoded from a region slot.
///
/// `names` is `None` while the structural pass is still running; decoders
/// that resolve name indices must tolerate that (see [`NameTable::resolve`]).
pub trait Decode: Sized {
    fn decode(reader: &mut BinaryReader<'_>, names: Option<&NameTable>) -> Result<Self>;
}

/// UTF-16 code unit, the record type of the character regions.
impl Decode for u16 {
    fn decode(reader: &mut BinaryReader<'_>, _names: Option<&NameTable>) -> Result<Self> {
        Ok(reader.read_u16()?)
    }
}

/// One bucket of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// Reserved slots; all of them occupy bytes in the file.
    pub capacity: i32,
    /// Occupied slots, `0 <= count <= capacity`.
    pub count: i32,
    /// Absolute offset of slot 0.
    pub first_value_address: u64,
    /// Measured width of one record in bytes.
    pub value_size: u32,
}

impl Bucket {
    /// Bytes covered by all `capacity` slots.
    pub fn byte_len(&self) -> u64 {
        self.capacity as u64 * self.value_size as u64
    }
}

/// A bucketed sequence of `T` records with a lazy cache in front.
pub struct Region<T> {
    buckets: Vec<Bucket>,
    cache: LazyCache<T>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Decode + Clone> Region<T> {
    /// Read the bucket list at the reader's position and leave the reader
    /// just past the last bucket.
    ///
    /// One record per non-empty bucket is decoded to learn the record width
    /// and then dropped. Nothing is cached here.
    pub(crate) fn read(reader: &mut BinaryReader<'_>, label: &'static str) -> Result<Self> {
        let bucket_count = reader.read_i32()?;
        if bucket_count < 0 {
            return Err(Error::InvalidCount {
                field: label,
                count: bucket_count,
            });
        }

        // Every bucket starts with two i32 fields.
        let headers = bucket_count as usize * 8;
        if reader.remaining() < headers {
            return Err(Error::TruncatedData {
                offset: reader.position(),
                needed: headers,
                available: reader.remaining(),
            });
        }

        let mut buckets = Vec::with_capacity(bucket_count as usize);
        for index in 0..bucket_count as usize {
            let capacity = reader.read_i32()?;
            let count = reader.read_i32()?;
            if capacity < 0 || count < 0 || count > capacity {
                return Err(Error::InvalidBucket {
                    bucket: index,
                    capacity,
                    count,
                });
            }

            let first_value_address = reader.position();
            let value_size = if capacity > 0 {
                T::decode(reader, None)?;
                reader.position() - first_value_address
            } else {
                0
            };

            let end = first_value_address + capacity as usize * value_size;
            if end > reader.len() {
                return Err(Error::TruncatedData {
                    offset: first_value_address,
                    needed: end - first_value_address,
                    available: reader.len().saturating_sub(first_value_address),
                });
            }
            reader.seek(end);

            buckets.push(Bucket {
                capacity,
                count,
                first_value_address: first_value_address as u64,
                value_size: value_size as u32,
            });
        }

        debug!(
            region = label,
            buckets = buckets.len(),
            records = buckets.iter().map(|b| b.count as usize).sum::<usize>(),
            end = reader.position(),
            "region geometry read"
        );

        Ok(Self {
            buckets,
            cache: LazyCache::new(),
            _marker: PhantomData,
        })
    }

    /// Decode the record at `coordinate`, memoized.
    pub(crate) fn get(
        &self,
        source: &[u8],
        coordinate: Coordinate,
        names: Option<&NameTable>,
    ) -> Result<T> {
        self.cache.get_or_try_insert_with(coordinate, || {
            let address = self.address(coordinate)?;
            let mut reader = BinaryReader::new_at(source, address);
            T::decode(&mut reader, names)
        })
    }
}

impl<T> Region<T> {
    #[cfg(test)]
    pub(crate) fn from_buckets(buckets: Vec<Bucket>) -> Self
    where
        T: Clone,
    {
        Self {
            buckets,
            cache: LazyCache::new(),
            _marker: PhantomData,
        }
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn bucket(&self, index: u16) -> Option<&Bucket> {
        self.buckets.get(index as usize)
    }

    /// Number of occupied slots across all buckets.
    pub fn record_count(&self) -> usize {
        self.buckets.iter().map(|b| b.count as usize).sum()
    }

    /// Absolute offset of the record at `coordinate`.
    ///
    /// Any item below the bucket's capacity is addressable; beyond it the
    /// coordinate would read into the next bucket and is rejected.
    pub fn address(&self, coordinate: Coordinate) -> Result<usize> {
        let bucket = self
            .buckets
            .get(coordinate.bucket as usize)
            .ok_or(Error::AddressOutOfRange {
                coordinate,
                buckets: self.buckets.len(),
                capacity: None,
            })?;

        if coordinate.item as i32 >= bucket.capacity {
            return Err(Error::AddressOutOfRange {
                coordinate,
                buckets: self.buckets.len(),
                capacity: Some(bucket.capacity),
            });
        }

        Ok(bucket.first_value_address as usize + coordinate.item as usize * bucket.value_size as usize)
    }

    pub fn cache_stats(&self) -> CacheStats
    where
        T: Clone,
    {
        self.cache.stats()
    }
}

impl<T> std::fmt::Debug for Region<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("buckets", &self.buckets.len())
            .field("cache", &self.cache)
            .finish()
    }
}

/// Walks `remaining` consecutive coordinates, moving to the next bucket when
/// the current bucket's occupied slots run out.
#[derive(Debug, Clone)]
pub(crate) struct RegionCursor {
    next: Coordinate,
    remaining: u16,
    /// The previous step left the range of representable coordinates.
    past_end: bool,
}

impl RegionCursor {
    pub(crate) fn new(first: Coordinate, count: u16) -> Self {
        Self {
            next: first,
            remaining: count,
            past_end: false,
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.remaining as usize
    }

    pub(crate) fn stop(&mut self) {
        self.remaining = 0;
    }

    /// Yield the next coordinate, or an error if it is not an occupied slot.
    pub(crate) fn advance<T>(&mut self, region: &Region<T>) -> Option<Result<Coordinate>> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let current = self.next;
        if self.past_end {
            self.stop();
            return Some(Err(Error::AddressOutOfRange {
                coordinate: current,
                buckets: region.buckets().len(),
                capacity: None,
            }));
        }

        let Some(bucket) = region.bucket(current.bucket) else {
            self.stop();
            return Some(Err(Error::AddressOutOfRange {
                coordinate: current,
                buckets: region.buckets().len(),
                capacity: None,
            }));
        };
        if current.item as i32 >= bucket.count {
            self.stop();
            return Some(Err(Error::AddressOutOfRange {
                coordinate: current,
                buckets: region.buckets().len(),
                capacity: Some(bucket.capacity),
            }));
        }

        let item = current.item as i32 + 1;
        if item < bucket.count {
            match u16::try_from(item) {
                Ok(item) => self.next = Coordinate::new(current.bucket, item),
                Err(_) => self.past_end = true,
            }
        } else {
            match current.bucket.checked_add(1) {
                Some(bucket) => self.next = Coordinate::new(bucket, 0),
                None => self.past_end = true,
            }
        }

        Some(Ok(current))
    }
}
