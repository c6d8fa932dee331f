//! The loaded Data Center.

use std::path::Path;
use std::sync::Arc;

use tdc_unpack::{Iv, Key, Unpacker};
use tracing::{info, trace};

use crate::cache::CacheStats;
use crate::geometry::Geometry;
use crate::header::DataCenterHeader;
use crate::names::NameTable;
use crate::options::DecodeOptions;
use crate::records::{AttributeRecord, ElementRecord};
use crate::region::Region;
use crate::source::ByteSource;
use crate::strings::{StringMetadata, StringsRegion};
use crate::{Attribute, Coordinate, Element, Result};

/// A decoded Data Center.
///
/// Construction runs the structural pass; everything after that is lazy.
/// Element and attribute records, and string values, are decoded on first
/// access and memoized by coordinate. All methods take `&self` and the type
/// is `Send + Sync`, so subtrees can be walked from several threads.
///
/// # Example
///
/// ```no_run
/// use tdc_datacenter::DataCenter;
///
/// let key = [0u8; 16];
/// let iv = [0u8; 16];
/// let dc = DataCenter::load("DataCenter_Final_EUR.dat", key, iv)?;
///
/// let root = dc.root()?;
/// if let Some(strings) = root.child("StrSheet_Item")? {
///     for string in strings.children() {
///         let string = string?;
///         if let Some(value) = string.value("string")? {
///             println!("{value}");
///         }
///     }
/// }
/// # Ok::<(), tdc_datacenter::Error>(())
/// ```
pub struct DataCenter {
    source: ByteSource,
    geometry: Geometry,
}

/// Region and cache sizes of a [`DataCenter`].
#[derive(Debug, Clone, Default)]
pub struct DataCenterStats {
    pub unpacked_size: usize,
    pub opaque_records: usize,
    pub attribute_buckets: usize,
    pub attributes: usize,
    pub element_buckets: usize,
    pub elements: usize,
    pub value_buckets: usize,
    pub value_indices: usize,
    pub name_buckets: usize,
    pub names: usize,
    pub attribute_cache: CacheStats,
    pub element_cache: CacheStats,
    pub value_cache: CacheStats,
}

impl DataCenter {
    /// Unpack the encrypted file at `path` and decode it.
    pub fn load<P: AsRef<Path>>(path: P, key: Key, iv: Iv) -> Result<Self> {
        Self::load_with_options(path, key, iv, &DecodeOptions::default())
    }

    pub fn load_with_options<P: AsRef<Path>>(path: P, key: Key, iv: Iv, options: &DecodeOptions) -> Result<Self> {
        let data = Unpacker::new(key, iv).unpack_file(path)?;
        Self::from_source(ByteSource::Owned(data), options)
    }

    /// Unpack an encrypted file already in memory and decode it.
    pub fn from_packed(data: &[u8], key: Key, iv: Iv) -> Result<Self> {
        let data = Unpacker::new(key, iv).unpack_slice(data)?;
        Self::from_unpacked(data)
    }

    /// Decode an already unpacked buffer.
    pub fn from_unpacked(data: Vec<u8>) -> Result<Self> {
        Self::from_unpacked_with_options(data, &DecodeOptions::default())
    }

    pub fn from_unpacked_with_options(data: Vec<u8>, options: &DecodeOptions) -> Result<Self> {
        Self::from_source(ByteSource::Owned(data), options)
    }

    /// Memory-map and decode a file written by a previous unpack.
    pub fn open_unpacked<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_unpacked_with_options(path, &DecodeOptions::default())
    }

    pub fn open_unpacked_with_options<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<Self> {
        Self::from_source(ByteSource::map(path)?, options)
    }

    pub fn from_source(source: ByteSource, options: &DecodeOptions) -> Result<Self> {
        let geometry = Geometry::read(&source, options)?;
        let data_center = Self { source, geometry };

        info!(
            bytes = data_center.source.len(),
            elements = data_center.geometry.elements.record_count(),
            attributes = data_center.geometry.attributes.record_count(),
            names = data_center.geometry.names.len(),
            "Data Center loaded"
        );
        Ok(data_center)
    }

    /// The root element, always at the origin of the elements region.
    pub fn root(&self) -> Result<Element<'_>> {
        self.element(Coordinate::ORIGIN)
    }

    /// The element at `coordinate`.
    pub fn element(&self, coordinate: Coordinate) -> Result<Element<'_>> {
        let record = self.element_record(coordinate)?;
        Ok(Element::new(self, coordinate, record))
    }

    /// The attribute at `coordinate`.
    pub fn attribute(&self, coordinate: Coordinate) -> Result<Attribute<'_>> {
        let record = self.attribute_record(coordinate)?;
        Ok(Attribute::new(self, coordinate, record))
    }

    pub fn element_record(&self, coordinate: Coordinate) -> Result<ElementRecord> {
        trace!(%coordinate, "element");
        self.geometry
            .elements
            .get(&self.source, coordinate, Some(&self.geometry.names))
    }

    pub fn attribute_record(&self, coordinate: Coordinate) -> Result<AttributeRecord> {
        trace!(%coordinate, "attribute");
        self.geometry
            .attributes
            .get(&self.source, coordinate, Some(&self.geometry.names))
    }

    /// The string starting at `coordinate` in the values region.
    pub fn value_string(&self, coordinate: Coordinate) -> Result<Arc<str>> {
        self.geometry.values.resolve(&self.source, coordinate)
    }

    /// The string starting at `coordinate` in the names region.
    pub fn name_string(&self, coordinate: Coordinate) -> Result<Arc<str>> {
        self.geometry.names_strings.resolve(&self.source, coordinate)
    }

    pub fn header(&self) -> &DataCenterHeader {
        &self.geometry.header
    }

    /// Number of records in the skipped opaque block.
    pub fn opaque_record_count(&self) -> usize {
        self.geometry.opaque_record_count
    }

    pub fn names(&self) -> &NameTable {
        &self.geometry.names
    }

    /// Starts of the strings in the values region. Not used for lookups.
    pub fn value_indices(&self) -> &[Coordinate] {
        &self.geometry.value_indices
    }

    /// Starts of the strings in the names region, in name table order
    /// (offset by the placeholder).
    pub fn name_indices(&self) -> &[Coordinate] {
        &self.geometry.name_indices
    }

    /// Parsed values metadata, when requested through [`DecodeOptions`].
    pub fn values_metadata(&self) -> Option<&[Vec<StringMetadata>]> {
        self.geometry.values_metadata.as_deref()
    }

    /// Parsed names metadata, when requested through [`DecodeOptions`].
    pub fn names_metadata(&self) -> Option<&[Vec<StringMetadata>]> {
        self.geometry.names_metadata.as_deref()
    }

    pub fn attributes_region(&self) -> &Region<AttributeRecord> {
        &self.geometry.attributes
    }

    pub fn elements_region(&self) -> &Region<ElementRecord> {
        &self.geometry.elements
    }

    pub fn values_region(&self) -> &StringsRegion {
        &self.geometry.values
    }

    pub fn names_region(&self) -> &StringsRegion {
        &self.geometry.names_strings
    }

    /// The unpacked buffer.
    pub fn bytes(&self) -> &[u8] {
        &self.source
    }

    pub fn stats(&self) -> DataCenterStats {
        let geometry = &self.geometry;
        DataCenterStats {
            unpacked_size: self.source.len(),
            opaque_records: geometry.opaque_record_count,
            attribute_buckets: geometry.attributes.buckets().len(),
            attributes: geometry.attributes.record_count(),
            element_buckets: geometry.elements.buckets().len(),
            elements: geometry.elements.record_count(),
            value_buckets: geometry.values.characters().buckets().len(),
            value_indices: geometry.value_indices.len(),
            name_buckets: geometry.names_strings.characters().buckets().len(),
            names: geometry.names.len(),
            attribute_cache: geometry.attributes.cache_stats(),
            element_cache: geometry.elements.cache_stats(),
            value_cache: geometry.values.cache_stats(),
        }
    }
}

impl std::fmt::Debug for DataCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataCenter")
            .field("source", &self.source)
            .field("elements", &self.geometry.elements.record_count())
            .field("names", &self.geometry.names.len())
            .finish_non_exhaustive()
    }
}
