//! Structural pass over the unpacked buffer.
//!
//! Sections are laid out back to back and none of them records its own
//! length, so they are discovered in file order with a single cursor:
//!
//! | Section               | Contents                                   |
//! |-----------------------|--------------------------------------------|
//! | header                | 8 × `u32`                                  |
//! | opaque block          | `i32` count, fixed-width records           |
//! | attributes region     | buckets of 8-byte attribute records        |
//! | elements region       | buckets of 16-byte element records         |
//! | values characters     | buckets of UTF-16 units                    |
//! | values metadata       | 1024 slot lists                            |
//! | values index table    | off-by-one coordinate list                 |
//! | names characters      | buckets of UTF-16 units                    |
//! | names metadata        | 512 slot lists                             |
//! | names index table     | off-by-one coordinate list                 |

use tdc_common::BinaryReader;
use tracing::debug;

use crate::header::DataCenterHeader;
use crate::names::NameTable;
use crate::options::DecodeOptions;
use crate::records::{AttributeRecord, ElementRecord};
use crate::region::Region;
use crate::strings::{self, StringMetadata, StringsRegion};
use crate::{Coordinate, Error, Result};

/// Everything learned from the structural pass. Immutable afterwards.
#[derive(Debug)]
pub(crate) struct Geometry {
    pub header: DataCenterHeader,
    pub opaque_record_count: usize,
    pub attributes: Region<AttributeRecord>,
    pub elements: Region<ElementRecord>,
    pub values: StringsRegion,
    pub values_metadata: Option<Vec<Vec<StringMetadata>>>,
    pub value_indices: Vec<Coordinate>,
    pub names_strings: StringsRegion,
    pub names_metadata: Option<Vec<Vec<StringMetadata>>>,
    pub name_indices: Vec<Coordinate>,
    pub names: NameTable,
}

impl Geometry {
    pub(crate) fn read(source: &[u8], options: &DecodeOptions) -> Result<Self> {
        let mut reader = BinaryReader::new(source);

        let header: DataCenterHeader = reader.read_struct()?;
        let opaque_record_count = skip_opaque_block(&mut reader, options.opaque_record_size)?;

        let attributes = Region::read(&mut reader, "attributes")?;
        let elements = Region::read(&mut reader, "elements")?;

        let values = StringsRegion::read(&mut reader, "values")?;
        let values_metadata = metadata(&mut reader, options, options.values_metadata_slots, "values")?;
        let value_indices = strings::read_index_table(&mut reader, "values")?;

        let names_strings = StringsRegion::read(&mut reader, "names")?;
        let names_metadata = metadata(&mut reader, options, options.names_metadata_slots, "names")?;
        let name_indices = strings::read_index_table(&mut reader, "names")?;

        if !reader.is_empty() {
            debug!(trailing = reader.remaining(), "bytes left after the names index table");
        }

        let names = NameTable::build(source, &names_strings, &name_indices)?;
        debug!(names = names.len(), "name table built");

        Ok(Self {
            header,
            opaque_record_count,
            attributes,
            elements,
            values,
            values_metadata,
            value_indices,
            names_strings,
            names_metadata,
            name_indices,
            names,
        })
    }
}

fn skip_opaque_block(reader: &mut BinaryReader<'_>, record_size: usize) -> Result<usize> {
    let count = reader.read_i32()?;
    if count < 0 {
        return Err(Error::InvalidCount {
            field: "opaque block",
            count,
        });
    }

    let Some(bytes) = (count as usize).checked_mul(record_size) else {
        return Err(Error::TruncatedData {
            offset: reader.position(),
            needed: usize::MAX,
            available: reader.remaining(),
        });
    };
    if reader.remaining() < bytes {
        return Err(Error::TruncatedData {
            offset: reader.position(),
            needed: bytes,
            available: reader.remaining(),
        });
    }
    reader.advance(bytes);

    debug!(records = count, bytes, "skipped opaque block");
    Ok(count as usize)
}

fn metadata(
    reader: &mut BinaryReader<'_>,
    options: &DecodeOptions,
    slots: usize,
    label: &'static str,
) -> Result<Option<Vec<Vec<StringMetadata>>>> {
    if options.keep_string_metadata {
        strings::read_metadata(reader, slots, label).map(Some)
    } else {
        strings::skip_metadata(reader, slots, label).map(|()| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_block_skip() {
        let mut data = 2i32.to_le_bytes().to_vec();
        data.extend_from_slice(&[0xAB; 16]);
        data.push(0x01);

        let mut reader = BinaryReader::new(&data);
        assert_eq!(skip_opaque_block(&mut reader, 8).unwrap(), 2);
        assert_eq!(reader.position(), 20);
    }

    #[test]
    fn test_opaque_block_truncated() {
        let mut data = 3i32.to_le_bytes().to_vec();
        data.extend_from_slice(&[0; 8]);

        let result = skip_opaque_block(&mut BinaryReader::new(&data), 8);
        assert!(matches!(result, Err(Error::TruncatedData { offset: 4, needed: 24, available: 8 })));
    }

    #[test]
    fn test_opaque_block_width_overflow() {
        let mut data = 2i32.to_le_bytes().to_vec();
        data.extend_from_slice(&[0; 16]);

        let result = skip_opaque_block(&mut BinaryReader::new(&data), usize::MAX);
        assert!(matches!(result, Err(Error::TruncatedData { offset: 4, needed: usize::MAX, available: 16 })));
    }

    #[test]
    fn test_header_alone_is_truncated() {
        let data = [0u8; 32];
        assert!(matches!(
            Geometry::read(&data, &DecodeOptions::default()),
            Err(Error::TruncatedData { offset: 32, .. })
        ));
    }
}
