//! Fixed-width element and attribute records.

use std::sync::Arc;

use tdc_common::BinaryReader;

use crate::names::NameTable;
use crate::region::Decode;
use crate::{Coordinate, Result};

/// Attribute type codes. Any code not listed here marks a string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum TypeCode {
    Int = 1,
    Float = 2,
    Bool = 5,
}

impl TypeCode {
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Int),
            2 => Some(Self::Float),
            5 => Some(Self::Bool),
            _ => None,
        }
    }
}

/// Undecoded attribute payload. Strings are still coordinates into the
/// values region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue {
    Int(i32),
    Float(f32),
    Bool(bool),
    String(Coordinate),
}

/// An element record (16 bytes on disk).
#[derive(Debug, Clone)]
pub struct ElementRecord {
    pub name_index: u16,
    pub name: Arc<str>,
    /// Always zero in known files.
    pub reserved: u16,
    pub attribute_count: u16,
    pub child_count: u16,
    pub first_attribute: Coordinate,
    pub first_child: Coordinate,
}

impl Decode for ElementRecord {
    fn decode(reader: &mut BinaryReader<'_>, names: Option<&NameTable>) -> Result<Self> {
        let (name_index, name) = NameTable::read_name(reader, names)?;
        let reserved = reader.read_u16()?;
        let attribute_count = reader.read_u16()?;
        let child_count = reader.read_u16()?;
        let first_attribute = Coordinate::read(reader)?;
        let first_child = Coordinate::read(reader)?;

        Ok(Self {
            name_index,
            name,
            reserved,
            attribute_count,
            child_count,
            first_attribute,
            first_child,
        })
    }
}

/// An attribute record (8 bytes on disk).
#[derive(Debug, Clone)]
pub struct AttributeRecord {
    pub name_index: u16,
    pub name: Arc<str>,
    pub type_code: u16,
    pub value: RawValue,
}

impl Decode for AttributeRecord {
    fn decode(reader: &mut BinaryReader<'_>, names: Option<&NameTable>) -> Result<Self> {
        let (name_index, name) = NameTable::read_name(reader, names)?;
        let type_code = reader.read_u16()?;

        let value = match TypeCode::from_u16(type_code) {
            Some(TypeCode::Int) => RawValue::Int(reader.read_i32()?),
            Some(TypeCode::Float) => RawValue::Float(reader.read_f32()?),
            Some(TypeCode::Bool) => RawValue::Bool(reader.read_i32()? == 1),
            None => RawValue::String(Coordinate::read(reader)?),
        };

        Ok(Self {
            name_index,
            name,
            type_code,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::PLACEHOLDER;

    fn attribute_bytes(name: u16, code: u16, payload: [u8; 4]) -> Vec<u8> {
        let mut data = name.to_le_bytes().to_vec();
        data.extend_from_slice(&code.to_le_bytes());
        data.extend_from_slice(&payload);
        data
    }

    fn decode_attribute(data: &[u8], names: Option<&NameTable>) -> AttributeRecord {
        let mut reader = BinaryReader::new(data);
        let record = AttributeRecord::decode(&mut reader, names).unwrap();
        assert_eq!(reader.position(), 8);
        record
    }

    #[test]
    fn test_attribute_type_codes() {
        let names = NameTable::from_names(["hp"]);

        let int = decode_attribute(&attribute_bytes(1, 1, (-5i32).to_le_bytes()), Some(&names));
        assert_eq!(int.value, RawValue::Int(-5));
        assert_eq!(&*int.name, "hp");

        let float = decode_attribute(&attribute_bytes(1, 2, 2.5f32.to_le_bytes()), Some(&names));
        assert_eq!(float.value, RawValue::Float(2.5));

        let yes = decode_attribute(&attribute_bytes(1, 5, 1i32.to_le_bytes()), Some(&names));
        let no = decode_attribute(&attribute_bytes(1, 5, 2i32.to_le_bytes()), Some(&names));
        assert_eq!(yes.value, RawValue::Bool(true));
        assert_eq!(no.value, RawValue::Bool(false));
    }

    #[test]
    fn test_unknown_type_code_is_string() {
        let names = NameTable::from_names(["desc"]);
        for code in [0u16, 3, 4, 6, 0x1234] {
            let record = decode_attribute(&attribute_bytes(1, code, [3, 0, 9, 0]), Some(&names));
            assert_eq!(record.value, RawValue::String(Coordinate::new(3, 9)));
            assert_eq!(record.type_code, code);
        }
    }

    #[test]
    fn test_element_layout() {
        let mut data = Vec::new();
        for word in [2u16, 0, 3, 4, 1, 2, 5, 6] {
            data.extend_from_slice(&word.to_le_bytes());
        }
        let names = NameTable::from_names(["a", "Root"]);

        let mut reader = BinaryReader::new(&data);
        let record = ElementRecord::decode(&mut reader, Some(&names)).unwrap();

        assert_eq!(reader.position(), 16);
        assert_eq!(&*record.name, "Root");
        assert_eq!(record.attribute_count, 3);
        assert_eq!(record.child_count, 4);
        assert_eq!(record.first_attribute, Coordinate::new(1, 2));
        assert_eq!(record.first_child, Coordinate::new(5, 6));
    }

    #[test]
    fn test_sample_decode_uses_placeholder() {
        let record = decode_attribute(&attribute_bytes(40, 1, [0; 4]), None);
        assert_eq!(&*record.name, PLACEHOLDER);
        assert_eq!(record.name_index, 40);
    }
}
