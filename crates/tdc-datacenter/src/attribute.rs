//! Attribute handles.

use crate::records::{AttributeRecord, RawValue, TypeCode};
use crate::region::RegionCursor;
use crate::{Coordinate, DataCenter, Result, Value};

/// An attribute of an [`Element`](crate::Element).
///
/// Holds its decoded record; string values are resolved on [`value`](Self::value).
#[derive(Debug, Clone)]
pub struct Attribute<'a> {
    data_center: &'a DataCenter,
    coordinate: Coordinate,
    record: AttributeRecord,
}

impl<'a> Attribute<'a> {
    pub(crate) fn new(data_center: &'a DataCenter, coordinate: Coordinate, record: AttributeRecord) -> Self {
        Self {
            data_center,
            coordinate,
            record,
        }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn name_index(&self) -> u16 {
        self.record.name_index
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn type_code(&self) -> Option<TypeCode> {
        TypeCode::from_u16(self.record.type_code)
    }

    pub fn raw_value(&self) -> RawValue {
        self.record.value
    }

    pub fn record(&self) -> &AttributeRecord {
        &self.record
    }

    /// The attribute's value, with strings looked up in the values region.
    pub fn value(&self) -> Result<Value> {
        Ok(match self.record.value {
            RawValue::Int(v) => Value::Int(v),
            RawValue::Float(v) => Value::Float(v),
            RawValue::Bool(v) => Value::Bool(v),
            RawValue::String(coordinate) => Value::String(self.data_center.value_string(coordinate)?),
        })
    }
}

/// Lazy iterator over an element's attributes.
///
/// Records are decoded one at a time as the iterator advances. Once an item
/// is an error the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct Attributes<'a> {
    data_center: &'a DataCenter,
    cursor: RegionCursor,
}

impl<'a> Attributes<'a> {
    pub(crate) fn new(data_center: &'a DataCenter, first: Coordinate, count: u16) -> Self {
        Self {
            data_center,
            cursor: RegionCursor::new(first, count),
        }
    }
}

impl<'a> Iterator for Attributes<'a> {
    type Item = Result<Attribute<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let coordinate = match self.cursor.advance(self.data_center.attributes_region())? {
            Ok(coordinate) => coordinate,
            Err(e) => return Some(Err(e)),
        };
        let item = self.data_center.attribute(coordinate);
        if item.is_err() {
            self.cursor.stop();
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.cursor.remaining()))
    }
}

impl std::iter::FusedIterator for Attributes<'_> {}
