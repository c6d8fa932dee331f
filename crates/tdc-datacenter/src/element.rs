//! Element handles and child iteration.

use crate::attribute::Attributes;
use crate::records::ElementRecord;
use crate::region::RegionCursor;
use crate::{Attribute, Coordinate, DataCenter, Result, Value};

/// A vertex of the Data Center tree.
///
/// Cheap to clone. Attributes and children are not read until iterated, and
/// iterating again starts over from the first one.
///
/// ```no_run
/// use tdc_datacenter::DataCenter;
///
/// let dc = DataCenter::open_unpacked("DataCenter.unpacked")?;
/// let root = dc.root()?;
/// for child in root.children() {
///     let child = child?;
///     println!("{} ({} attributes)", child.name(), child.attribute_count());
/// }
/// # Ok::<(), tdc_datacenter::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Element<'a> {
    data_center: &'a DataCenter,
    coordinate: Coordinate,
    record: ElementRecord,
}

impl<'a> Element<'a> {
    pub(crate) fn new(data_center: &'a DataCenter, coordinate: Coordinate, record: ElementRecord) -> Self {
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

    /// Where this element lives in the elements region.
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn attribute_count(&self) -> usize {
        self.record.attribute_count as usize
    }

    pub fn child_count(&self) -> usize {
        self.record.child_count as usize
    }

    pub fn record(&self) -> &ElementRecord {
        &self.record
    }

    pub fn data_center(&self) -> &'a DataCenter {
        self.data_center
    }

    pub fn attributes(&self) -> Attributes<'a> {
        Attributes::new(
            self.data_center,
            self.record.first_attribute,
            self.record.attribute_count,
        )
    }

    pub fn children(&self) -> Children<'a> {
        Children::new(self.data_center, self.record.first_child, self.record.child_count)
    }

    /// First attribute named `name`, if any.
    pub fn attribute(&self, name: &str) -> Result<Option<Attribute<'a>>> {
        for attribute in self.attributes() {
            let attribute = attribute?;
            if attribute.name() == name {
                return Ok(Some(attribute));
            }
        }
        Ok(None)
    }

    /// Value of the first attribute named `name`, if any.
    pub fn value(&self, name: &str) -> Result<Option<Value>> {
        self.attribute(name)?.map(|a| a.value()).transpose()
    }

    /// First child named `name`, if any.
    pub fn child(&self, name: &str) -> Result<Option<Element<'a>>> {
        for child in self.children() {
            let child = child?;
            if child.name() == name {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// Follow a chain of child names, taking the first match at each level.
    pub fn descendant<'p, I>(&self, path: I) -> Result<Option<Element<'a>>>
    where
        I: IntoIterator<Item = &'p str>,
    {
        let mut current = self.clone();
        for name in path {
            match current.child(name)? {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }
}

/// Lazy iterator over an element's children.
#[derive(Debug, Clone)]
pub struct Children<'a> {
    data_center: &'a DataCenter,
    cursor: RegionCursor,
}

impl<'a> Children<'a> {
    pub(crate) fn new(data_center: &'a DataCenter, first: Coordinate, count: u16) -> Self {
        Self {
            data_center,
            cursor: RegionCursor::new(first, count),
        }
    }
}

impl<'a> Iterator for Children<'a> {
    type Item = Result<Element<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        let coordinate = match self.cursor.advance(self.data_center.elements_region())? {
            Ok(coordinate) => coordinate,
            Err(e) => return Some(Err(e)),
        };
        let item = self.data_center.element(coordinate);
        if item.is_err() {
            self.cursor.stop();
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.cursor.remaining()))
    }
}

impl std::iter::FusedIterator for Children<'_> {}
