//! The flat name table.

use std::sync::Arc;

use tdc_common::BinaryReader;

use crate::strings::StringsRegion;
use crate::{Coordinate, Error, Result};

/// Name stored at index 0 of every name table.
///
/// Name indices are 1-based in the file; slot 0 is never a real name.
pub const PLACEHOLDER: &str = "__placeholder__";

/// Element and attribute names, indexed by the `u16` name fields of records.
#[derive(Debug, Clone)]
pub struct NameTable {
    names: Vec<Arc<str>>,
}

impl NameTable {
    /// Resolve every entry of the names index table, in order, behind the
    /// placeholder.
    pub(crate) fn build(source: &[u8], strings: &StringsRegion, indices: &[Coordinate]) -> Result<Self> {
        let mut names = Vec::with_capacity(indices.len() + 1);
        names.push(Arc::from(PLACEHOLDER));
        for &coordinate in indices {
            names.push(strings.resolve(source, coordinate)?);
        }
        Ok(Self { names })
    }

    /// Number of entries, placeholder included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: u16) -> Option<&Arc<str>> {
        self.names.get(index as usize)
    }

    /// Index of the first entry equal to `name`.
    pub fn position(&self, name: &str) -> Option<u16> {
        self.names
            .iter()
            .position(|n| &**n == name)
            .map(|i| i as u16)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(|n| &**n)
    }

    /// Look up `index` in `table`.
    ///
    /// Without a table this is [`Error::UnresolvedName`]; callers decoding
    /// width samples turn that into the placeholder.
    pub(crate) fn resolve(table: Option<&NameTable>, index: u16) -> Result<Arc<str>> {
        let table = table.ok_or(Error::UnresolvedName(index))?;
        table.get(index).cloned().ok_or(Error::NameOutOfRange {
            index,
            len: table.len(),
        })
    }

    /// Read a name index and resolve it, using the placeholder while the
    /// table does not exist yet.
    pub(crate) fn read_name(reader: &mut BinaryReader<'_>, table: Option<&NameTable>) -> Result<(u16, Arc<str>)> {
        let index = reader.read_u16()?;
        match Self::resolve(table, index) {
            Ok(name) => Ok((index, name)),
            Err(Error::UnresolvedName(_)) => Ok((index, Arc::from(PLACEHOLDER))),
            Err(e) => Err(e),
        }
    }

    #[cfg(test)]
    pub(crate) fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = vec![Arc::from(PLACEHOLDER)];
        table.extend(names.into_iter().map(|n| Arc::from(n.as_ref())));
        Self { names: table }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_is_index_zero() {
        let table = NameTable::from_names(["root", "id"]);

        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0).map(|n| &**n), Some(PLACEHOLDER));
        assert_eq!(table.position("id"), Some(2));
        assert_eq!(table.iter().collect::<Vec<_>>(), vec![PLACEHOLDER, "root", "id"]);
    }

    #[test]
    fn test_resolve() {
        let table = NameTable::from_names(["root"]);

        assert_eq!(&*NameTable::resolve(Some(&table), 1).unwrap(), "root");
        assert!(matches!(
            NameTable::resolve(Some(&table), 9),
            Err(Error::NameOutOfRange { index: 9, len: 2 })
        ));
        assert!(matches!(NameTable::resolve(None, 1), Err(Error::UnresolvedName(1))));
    }

    #[test]
    fn test_read_name_without_table_uses_placeholder() {
        let data = 7u16.to_le_bytes();
        let (index, name) = NameTable::read_name(&mut BinaryReader::new(&data), None).unwrap();

        assert_eq!(index, 7);
        assert_eq!(&*name, PLACEHOLDER);
    }
}
