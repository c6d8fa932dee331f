//! Position-free binary reader over the unpacked Data Center buffer.
//!
//! A [`BinaryReader`] owns nothing but a cursor. Random-access decodes create
//! a fresh reader at the record's address instead of seeking a shared one.

use zerocopy::FromBytes;

use crate::{Error, Result};

/// A little-endian cursor over a borrowed byte slice.
///
/// # Example
///
/// ```
/// use tdc_common::BinaryReader;
///
/// let data = [0x78, 0x9C, 0x41, 0x00, 0x00, 0x00];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u16().unwrap(), 0x9C78);
/// assert_eq!(reader.read_utf16z().unwrap(), "A");
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Create a new reader starting at an absolute offset.
    #[inline]
    pub const fn new_at(data: &'a [u8], position: usize) -> Self {
        Self { data, position }
    }

    /// Current absolute offset.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Number of bytes left after the cursor.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// True once the cursor is at or past the end of the buffer.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Move the cursor to an absolute offset.
    ///
    /// Seeking past the end is allowed; the next read reports the shortfall.
    #[inline]
    pub fn seek(&mut self, position: usize) {
        self.position = position;
    }

    /// Move the cursor forward without reading.
    #[inline]
    pub fn advance(&mut self, count: usize) {
        self.position = self.position.saturating_add(count);
    }

    /// Look at the next `count` bytes without consuming them.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.position > self.data.len() || self.remaining() < count {
            return Err(Error::UnexpectedEof {
                position: self.position,
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read `count` bytes.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    #[inline]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_array().map(f32::from_le_bytes)
    }

    /// Read a zero-terminated UTF-16LE string.
    ///
    /// The terminator is consumed but not returned. Unpaired surrogates are
    /// replaced with U+FFFD. Running off the end of the buffer before the
    /// terminator is an [`Error::UnexpectedEof`].
    pub fn read_utf16z(&mut self) -> Result<String> {
        let mut units = Vec::new();

        loop {
            let unit = self.read_u16()?;
            if unit == 0 {
                break;
            }
            units.push(unit);
        }

        Ok(String::from_utf16_lossy(&units))
    }

    /// Read a fixed-layout struct using zerocopy.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let position = self.position;
        let bytes = self.read_bytes(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            position,
            needed: size,
            available: bytes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let data = [
            0x01u8, 0x02, // u16: 0x0201
            0xFF, 0xFF, 0xFF, 0xFF, // i32: -1
            0x00, 0x00, 0x80, 0x3F, // f32: 1.0
        ];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_u16().unwrap(), 0x0201);
        assert_eq!(reader.read_i32().unwrap(), -1);
        assert_eq!(reader.read_f32().unwrap(), 1.0);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_read_utf16z() {
        let data = [b'h', 0, b'i', 0, 0, 0, b'x', 0, 0, 0];
        let mut reader = BinaryReader::new(&data);

        assert_eq!(reader.read_utf16z().unwrap(), "hi");
        assert_eq!(reader.position(), 6);
        assert_eq!(reader.read_utf16z().unwrap(), "x");
    }

    #[test]
    fn test_utf16z_without_terminator() {
        let data = [b'h', 0, b'i', 0];
        let mut reader = BinaryReader::new(&data);

        assert!(matches!(
            reader.read_utf16z(),
            Err(Error::UnexpectedEof { position: 4, needed: 2, available: 0 })
        ));
    }

    #[test]
    fn test_new_at_is_independent() {
        let data = [1u8, 0, 2, 0, 3, 0];
        let mut a = BinaryReader::new_at(&data, 2);
        let mut b = BinaryReader::new_at(&data, 4);

        assert_eq!(a.read_u16().unwrap(), 2);
        assert_eq!(b.read_u16().unwrap(), 3);
        assert_eq!(a.position(), 4);
    }

    #[test]
    fn test_eof_error_reports_position() {
        let data = [0x01, 0x02, 0x03];
        let mut reader = BinaryReader::new_at(&data, 1);

        match reader.read_i32() {
            Err(Error::UnexpectedEof { position, needed, available }) => {
                assert_eq!((position, needed, available), (1, 4, 2));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_seek_past_end_fails_on_read() {
        let data = [0u8; 4];
        let mut reader = BinaryReader::new(&data);
        reader.seek(10);

        assert!(reader.is_empty());
        assert!(reader.read_u16().is_err());
    }
}
