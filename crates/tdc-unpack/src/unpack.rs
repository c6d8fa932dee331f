//! Decrypt, validate and inflate the Data Center stream.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use memmap2::Mmap;
use tracing::{debug, info};

use crate::crypto::{DecryptReader, Iv, Key};
use crate::{Error, Result};

/// zlib stream marker (`78 9C`) read as a little-endian `u16`.
pub const ZLIB_MAGIC: u16 = 0x9C78;

/// Size hint (4 bytes) plus marker (2 bytes).
pub const HEADER_SIZE: usize = 6;

/// Cap on the up-front allocation derived from the untrusted size hint.
const MAX_PREALLOCATION: usize = 1 << 30;

/// Unpacks Data Center files encrypted with a fixed key/IV pair.
#[derive(Clone)]
pub struct Unpacker {
    key: Key,
    iv: Iv,
}

impl std::fmt::Debug for Unpacker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unpacker").finish_non_exhaustive()
    }
}

impl Unpacker {
    pub fn new(key: Key, iv: Iv) -> Self {
        Self { key, iv }
    }

    /// Start a streaming decrypt → inflate pipeline over `input`.
    ///
    /// The size hint and marker are read and checked before this returns, so
    /// a wrong key or IV fails here without inflating anything.
    pub fn reader<R: Read>(&self, input: R) -> Result<Unpacked<R>> {
        let mut decrypted = DecryptReader::new(input, &self.key, &self.iv);

        let size_hint = read_header_field(&mut decrypted, 0, |r| r.read_u32::<LittleEndian>())?;
        let magic = read_header_field(&mut decrypted, 4, |r| r.read_u16::<LittleEndian>())?;

        if magic != ZLIB_MAGIC {
            return Err(Error::IncorrectKeyOrIv {
                expected: ZLIB_MAGIC,
                actual: magic,
            });
        }

        debug!(size_hint, "zlib marker found, inflating payload");
        Ok(Unpacked {
            size_hint,
            decoder: DeflateDecoder::new(decrypted),
        })
    }

    /// Decrypt and fully inflate `input` into memory.
    pub fn unpack<R: Read>(&self, input: R) -> Result<Vec<u8>> {
        let mut unpacked = self.reader(input)?;
        let mut output = Vec::with_capacity((unpacked.size_hint() as usize).min(MAX_PREALLOCATION));

        unpacked.read_to_end(&mut output).map_err(map_inflate_error)?;

        if output.len() != unpacked.size_hint() as usize {
            debug!(
                size_hint = unpacked.size_hint(),
                actual = output.len(),
                "inflated size differs from size hint"
            );
        }
        Ok(output)
    }

    /// Decrypt and inflate an in-memory file.
    pub fn unpack_slice(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.unpack(data)
    }

    /// Decrypt and inflate a file on disk (memory-mapped).
    pub fn unpack_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<u8>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // SAFETY: the map is read-only and dropped before this function returns.
        let mmap = unsafe { Mmap::map(&file)? };

        let output = self.unpack_slice(&mmap)?;
        info!(
            path = %path.display(),
            packed = mmap.len(),
            unpacked = output.len(),
            "unpacked Data Center"
        );
        Ok(output)
    }
}

/// Streaming view of the inflated payload.
pub struct Unpacked<R: Read> {
    size_hint: u32,
    decoder: DeflateDecoder<DecryptReader<R>>,
}

impl<R: Read> Unpacked<R> {
    /// The decompressed size announced by the file. Not validated.
    pub fn size_hint(&self) -> u32 {
        self.size_hint
    }
}

impl<R: Read> Read for Unpacked<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.decoder.read(buf)
    }
}

fn read_header_field<R: Read, T>(
    reader: &mut R,
    offset: usize,
    read: impl FnOnce(&mut R) -> io::Result<T>,
) -> Result<T> {
    read(reader).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::TruncatedData {
            needed: HEADER_SIZE,
            available: offset,
        },
        _ => Error::Io(e),
    })
}

fn map_inflate_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => Error::Decompression(e.to_string()),
        io::ErrorKind::UnexpectedEof => Error::Decompression(format!("deflate stream ended early: {e}")),
        _ => Error::Io(e),
    }
}
