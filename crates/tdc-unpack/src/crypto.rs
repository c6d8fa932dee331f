//! Data Center decryption using AES-128-CFB.
//!
//! The file is not padded to the block size. The final partial block is
//! zero-extended before it goes through the cipher and only the bytes that
//! were actually present in the input are handed out.

use std::io::{self, Read};

use cipher::generic_array::GenericArray;
use cipher::{BlockDecryptMut, KeyIvInit};
use tracing::trace;

type Aes128CfbDec = cfb_mode::Decryptor<aes::Aes128>;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// 128-bit decryption key.
pub type Key = [u8; 16];

/// 128-bit initialization vector.
pub type Iv = [u8; 16];

/// Bytes pulled from the inner reader per refill. Multiple of [`BLOCK_SIZE`].
const CHUNK_SIZE: usize = 0x14000;

/// A [`Read`] adapter that decrypts everything read from `inner`.
pub struct DecryptReader<R> {
    inner: R,
    cipher: Aes128CfbDec,
    buffer: Vec<u8>,
    start: usize,
    end: usize,
    finished: bool,
}

impl<R: Read> DecryptReader<R> {
    /// Wrap `inner`, decrypting with the given key and IV.
    pub fn new(inner: R, key: &Key, iv: &Iv) -> Self {
        let cipher = Aes128CfbDec::new(GenericArray::from_slice(key), GenericArray::from_slice(iv));
        Self {
            inner,
            cipher,
            buffer: vec![0u8; CHUNK_SIZE],
            start: 0,
            end: 0,
            finished: false,
        }
    }

    /// Unwrap the inner reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn refill(&mut self) -> io::Result<()> {
        let mut filled = 0;
        while filled < CHUNK_SIZE {
            match self.inner.read(&mut self.buffer[filled..]) {
                Ok(0) => {
                    self.finished = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        let tail = filled % BLOCK_SIZE;
        let padded = if tail == 0 { filled } else { filled + BLOCK_SIZE - tail };
        self.buffer[filled..padded].fill(0);

        for block in self.buffer[..padded].chunks_exact_mut(BLOCK_SIZE) {
            self.cipher.decrypt_block_mut(GenericArray::from_mut_slice(block));
        }

        trace!(bytes = filled, padded, "decrypted chunk");
        self.start = 0;
        self.end = filled;
        Ok(())
    }
}

impl<R: Read> Read for DecryptReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        if self.start == self.end {
            if self.finished {
                return Ok(0);
            }
            self.refill()?;
            if self.start == self.end {
                return Ok(0);
            }
        }

        let n = out.len().min(self.end - self.start);
        out[..n].copy_from_slice(&self.buffer[self.start..self.start + n]);
        self.start += n;
        Ok(n)
    }
}
