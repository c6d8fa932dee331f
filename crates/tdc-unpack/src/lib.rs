//! Unpacker for the encrypted Data Center file.
//!
//! The file is AES-128-CFB encrypted with a key and IV taken from the game
//! client. Once decrypted it holds a 4-byte size hint, the two-byte zlib
//! marker `0x9C78` and a raw deflate stream.
//!
//! ```no_run
//! use tdc_unpack::Unpacker;
//!
//! let key = [0u8; 16];
//! let iv = [0u8; 16];
//! let data = Unpacker::new(key, iv).unpack_file("DataCenter_Final_EUR.dat")?;
//! println!("{} bytes", data.len());
//! # Ok::<(), tdc_unpack::Error>(())
//! ```

mod crypto;
mod error;
mod unpack;

pub use crypto::{DecryptReader, Iv, Key, BLOCK_SIZE};
pub use error::{Error, Result};
pub use unpack::{Unpacked, Unpacker, HEADER_SIZE, ZLIB_MAGIC};
