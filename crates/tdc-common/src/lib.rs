//! Common utilities for tdc.
//!
//! - [`BinaryReader`] - cursor over a borrowed byte slice, little-endian reads,
//!   UTF-16 zero-terminated strings and zerocopy structs
//!
//! Every reader is an independent view: creating one never touches shared
//! state, so any number of them can read the same buffer concurrently.

mod error;
mod reader;

pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
