//! TERA Data Center unpacking and decoding library.
//!
//! This crate re-exports the workspace crates under one roof.
//!
//! # Crates
//!
//! - [`tdc_common`] - Position-free binary reading
//! - [`tdc_unpack`] - AES-128-CFB decryption and inflation of the packed file
//! - [`tdc_datacenter`] - Lazy, cached decoding of the element tree
//!
//! # Example
//!
//! ```no_run
//! use tdc::prelude::*;
//!
//! let dc = DataCenter::load("DataCenter_Final_EUR.dat", [0u8; 16], [0u8; 16])?;
//! let root = dc.root()?;
//! println!("{} has {} children", root.name(), root.child_count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use tdc_common as common;
pub use tdc_datacenter as datacenter;
pub use tdc_unpack as unpack;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tdc_common::BinaryReader;
    pub use tdc_datacenter::{
        Attribute, Coordinate, DataCenter, DecodeOptions, Element, Value, XmlExporter,
    };
    pub use tdc_unpack::{Iv, Key, Unpacker};
}

// Re-export commonly used types at the crate root
pub use tdc_datacenter::{DataCenter, XmlExporter};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
