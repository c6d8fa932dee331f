//! Lazy decoder for the TERA Data Center.
//!
//! The Data Center is the client's main game database: a single tree of
//! named elements carrying typed attributes. Once unpacked (see
//! [`tdc_unpack`]) it is a flat buffer of bucketed regions. This crate reads
//! the region layout once and then decodes elements, attributes and strings
//! on demand, caching each by its coordinate.
//!
//! # Quick Start
//!
//! ```no_run
//! use tdc_datacenter::{DataCenter, Value};
//!
//! let key = [0u8; 16];
//! let iv = [0u8; 16];
//! let dc = DataCenter::load("DataCenter_Final_EUR.dat", key, iv)?;
//!
//! let root = dc.root()?;
//! for child in root.children() {
//!     let child = child?;
//!     println!("{}", child.name());
//!
//!     for attribute in child.attributes() {
//!         let attribute = attribute?;
//!         match attribute.value()? {
//!             Value::Int(v) => println!("  {} = {v} (int)", attribute.name()),
//!             other => println!("  {} = {other}", attribute.name()),
//!         }
//!     }
//! }
//! # Ok::<(), tdc_datacenter::Error>(())
//! ```
//!
//! # Architecture
//!
//! - **Geometry**: a single forward pass over the buffer that records every
//!   bucket's position and record width and builds the name table.
//! - **DataCenter**: the immutable result. Owns the buffer (owned or
//!   memory-mapped), the geometry and the per-region caches.
//! - **Element / Attribute**: handles that borrow the `DataCenter`. Children
//!   and attributes are lazy iterators that can be restarted at will.
//!
//! # Unpacked buffers
//!
//! Unpacking is the slow part of a load. The inflated bytes can be written to
//! disk once and memory-mapped on later runs:
//!
//! ```no_run
//! use tdc_datacenter::DataCenter;
//! use tdc_unpack::Unpacker;
//!
//! let data = Unpacker::new([0u8; 16], [0u8; 16]).unpack_file("DataCenter_Final_EUR.dat")?;
//! std::fs::write("DataCenter.unpacked", &data)?;
//!
//! let dc = DataCenter::open_unpacked("DataCenter.unpacked")?;
//! println!("{} names", dc.names().len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # XML Export
//!
//! With the `xml-export` feature (on by default):
//!
//! ```no_run
//! use tdc_datacenter::{DataCenter, XmlExporter};
//!
//! let dc = DataCenter::open_unpacked("DataCenter.unpacked")?;
//! XmlExporter::new(&dc).export_all("./output", |done, total| {
//!     println!("Progress: {}/{}", done, total);
//! })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod attribute;
mod cache;
mod coordinate;
mod datacenter;
mod element;
mod error;
mod geometry;
mod header;
mod names;
mod options;
mod records;
mod region;
mod source;
mod strings;
mod value;

#[cfg(feature = "xml-export")]
pub mod export;

// Primary API
pub use attribute::{Attribute, Attributes};
pub use coordinate::Coordinate;
pub use datacenter::{DataCenter, DataCenterStats};
pub use element::{Children, Element};
pub use error::{Error, Result};
pub use options::{DecodeOptions, NAMES_METADATA_SLOTS, OPAQUE_RECORD_SIZE, VALUES_METADATA_SLOTS};
pub use value::Value;

// Low-level types
pub use cache::CacheStats;
pub use header::DataCenterHeader;
pub use names::{NameTable, PLACEHOLDER};
pub use records::{AttributeRecord, ElementRecord, RawValue, TypeCode};
pub use region::{Bucket, Region};
pub use source::ByteSource;
pub use strings::{StringMetadata, StringsRegion};

#[cfg(feature = "xml-export")]
pub use export::{ExportError, ExportStats, XmlExporter};

pub use tdc_unpack::{Iv, Key};
