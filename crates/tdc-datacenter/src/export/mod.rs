//! XML export of Data Center subtrees.
//!
//! Each element becomes a tag named after it, its attributes become XML
//! attributes and its children nested tags. [`XmlExporter::export_all`]
//! writes one file per child of the root, grouping children that share a
//! name into a directory.
//!
//! With the `parallel` feature the files are written from a rayon pool.

mod xml;

pub use xml::{ExportError, ExportGroup, ExportStats, XmlExporter};
