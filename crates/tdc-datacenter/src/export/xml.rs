//! Element to XML conversion and the directory layout of a full export.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use thiserror::Error;
use tracing::{debug, info};

use crate::{DataCenter, Element};

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("XML error: {0}")]
    Xml(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("read error: {0}")]
    Read(#[from] crate::Error),
}

/// Root children sharing one name.
#[derive(Debug, Clone)]
pub struct ExportGroup<'a> {
    pub name: String,
    pub elements: Vec<Element<'a>>,
}

impl<'a> ExportGroup<'a> {
    /// Output file of every element in the group, relative to `dir`.
    ///
    /// A lone element goes to `dir/<name>.xml`; otherwise each one goes to
    /// `dir/<name>/<name>_<n>.xml` in root order.
    pub fn paths(&self, dir: &Path) -> Vec<PathBuf> {
        let stem = file_stem(&self.name);
        if self.elements.len() == 1 {
            return vec![dir.join(format!("{stem}.xml"))];
        }
        let group_dir = dir.join(&stem);
        (0..self.elements.len())
            .map(|i| group_dir.join(format!("{stem}_{i}.xml")))
            .collect()
    }
}

/// Statistics from an export run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportStats {
    /// Files written.
    pub exported: usize,
    /// Files that failed.
    pub errors: usize,
    /// Files attempted.
    pub total: usize,
}

impl ExportStats {
    pub fn is_complete(&self) -> bool {
        self.errors == 0 && self.exported == self.total
    }
}

/// XML exporter for Data Center elements.
pub struct XmlExporter<'a> {
    data_center: &'a DataCenter,
}

impl<'a> XmlExporter<'a> {
    pub fn new(data_center: &'a DataCenter) -> Self {
        Self { data_center }
    }

    /// Export an element subtree to an XML string.
    pub fn export_element(&self, element: &Element<'_>) -> Result<String, ExportError> {
        let mut output = Vec::new();
        self.write_element(element, &mut output)?;
        String::from_utf8(output).map_err(|e| ExportError::Xml(e.to_string()))
    }

    /// Write an element subtree as an XML document.
    pub fn write_element<W: Write>(&self, element: &Element<'_>, writer: W) -> Result<(), ExportError> {
        let mut writer = Writer::new_with_indent(writer, b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(|e| ExportError::Xml(e.to_string()))?;
        write_subtree(&mut writer, element)?;
        writer.get_mut().flush()?;
        Ok(())
    }

    /// Export an element subtree to `path`, creating parent directories.
    pub fn export_to_file<P: AsRef<Path>>(&self, element: &Element<'_>, path: P) -> Result<(), ExportError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = BufWriter::new(File::create(path)?);
        self.write_element(element, file)?;
        debug!(path = %path.display(), element = element.name(), "exported element");
        Ok(())
    }

    /// Group the root's children by name, in order of first appearance.
    pub fn groups(&self) -> Result<Vec<ExportGroup<'a>>, ExportError> {
        let root = self.data_center.root()?;
        let mut groups: Vec<ExportGroup<'a>> = Vec::new();

        for child in root.children() {
            let child = child?;
            match groups.iter_mut().find(|g| g.name == child.name()) {
                Some(group) => group.elements.push(child),
                None => groups.push(ExportGroup {
                    name: child.name().to_string(),
                    elements: vec![child],
                }),
            }
        }
        Ok(groups)
    }

    /// Export every child of the root into `output_dir`.
    ///
    /// The progress callback receives `(completed, total)` file counts.
    pub fn export_all<P, F>(&self, output_dir: P, progress: F) -> Result<ExportStats, ExportError>
    where
        P: AsRef<Path>,
        F: FnMut(usize, usize) + Send,
    {
        let groups = self.groups()?;
        self.export_groups(output_dir, &groups, progress)
    }

    /// Export the given groups into `output_dir`.
    pub fn export_groups<P, F>(
        &self,
        output_dir: P,
        groups: &[ExportGroup<'a>],
        progress: F,
    ) -> Result<ExportStats, ExportError>
    where
        P: AsRef<Path>,
        F: FnMut(usize, usize) + Send,
    {
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir)?;

        let jobs: Vec<(&Element<'a>, PathBuf)> = groups
            .iter()
            .flat_map(|group| group.elements.iter().zip(group.paths(output_dir)))
            .collect();

        let stats = self.run(&jobs, progress)?;
        info!(
            dir = %output_dir.display(),
            exported = stats.exported,
            errors = stats.errors,
            "export finished"
        );
        Ok(stats)
    }

    #[cfg(not(feature = "parallel"))]
    fn run<F>(&self, jobs: &[(&Element<'a>, PathBuf)], mut progress: F) -> Result<ExportStats, ExportError>
    where
        F: FnMut(usize, usize) + Send,
    {
        let total = jobs.len();
        for (i, (element, path)) in jobs.iter().enumerate() {
            progress(i, total);
            self.export_to_file(element, path)?;
        }
        progress(total, total);

        Ok(ExportStats {
            exported: total,
            errors: 0,
            total,
        })
    }

    #[cfg(feature = "parallel")]
    fn run<F>(&self, jobs: &[(&Element<'a>, PathBuf)], mut progress: F) -> Result<ExportStats, ExportError>
    where
        F: FnMut(usize, usize) + Send,
    {
        use std::sync::atomic::{AtomicUsize, Ordering};

        use parking_lot::Mutex;
        use rayon::prelude::*;
        use tracing::warn;

        let total = jobs.len();
        let exported = AtomicUsize::new(0);
        let errors = AtomicUsize::new(0);
        let progress = Mutex::new(&mut progress);

        jobs.par_iter().for_each(|(element, path)| {
            match self.export_to_file(element, path) {
                Ok(()) => {
                    exported.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "export failed");
                    errors.fetch_add(1, Ordering::Relaxed);
                }
            }

            let done = exported.load(Ordering::Relaxed) + errors.load(Ordering::Relaxed);
            if let Some(mut p) = progress.try_lock() {
                (*p)(done, total);
            }
        });

        (*progress.lock())(total, total);

        Ok(ExportStats {
            exported: exported.load(Ordering::Relaxed),
            errors: errors.load(Ordering::Relaxed),
            total,
        })
    }
}

fn write_subtree<W: Write>(writer: &mut Writer<W>, element: &Element<'_>) -> Result<(), ExportError> {
    let tag = encode_xml_name(element.name());
    let mut start = BytesStart::new(tag.as_str());

    for attribute in element.attributes() {
        let attribute = attribute?;
        let value = attribute.value()?.to_string();
        start.push_attribute((encode_xml_name(attribute.name()).as_str(), value.as_str()));
    }

    if element.child_count() == 0 {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| ExportError::Xml(e.to_string()))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| ExportError::Xml(e.to_string()))?;
    for child in element.children() {
        write_subtree(writer, &child?)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(tag.as_str())))
        .map_err(|e| ExportError::Xml(e.to_string()))?;

    Ok(())
}

/// Make a name usable as an XML tag or attribute name.
fn encode_xml_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());

    for (i, c) in name.chars().enumerate() {
        let valid = if i == 0 {
            c.is_alphabetic() || c == '_'
        } else {
            c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
        };
        if valid {
            result.push(c);
        } else {
            result.push('_');
            if i == 0 && c.is_ascii_digit() {
                result.push(c);
            }
        }
    }

    if result.is_empty() {
        result.push_str("Element");
    }
    result
}

/// Make a name usable as a single path component.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match stem.as_str() {
        "" | "." | ".." => format!("_{stem}"),
        _ => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_xml_name() {
        assert_eq!(encode_xml_name("ItemData"), "ItemData");
        assert_eq!(encode_xml_name("1st"), "_1st");
        assert_eq!(encode_xml_name("a b"), "a_b");
        assert_eq!(encode_xml_name(""), "Element");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("StrSheet_Item"), "StrSheet_Item");
        assert_eq!(file_stem("a/b"), "a_b");
        assert_eq!(file_stem(".."), "_..");
    }
}
