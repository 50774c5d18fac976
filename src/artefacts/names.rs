//! Sorted name trees and the catalog /Names dictionary.
//!
//! Each category (destinations, embedded files) keeps its entries in a
//! key-sorted tree. Serialization emits a single flat level: a /Names
//! array of interleaved key/value pairs plus the /Limits pair. Large
//! trees are not yet split into intermediate nodes; see
//! [`NAME_TREE_BREAK_POINT`].

use super::{ArtefactToken, EmbeddedFile};
use crate::error::{Error, Result};
use crate::object::ObjectRef;
use crate::writer::PdfWriter;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::io::Write;

/// Category name for destination entries.
pub const DESTINATIONS_CATEGORY: &str = "Dests";
/// Category name for embedded file entries.
pub const EMBEDDED_FILES_CATEGORY: &str = "EmbeddedFiles";

/// Entry count at which a tree would be split into intermediate nodes.
/// Serialization currently always emits one flat leaf level, so trees
/// past this size only log a debug note.
pub const NAME_TREE_BREAK_POINT: usize = 64;

/// How the viewer should fit the page a destination points at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DestinationFit {
    /// Fit the entire page in the window
    Fit,
    /// Fit the page width, optionally scrolled to a top coordinate
    FitH(Option<f64>),
    /// Display at a position with an optional zoom factor
    Xyz {
        /// Left coordinate (None leaves it unchanged)
        left: Option<f64>,
        /// Top coordinate (None leaves it unchanged)
        top: Option<f64>,
        /// Zoom factor (None leaves it unchanged)
        zoom: Option<f64>,
    },
}

/// A named destination: a sorted-tree key mapping to a page and fit.
#[derive(Debug, Clone)]
pub struct NamedDestination {
    /// The full identifying name; duplicates are equivalent
    pub name: String,
    /// Reference of the destination page object
    pub page: ObjectRef,
    /// Page fit mode
    pub fit: DestinationFit,
}

impl NamedDestination {
    /// Create a destination with the default whole-page fit.
    pub fn new(name: impl Into<String>, page: ObjectRef) -> Self {
        Self {
            name: name.into(),
            page,
            fit: DestinationFit::Fit,
        }
    }

    /// Set the fit mode.
    pub fn with_fit(mut self, fit: DestinationFit) -> Self {
        self.fit = fit;
        self
    }

    fn write_value<W: Write>(&self, writer: &mut PdfWriter<W>) -> Result<ObjectRef> {
        let oref = writer.begin_object()?;
        writer.begin_array()?;
        writer.begin_array_entry()?;
        writer.write_object_ref(self.page)?;
        writer.end_array_entry()?;
        write_fit(writer, self.fit)?;
        writer.end_array()?;
        writer.end_object()?;
        Ok(oref)
    }
}

/// Write a fit mode's name and parameters as entries of the open
/// destination array.
pub(crate) fn write_fit<W: Write>(writer: &mut PdfWriter<W>, fit: DestinationFit) -> Result<()> {
    match fit {
        DestinationFit::Fit => {
            writer.begin_array_entry()?;
            writer.write_name("Fit")?;
            writer.end_array_entry()
        },
        DestinationFit::FitH(top) => {
            writer.begin_array_entry()?;
            writer.write_name("FitH")?;
            writer.end_array_entry()?;
            writer.begin_array_entry()?;
            match top {
                Some(top) => writer.write_real(top)?,
                None => writer.write_null()?,
            }
            writer.end_array_entry()
        },
        DestinationFit::Xyz { left, top, zoom } => {
            writer.begin_array_entry()?;
            writer.write_name("XYZ")?;
            writer.end_array_entry()?;
            for part in [left, top, zoom] {
                writer.begin_array_entry()?;
                match part {
                    Some(value) => writer.write_real(value)?,
                    None => writer.write_null()?,
                }
                writer.end_array_entry()?;
            }
            Ok(())
        },
    }
}

/// A value held by a name tree.
#[derive(Debug, Clone)]
enum NameEntry {
    Destination(NamedDestination),
    Attachment(EmbeddedFile),
}

impl NameEntry {
    fn write_value<W: Write>(&mut self, writer: &mut PdfWriter<W>) -> Result<ObjectRef> {
        match self {
            NameEntry::Destination(dest) => dest.write_value(writer),
            NameEntry::Attachment(file) => file.write_filespec(writer),
        }
    }
}

/// One key-sorted tree of a single category.
#[derive(Debug)]
struct NameTree {
    category: String,
    entries: BTreeMap<String, NameEntry>,
    open: Vec<String>,
}

impl NameTree {
    fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            entries: BTreeMap::new(),
            open: Vec::new(),
        }
    }

    fn push(&mut self, key: String, entry: NameEntry) {
        self.entries.insert(key.clone(), entry);
        self.open.push(key);
    }

    fn pop(&mut self, key: &str) -> Result<()> {
        match self.open.pop() {
            Some(top) if top == key => Ok(()),
            _ => Err(Error::UnbalancedArtefact(self.category.clone())),
        }
    }

    fn write_to<W: Write>(&mut self, writer: &mut PdfWriter<W>) -> Result<Option<ObjectRef>> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        if !self.open.is_empty() {
            return Err(Error::UnbalancedArtefact(self.category.clone()));
        }
        if self.entries.len() > NAME_TREE_BREAK_POINT {
            log::debug!(
                "Name tree '{}' holds {} entries in a single flat level",
                self.category,
                self.entries.len()
            );
        }

        // values first, so the tree node itself only interleaves keys
        // with already-known references
        let mut pairs: Vec<(String, ObjectRef)> = Vec::with_capacity(self.entries.len());
        for (key, entry) in self.entries.iter_mut() {
            let oref = entry.write_value(writer)?;
            pairs.push((key.clone(), oref));
        }

        let node = writer.begin_object()?;
        writer.begin_dictionary()?;
        writer.begin_dictionary_entry("Limits")?;
        writer.begin_array()?;
        for key in [&pairs[0].0, &pairs[pairs.len() - 1].0] {
            writer.begin_array_entry()?;
            writer.write_string_literal(key)?;
            writer.end_array_entry()?;
        }
        writer.end_array()?;
        writer.end_dictionary_entry()?;

        writer.begin_dictionary_entry("Names")?;
        writer.begin_array()?;
        for (key, oref) in &pairs {
            writer.begin_array_entry()?;
            writer.write_string_literal(key)?;
            writer.end_array_entry()?;
            writer.begin_array_entry()?;
            writer.write_object_ref(*oref)?;
            writer.end_array_entry()?;
        }
        writer.end_array()?;
        writer.end_dictionary_entry()?;
        writer.end_dictionary()?;
        writer.end_object()?;
        Ok(Some(node))
    }
}

/// The catalog /Names dictionary: a tree per category.
#[derive(Debug)]
pub struct NameDictionary {
    name: &'static str,
    trees: IndexMap<String, NameTree>,
    registrations: Vec<(String, String)>,
}

impl NameDictionary {
    /// Create an empty name dictionary.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            trees: IndexMap::new(),
            registrations: Vec::new(),
        }
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// True when no entries have been registered.
    pub fn is_empty(&self) -> bool {
        self.trees.values().all(|tree| tree.entries.is_empty())
    }

    /// Register a named destination in the destinations tree.
    pub fn register_destination(&mut self, dest: NamedDestination) -> Result<ArtefactToken> {
        let key = dest.name.clone();
        self.register(DESTINATIONS_CATEGORY, key, NameEntry::Destination(dest))
    }

    /// Register an embedded file in the embedded-files tree.
    pub fn register_attachment(&mut self, file: EmbeddedFile) -> Result<ArtefactToken> {
        let key = file.destination_name.clone();
        self.register(EMBEDDED_FILES_CATEGORY, key, NameEntry::Attachment(file))
    }

    fn register(&mut self, category: &str, key: String, entry: NameEntry) -> Result<ArtefactToken> {
        let tree = self
            .trees
            .entry(category.to_string())
            .or_insert_with(|| NameTree::new(category));
        tree.push(key.clone(), entry);
        let token = ArtefactToken(self.registrations.len());
        self.registrations.push((category.to_string(), key));
        Ok(token)
    }

    /// Close a previous registration, popping its tree's stack.
    pub fn close(&mut self, token: ArtefactToken) -> Result<()> {
        let (category, key) = self
            .registrations
            .get(token.0)
            .cloned()
            .ok_or_else(|| Error::UnbalancedArtefact(self.name.to_string()))?;
        match self.trees.get_mut(&category) {
            Some(tree) => tree.pop(&key),
            None => Err(Error::UnbalancedArtefact(self.name.to_string())),
        }
    }

    /// Serialize the dictionary and its trees.
    pub fn write_to<W: Write>(&mut self, writer: &mut PdfWriter<W>) -> Result<Option<ObjectRef>> {
        if self.is_empty() {
            return Ok(None);
        }
        let names = writer.begin_object()?;
        writer.begin_dictionary()?;
        for (category, tree) in self.trees.iter_mut() {
            if let Some(oref) = tree.write_to(writer)? {
                writer.write_dictionary_object_ref_entry(category, oref)?;
            }
        }
        writer.end_dictionary()?;
        writer.end_object()?;
        Ok(Some(names))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WriterConfig;

    fn writer() -> PdfWriter<Vec<u8>> {
        PdfWriter::new(Vec::new(), WriterConfig::default())
    }

    fn page(n: u32) -> ObjectRef {
        ObjectRef::new(n, 0)
    }

    #[test]
    fn test_empty_dictionary_writes_nothing() {
        let mut names = NameDictionary::new("Names");
        let mut w = writer();
        assert!(names.write_to(&mut w).unwrap().is_none());
        assert!(w.into_inner().is_empty());
    }

    #[test]
    fn test_entries_emitted_in_sorted_order_with_limits() {
        let mut names = NameDictionary::new("Names");
        for key in ["zeta", "alpha", "midway"] {
            let token = names
                .register_destination(NamedDestination::new(key, page(9)))
                .unwrap();
            names.close(token).unwrap();
        }

        let mut w = writer();
        names.write_to(&mut w).unwrap().unwrap();
        let text = String::from_utf8_lossy(&w.into_inner()).into_owned();

        let names_array = &text[text.find("/Names [").unwrap()..];
        let alpha = names_array.find("(alpha)").unwrap();
        let midway = names_array.find("(midway)").unwrap();
        let zeta = names_array.find("(zeta)").unwrap();
        assert!(alpha < midway && midway < zeta);
        assert!(text.contains("/Limits [(alpha) (zeta)]"));
    }

    #[test]
    fn test_destination_array_forms() {
        let mut names = NameDictionary::new("Names");
        let token = names
            .register_destination(
                NamedDestination::new("top", page(4)).with_fit(DestinationFit::Xyz {
                    left: None,
                    top: Some(720.0),
                    zoom: None,
                }),
            )
            .unwrap();
        names.close(token).unwrap();

        let mut w = writer();
        names.write_to(&mut w).unwrap();
        let text = String::from_utf8_lossy(&w.into_inner()).into_owned();
        assert!(text.contains("[4 0 R /XYZ null 720 null]"));
    }

    #[test]
    fn test_unbalanced_close_fails() {
        let mut names = NameDictionary::new("Names");
        let first = names
            .register_destination(NamedDestination::new("first", page(1)))
            .unwrap();
        let _second = names
            .register_destination(NamedDestination::new("second", page(2)))
            .unwrap();
        // closing out of order against the tree's stack
        assert!(names.close(first).is_err());
    }

    #[test]
    fn test_open_registration_blocks_output() {
        let mut names = NameDictionary::new("Names");
        let _token = names
            .register_destination(NamedDestination::new("open", page(1)))
            .unwrap();
        let mut w = writer();
        assert!(matches!(
            names.write_to(&mut w).unwrap_err(),
            Error::UnbalancedArtefact(_)
        ));
    }

    #[test]
    fn test_category_entries_in_names_dictionary() {
        let mut names = NameDictionary::new("Names");
        let token = names
            .register_destination(NamedDestination::new("intro", page(3)))
            .unwrap();
        names.close(token).unwrap();

        let mut w = writer();
        names.write_to(&mut w).unwrap().unwrap();
        let text = String::from_utf8_lossy(&w.into_inner()).into_owned();
        assert!(text.contains("/Dests"));
        assert!(text.contains("/Names [(intro) 2 0 R]"));
    }
}
