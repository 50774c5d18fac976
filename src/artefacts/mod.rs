//! Artefact registration and serialization.
//!
//! Artefacts are document-level structural features — annotations,
//! outlines, name trees, interactive form fields, embedded files —
//! collected independently of page content and serialized into linked
//! indirect-object graphs at the end of the body pass.
//!
//! Entries and collections are tagged variants dispatched by pattern
//! matching. A collection registers entries against an opaque token,
//! validates stack-disciplined closes, and serializes itself through
//! [`Collection::write_to`], returning `None` when empty so the assembly
//! driver omits the catalog entry entirely.

mod acroform;
mod annotations;
mod attachments;
mod names;
mod outlines;

pub use acroform::{AcroForm, AppearanceState, AppearanceStream, FieldFlags, FieldType, FieldWidget};
pub use annotations::{Annotation, AnnotationList, LinkTarget};
pub use attachments::EmbeddedFile;
pub use names::{DestinationFit, NameDictionary, NamedDestination};
pub use outlines::{OutlineItem, OutlineStack};

use crate::error::{Error, Result};
use crate::object::ObjectRef;
use crate::writer::PdfWriter;
use indexmap::IndexMap;
use std::io::Write;

/// Opaque handle returned by a registration, passed back on close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtefactToken(pub(crate) usize);

/// The artefact collections a document can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtefactKind {
    /// Annotation lists (page-level /Annots arrays)
    Annotations,
    /// The document outline (bookmark) tree
    Outlines,
    /// The catalog /Names dictionary of sorted name trees
    Names,
    /// The interactive form dictionary
    AcroForm,
}

impl ArtefactKind {
    /// The unique collection name; doubles as the catalog dictionary key.
    pub fn collection_name(&self) -> &'static str {
        match self {
            ArtefactKind::Annotations => "Annots",
            ArtefactKind::Outlines => "Outlines",
            ArtefactKind::Names => "Names",
            ArtefactKind::AcroForm => "AcroForm",
        }
    }

    fn create(&self) -> Collection {
        match self {
            ArtefactKind::Annotations => {
                Collection::Annotations(AnnotationList::new(self.collection_name()))
            },
            ArtefactKind::Outlines => Collection::Outlines(OutlineStack::new(self.collection_name())),
            ArtefactKind::Names => Collection::Names(NameDictionary::new(self.collection_name())),
            ArtefactKind::AcroForm => Collection::AcroForm(AcroForm::new(self.collection_name())),
        }
    }
}

/// A structural item that serializes itself to one or more indirect
/// objects once its collection is written.
#[derive(Debug, Clone)]
pub enum ArtefactEntry {
    /// A node in the outline tree
    Outline(OutlineItem),
    /// A named destination for the /Dests name tree
    Destination(NamedDestination),
    /// An embedded file for the /EmbeddedFiles name tree
    Attachment(EmbeddedFile),
    /// An annotation
    Annotation(Annotation),
    /// An interactive form field widget
    Field(FieldWidget),
}

impl ArtefactEntry {
    /// Kind label used in mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ArtefactEntry::Outline(_) => "outline",
            ArtefactEntry::Destination(_) => "destination",
            ArtefactEntry::Attachment(_) => "attachment",
            ArtefactEntry::Annotation(_) => "annotation",
            ArtefactEntry::Field(_) => "field",
        }
    }
}

/// Colors carried by annotations and field appearance dictionaries.
///
/// Only device RGB and grayscale are representable; anything else is a
/// data error that lenient mode degrades to an empty array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    /// Device RGB, components in 0.0..=1.0
    Rgb(f32, f32, f32),
    /// Device grayscale, 0.0..=1.0
    Gray(f32),
    /// Device CMYK (not representable in appearance arrays here)
    Cmyk(f32, f32, f32, f32),
}

/// Write a color as a component array into the open dictionary entry.
///
/// Honours the conformance mode: an unsupported color space aborts in
/// strict mode and degrades to an empty array in lenient mode.
pub(crate) fn write_color_array<W: Write>(writer: &mut PdfWriter<W>, color: Color) -> Result<()> {
    match color {
        Color::Rgb(r, g, b) => {
            writer.write_array_real_entries(&[r as f64, g as f64, b as f64])
        },
        Color::Gray(g) => writer.write_array_real_entries(&[g as f64]),
        Color::Cmyk(..) => {
            writer.handle_data_error(Error::UnsupportedColorSpace("DeviceCMYK"))?;
            writer.write_array_real_entries(&[])
        },
    }
}

/// One of the document's artefact collections.
#[derive(Debug)]
pub enum Collection {
    /// Page annotation list
    Annotations(AnnotationList),
    /// Outline tree
    Outlines(OutlineStack),
    /// Name dictionary of categorized trees
    Names(NameDictionary),
    /// Interactive form
    AcroForm(AcroForm),
}

impl Collection {
    /// The collection's unique name.
    pub fn name(&self) -> &str {
        match self {
            Collection::Annotations(c) => c.name(),
            Collection::Outlines(c) => c.name(),
            Collection::Names(c) => c.name(),
            Collection::AcroForm(c) => c.name(),
        }
    }

    /// True when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        match self {
            Collection::Annotations(c) => c.is_empty(),
            Collection::Outlines(c) => c.is_empty(),
            Collection::Names(c) => c.is_empty(),
            Collection::AcroForm(c) => c.is_empty(),
        }
    }

    /// Register an entry, returning the token used to close it.
    pub fn register(&mut self, entry: ArtefactEntry) -> Result<ArtefactToken> {
        match (self, entry) {
            (Collection::Outlines(c), ArtefactEntry::Outline(item)) => Ok(c.push(item)),
            (Collection::Names(c), ArtefactEntry::Destination(dest)) => c.register_destination(dest),
            (Collection::Names(c), ArtefactEntry::Attachment(file)) => c.register_attachment(file),
            (Collection::Annotations(c), ArtefactEntry::Annotation(annot)) => Ok(c.register(annot)),
            (Collection::AcroForm(c), ArtefactEntry::Field(field)) => Ok(c.register(field)),
            (collection, entry) => Err(Error::InvalidArtefactEntry {
                kind: entry.kind_name(),
                collection: collection.name().to_string(),
            }),
        }
    }

    /// Close a previous registration.
    ///
    /// Stack-disciplined collections (outlines, name trees) verify the
    /// token against their top of stack and fail on unbalanced closes.
    pub fn close(&mut self, token: ArtefactToken) -> Result<()> {
        match self {
            Collection::Outlines(c) => c.pop(token),
            Collection::Names(c) => c.close(token),
            Collection::Annotations(c) => c.close(token),
            Collection::AcroForm(c) => c.close(token),
        }
    }

    /// Serialize the collection.
    ///
    /// Returns the reference the catalog should point at, or `None` when
    /// the collection is empty.
    pub fn write_to<W: Write>(&mut self, writer: &mut PdfWriter<W>) -> Result<Option<ObjectRef>> {
        match self {
            Collection::Annotations(c) => c.write_to(writer),
            Collection::Outlines(c) => c.write_to(writer),
            Collection::Names(c) => c.write_to(writer),
            Collection::AcroForm(c) => c.write_to(writer),
        }
    }
}

/// The document-level registry of artefact collections.
///
/// Collections are created on first registration and keep their
/// registration order; collection names are unique within the set.
#[derive(Debug, Default)]
pub struct ArtefactSet {
    collections: IndexMap<&'static str, Collection>,
}

impl ArtefactSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry with the collection for `kind`, creating the
    /// collection on first use.
    pub fn register(&mut self, kind: ArtefactKind, entry: ArtefactEntry) -> Result<ArtefactToken> {
        let collection = self
            .collections
            .entry(kind.collection_name())
            .or_insert_with(|| kind.create());
        collection.register(entry)
    }

    /// Close a previous registration in the collection for `kind`.
    pub fn close(&mut self, kind: ArtefactKind, token: ArtefactToken) -> Result<()> {
        match self.collections.get_mut(kind.collection_name()) {
            Some(collection) => collection.close(token),
            None => Err(Error::UnbalancedArtefact(
                kind.collection_name().to_string(),
            )),
        }
    }

    /// Access a collection if it has been created.
    pub fn get(&self, kind: ArtefactKind) -> Option<&Collection> {
        self.collections.get(kind.collection_name())
    }

    /// Serialize every collection and return the `(catalog key,
    /// reference)` pairs for the non-empty ones, in registration order.
    pub fn write_all<W: Write>(
        &mut self,
        writer: &mut PdfWriter<W>,
    ) -> Result<Vec<(&'static str, ObjectRef)>> {
        let mut written = Vec::new();
        for (name, collection) in self.collections.iter_mut() {
            if let Some(oref) = collection.write_to(writer)? {
                written.push((*name, oref));
            }
        }
        Ok(written)
    }
}
