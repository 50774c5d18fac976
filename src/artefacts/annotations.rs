//! Annotation entries and the per-page annotation list.
//!
//! The writer does not interpret annotation semantics; producers supply
//! resolved rectangles, colors, and targets, and the list serializes
//! them into an /Annots array of annotation dictionaries.

use super::names::DestinationFit;
use super::{ArtefactToken, Color};
use crate::error::{Error, Result};
use crate::object::ObjectRef;
use crate::writer::PdfWriter;
use std::io::Write;

/// Where a link annotation leads.
#[derive(Debug, Clone)]
pub enum LinkTarget {
    /// An external URI action
    Uri(String),
    /// A named destination registered in the /Dests name tree
    Named(String),
    /// A direct page destination
    Page {
        /// Reference of the target page object
        page: ObjectRef,
        /// Page fit mode
        fit: DestinationFit,
    },
}

#[derive(Debug, Clone)]
enum AnnotationKind {
    Link(LinkTarget),
    Note { icon: Option<String> },
}

/// A single annotation supplied by a content producer.
#[derive(Debug, Clone)]
pub struct Annotation {
    kind: AnnotationKind,
    rect: [f64; 4],
    contents: Option<String>,
    color: Option<Color>,
    border: Option<[f64; 3]>,
}

impl Annotation {
    /// Create a link annotation over `rect`.
    pub fn link(rect: [f64; 4], target: LinkTarget) -> Self {
        Self {
            kind: AnnotationKind::Link(target),
            rect,
            contents: None,
            color: None,
            border: None,
        }
    }

    /// Create a text (sticky note) annotation at `rect`.
    pub fn note(rect: [f64; 4], contents: impl Into<String>) -> Self {
        Self {
            kind: AnnotationKind::Note { icon: None },
            rect,
            contents: Some(contents.into()),
            color: None,
            border: None,
        }
    }

    /// Set the note icon name (e.g. `Comment`).
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        if let AnnotationKind::Note { icon: slot } = &mut self.kind {
            *slot = Some(icon.into());
        }
        self
    }

    /// Set the annotation color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Set the border array `[horizontal radius, vertical radius, width]`.
    pub fn with_border(mut self, border: [f64; 3]) -> Self {
        self.border = Some(border);
        self
    }

    /// Set the text contents.
    pub fn with_contents(mut self, contents: impl Into<String>) -> Self {
        self.contents = Some(contents.into());
        self
    }

    fn subtype(&self) -> &'static str {
        match self.kind {
            AnnotationKind::Link(_) => "Link",
            AnnotationKind::Note { .. } => "Text",
        }
    }

    /// Serialize this annotation as its own indirect object.
    pub fn write_to<W: Write>(&self, writer: &mut PdfWriter<W>) -> Result<ObjectRef> {
        let oref = writer.begin_object()?;
        writer.begin_dictionary()?;
        writer.write_dictionary_name_entry("Type", "Annot")?;
        writer.write_dictionary_name_entry("Subtype", self.subtype())?;
        writer.begin_dictionary_entry("Rect")?;
        writer.write_array_real_entries(&self.rect)?;
        writer.end_dictionary_entry()?;

        if let Some(contents) = &self.contents {
            writer.write_dictionary_string_entry("Contents", contents)?;
        }
        if let Some(color) = self.color {
            writer.begin_dictionary_entry("C")?;
            super::write_color_array(writer, color)?;
            writer.end_dictionary_entry()?;
        }
        if let Some(border) = self.border {
            writer.begin_dictionary_entry("Border")?;
            writer.write_array_real_entries(&border)?;
            writer.end_dictionary_entry()?;
        }

        match &self.kind {
            AnnotationKind::Link(LinkTarget::Uri(uri)) => {
                writer.begin_dictionary_entry("A")?;
                writer.begin_dictionary()?;
                writer.write_dictionary_name_entry("Type", "Action")?;
                writer.write_dictionary_name_entry("S", "URI")?;
                writer.write_dictionary_string_entry("URI", uri)?;
                writer.end_dictionary()?;
                writer.end_dictionary_entry()?;
            },
            AnnotationKind::Link(LinkTarget::Named(name)) => {
                writer.write_dictionary_string_entry("Dest", name)?;
            },
            AnnotationKind::Link(LinkTarget::Page { page, fit }) => {
                writer.begin_dictionary_entry("Dest")?;
                writer.begin_array()?;
                writer.begin_array_entry()?;
                writer.write_object_ref(*page)?;
                writer.end_array_entry()?;
                super::names::write_fit(writer, *fit)?;
                writer.end_array()?;
                writer.end_dictionary_entry()?;
            },
            AnnotationKind::Note { icon } => {
                if let Some(icon) = icon {
                    writer.write_dictionary_name_entry("Name", icon)?;
                }
            },
        }

        writer.end_dictionary()?;
        writer.end_object()?;
        Ok(oref)
    }
}

/// The annotation collection for one page.
#[derive(Debug)]
pub struct AnnotationList {
    name: &'static str,
    entries: Vec<Annotation>,
}

impl AnnotationList {
    /// Create an empty list.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// True when no annotations have been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of registered annotations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Register an annotation.
    pub fn register(&mut self, annotation: Annotation) -> ArtefactToken {
        self.entries.push(annotation);
        ArtefactToken(self.entries.len() - 1)
    }

    /// Close a registration. The list is not stack-disciplined; the
    /// token only has to be one it issued.
    pub fn close(&mut self, token: ArtefactToken) -> Result<()> {
        if token.0 < self.entries.len() {
            Ok(())
        } else {
            Err(Error::UnbalancedArtefact(self.name.to_string()))
        }
    }

    /// Serialize the /Annots array.
    ///
    /// Returns `None` when the list is empty so the page dictionary can
    /// omit the entry rather than reference a degenerate empty array.
    pub fn write_to<W: Write>(&mut self, writer: &mut PdfWriter<W>) -> Result<Option<ObjectRef>> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        let list = writer.begin_object()?;
        writer.begin_array()?;
        for annotation in &self.entries {
            writer.begin_array_entry()?;
            let oref = annotation.write_to(writer)?;
            writer.write_object_ref(oref)?;
            writer.end_array_entry()?;
        }
        writer.end_array()?;
        writer.end_object()?;
        Ok(Some(list))
    }
}
