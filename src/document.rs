//! Document assembly driver.
//!
//! Orchestrates a full write pass over one document: header (or verbatim
//! copy of the original file for an incremental update), body — pages,
//! catalog, information dictionary, artefact collections — then the
//! cross-reference table and trailer. The driver owns the phase state
//! machine; an error during the body propagates to the caller and no
//! partial trailer is ever emitted.

use crate::artefacts::{
    ArtefactEntry, ArtefactKind, ArtefactSet, ArtefactToken, EmbeddedFile, FieldWidget,
    NamedDestination, OutlineItem,
};
use crate::config::WriterConfig;
use crate::error::{Error, Result};
use crate::object::{DocumentId, ObjectRef};
use crate::reader::{ExistingPdf, Value};
use crate::writer::{PdfWriter, CATALOG_NAME, INFO_NAME};
use chrono::{DateTime, FixedOffset};
use std::collections::HashSet;
use std::io::Write;

/// Phases of a document write pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Open,
    Body,
    XRef,
    Trailer,
    Closed,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Open => "opening the document",
            Phase::Body => "writing the body",
            Phase::XRef => "writing the cross-reference table",
            Phase::Trailer => "writing the trailer",
            Phase::Closed => "closed",
        }
    }
}

/// Document information dictionary values.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Document keywords
    pub keywords: Option<String>,
    /// Creator application
    pub creator: Option<String>,
    /// Producer library
    pub producer: Option<String>,
    /// Creation timestamp
    pub creation_date: Option<DateTime<FixedOffset>>,
    /// Last-modification timestamp
    pub modification_date: Option<DateTime<FixedOffset>>,
}

impl DocumentInfo {
    /// Create empty info.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// True when no entry is set and the dictionary can be omitted.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
            && self.creator.is_none()
            && self.producer.is_none()
            && self.creation_date.is_none()
            && self.modification_date.is_none()
    }

    fn write_to<W: Write>(&self, writer: &mut PdfWriter<W>) -> Result<ObjectRef> {
        let oref = writer.begin_named_object(INFO_NAME)?;
        writer.begin_dictionary()?;
        for (key, value) in [
            ("Title", &self.title),
            ("Author", &self.author),
            ("Subject", &self.subject),
            ("Keywords", &self.keywords),
            ("Creator", &self.creator),
            ("Producer", &self.producer),
        ] {
            if let Some(value) = value {
                writer.write_dictionary_string_entry(key, value)?;
            }
        }
        for (key, value) in [
            ("CreationDate", &self.creation_date),
            ("ModDate", &self.modification_date),
        ] {
            if let Some(date) = value {
                writer.begin_dictionary_entry(key)?;
                writer.write_date(date)?;
                writer.end_dictionary_entry()?;
            }
        }
        writer.end_dictionary()?;
        writer.end_object()?;
        Ok(oref)
    }
}

/// Viewer preference values passed through to the catalog.
#[derive(Debug, Clone, Default)]
pub struct ViewerPreferences {
    /// /PageMode name, e.g. `UseOutlines`
    pub page_mode: Option<String>,
    /// /PageLayout name, e.g. `TwoColumnLeft`
    pub page_layout: Option<String>,
    /// Hide the viewer toolbar
    pub hide_toolbar: bool,
    /// Hide the viewer menu bar
    pub hide_menubar: bool,
    /// Resize the window to fit the first page
    pub fit_window: bool,
    /// Center the window on screen
    pub center_window: bool,
}

impl ViewerPreferences {
    fn has_window_prefs(&self) -> bool {
        self.hide_toolbar || self.hide_menubar || self.fit_window || self.center_window
    }

    fn write_dict<W: Write>(&self, writer: &mut PdfWriter<W>) -> Result<Option<ObjectRef>> {
        if !self.has_window_prefs() {
            return Ok(None);
        }
        let oref = writer.begin_object()?;
        writer.begin_dictionary()?;
        for (key, value) in [
            ("HideToolbar", self.hide_toolbar),
            ("HideMenubar", self.hide_menubar),
            ("FitWindow", self.fit_window),
            ("CenterWindow", self.center_window),
        ] {
            if value {
                writer.write_dictionary_boolean_entry(key, true)?;
            }
        }
        writer.end_dictionary()?;
        writer.end_object()?;
        Ok(Some(oref))
    }
}

/// Drives one complete document write pass.
pub struct DocumentWriter<W: Write> {
    writer: PdfWriter<W>,
    artefacts: ArtefactSet,
    info: DocumentInfo,
    view_preferences: Option<ViewerPreferences>,
    original: Option<ExistingPdf>,
    page_tree_ref: ObjectRef,
    phase: Phase,
}

impl<W: Write> DocumentWriter<W> {
    /// Open a fresh document: writes the file header immediately.
    pub fn create(sink: W, config: WriterConfig) -> Result<Self> {
        let mut doc = Self {
            writer: PdfWriter::new(sink, config),
            artefacts: ArtefactSet::new(),
            info: DocumentInfo::default(),
            view_preferences: None,
            original: None,
            page_tree_ref: ObjectRef::new(0, 0),
            phase: Phase::Open,
        };
        doc.writer.write_header()?;
        doc.page_tree_ref = doc.writer.reserve_object();
        doc.phase = Phase::Body;
        Ok(doc)
    }

    /// Open an incremental update: streams the original file's bytes
    /// verbatim and chains the cross-reference table past its maximum
    /// object number. Preconditions (catalog, page tree) were validated
    /// when `original` was loaded, before any byte is written.
    pub fn update(sink: W, original: ExistingPdf, config: WriterConfig) -> Result<Self> {
        let mut doc = Self {
            writer: PdfWriter::with_previous(sink, config, original.previous_xref()),
            artefacts: ArtefactSet::new(),
            info: DocumentInfo::default(),
            view_preferences: None,
            original: None,
            page_tree_ref: ObjectRef::new(0, 0),
            phase: Phase::Open,
        };
        doc.writer.write_verbatim(original.bytes())?;
        if !matches!(original.bytes().last(), Some(b'\r') | Some(b'\n')) {
            doc.writer.write_verbatim(b"\r\n")?;
        }
        doc.page_tree_ref = doc.writer.reserve_object();
        log::debug!(
            "Opened incremental update: original is {} bytes, {} objects",
            original.len(),
            original.max_object()
        );
        doc.original = Some(original);
        doc.phase = Phase::Body;
        Ok(doc)
    }

    fn require_body(&self, action: &'static str) -> Result<()> {
        if self.phase != Phase::Body {
            return Err(Error::InvalidState {
                action,
                state: self.phase.name(),
            });
        }
        Ok(())
    }

    /// The underlying structured writer, for content producers.
    pub fn writer_mut(&mut self) -> &mut PdfWriter<W> {
        &mut self.writer
    }

    /// Reference of the page tree root, for /Parent entries in pages.
    pub fn page_tree_ref(&self) -> ObjectRef {
        self.page_tree_ref
    }

    /// Mutable access to the document information values.
    pub fn info_mut(&mut self) -> &mut DocumentInfo {
        &mut self.info
    }

    /// Replace the document information values.
    pub fn set_info(&mut self, info: DocumentInfo) {
        self.info = info;
    }

    /// Set viewer preferences for the catalog.
    pub fn set_viewer_preferences(&mut self, preferences: ViewerPreferences) {
        self.view_preferences = Some(preferences);
    }

    /// Begin a page object; its reference joins the page tree.
    pub fn begin_page(&mut self) -> Result<ObjectRef> {
        self.require_body("begin a page")?;
        self.writer.begin_page()
    }

    /// End the current page object.
    pub fn end_page(&mut self) -> Result<()> {
        self.require_body("end a page")?;
        self.writer.end_page()
    }

    /// Register an artefact entry with the collection for `kind`.
    pub fn register_artefact(
        &mut self,
        kind: ArtefactKind,
        entry: ArtefactEntry,
    ) -> Result<ArtefactToken> {
        self.require_body("register an artefact")?;
        self.artefacts.register(kind, entry)
    }

    /// Close a previous artefact registration.
    pub fn close_artefact(&mut self, kind: ArtefactKind, token: ArtefactToken) -> Result<()> {
        self.require_body("close an artefact")?;
        self.artefacts.close(kind, token)
    }

    /// Push an outline item; children pushed before the matching
    /// [`DocumentWriter::pop_outline`] nest under it.
    pub fn push_outline(&mut self, item: OutlineItem) -> Result<ArtefactToken> {
        self.register_artefact(ArtefactKind::Outlines, ArtefactEntry::Outline(item))
    }

    /// Pop the outline item on top of the stack.
    pub fn pop_outline(&mut self, token: ArtefactToken) -> Result<()> {
        self.close_artefact(ArtefactKind::Outlines, token)
    }

    /// Register a named destination.
    pub fn add_destination(&mut self, destination: NamedDestination) -> Result<()> {
        let token =
            self.register_artefact(ArtefactKind::Names, ArtefactEntry::Destination(destination))?;
        self.close_artefact(ArtefactKind::Names, token)
    }

    /// Attach an embedded file.
    pub fn attach_file(&mut self, file: EmbeddedFile) -> Result<()> {
        let token = self.register_artefact(ArtefactKind::Names, ArtefactEntry::Attachment(file))?;
        self.close_artefact(ArtefactKind::Names, token)
    }

    /// Register an interactive form field.
    pub fn add_field(&mut self, field: FieldWidget) -> Result<()> {
        let token = self.register_artefact(ArtefactKind::AcroForm, ArtefactEntry::Field(field))?;
        self.close_artefact(ArtefactKind::AcroForm, token)
    }

    /// Finish the document: page tree, catalog, info, cross-reference
    /// table, trailer, end-of-file marker. Returns the sink.
    pub fn finish(mut self, id: Option<DocumentId>) -> Result<W> {
        self.require_body("finish the document")?;

        self.write_page_tree()?;
        self.write_catalog()?;
        self.write_info()?;

        let id = self.resolve_document_id(id);
        self.phase = Phase::XRef;
        self.writer.write_xref()?;
        self.phase = Phase::Trailer;
        self.writer.write_trailer(Some(&id))?;
        self.phase = Phase::Closed;
        Ok(self.writer.into_inner())
    }

    fn write_page_tree(&mut self) -> Result<()> {
        let mut kids: Vec<ObjectRef> = match &self.original {
            Some(original) => original.page_kids().to_vec(),
            None => Vec::new(),
        };
        kids.extend_from_slice(self.writer.page_refs());

        self.writer.begin_reserved_object(self.page_tree_ref)?;
        self.writer.begin_dictionary()?;
        self.writer.write_dictionary_name_entry("Type", "Pages")?;
        self.writer.begin_dictionary_entry("Kids")?;
        self.writer.write_array_ref_entries(&kids)?;
        self.writer.end_dictionary_entry()?;
        self.writer
            .write_dictionary_number_entry("Count", kids.len() as i64)?;
        self.writer.end_dictionary()?;
        self.writer.end_object()
    }

    fn write_catalog(&mut self) -> Result<()> {
        self.writer.begin_named_object(CATALOG_NAME)?;
        self.writer.begin_dictionary()?;
        self.writer.write_dictionary_name_entry("Type", "Catalog")?;
        self.writer
            .write_dictionary_object_ref_entry("Pages", self.page_tree_ref)?;

        let mut reserved: HashSet<&'static str> = HashSet::from(["Type", "Pages"]);

        let written = self.artefacts.write_all(&mut self.writer)?;
        for (name, oref) in &written {
            self.writer.write_dictionary_object_ref_entry(name, *oref)?;
            reserved.insert(*name);
        }

        if let Some(preferences) = self.view_preferences.clone() {
            if let Some(oref) = preferences.write_dict(&mut self.writer)? {
                self.writer
                    .write_dictionary_object_ref_entry("ViewerPreferences", oref)?;
                reserved.insert("ViewerPreferences");
            }
            if let Some(mode) = &preferences.page_mode {
                self.writer.write_dictionary_name_entry("PageMode", mode)?;
                reserved.insert("PageMode");
            }
            if let Some(layout) = &preferences.page_layout {
                self.writer
                    .write_dictionary_name_entry("PageLayout", layout)?;
                reserved.insert("PageLayout");
            }
        }

        // Incremental update: the original catalog's keys are copied
        // verbatim, except /Pages (pointed at the merged tree above) and
        // any key this revision regenerated.
        if let Some(original) = &self.original {
            for (key, value) in original.catalog() {
                if reserved.contains(key.as_str()) {
                    continue;
                }
                self.writer.begin_dictionary_entry(key)?;
                write_value(&mut self.writer, value)?;
                self.writer.end_dictionary_entry()?;
            }
        }

        self.writer.end_dictionary()?;
        self.writer.end_object()
    }

    fn write_info(&mut self) -> Result<()> {
        if !self.info.is_empty() {
            self.info.write_to(&mut self.writer)?;
        } else if let Some(original_info) = self.original.as_ref().and_then(ExistingPdf::info_ref) {
            self.writer.register_named_ref(INFO_NAME, original_info)?;
        }
        Ok(())
    }

    fn resolve_document_id(&self, id: Option<DocumentId>) -> DocumentId {
        match id {
            Some(id) => id,
            None => match self.original.as_ref().and_then(ExistingPdf::document_id) {
                Some((one, _)) => DocumentId::renew(one),
                None => DocumentId::random(),
            },
        }
    }
}

/// Re-serialize a value parsed from the original file.
fn write_value<W: Write>(writer: &mut PdfWriter<W>, value: &Value) -> Result<()> {
    match value {
        Value::Null => writer.write_null(),
        Value::Boolean(b) => writer.write_boolean(*b),
        Value::Integer(i) => writer.write_number(*i),
        Value::Real(r) => writer.write_real(*r),
        Value::String(bytes) => writer.write_string_bytes(bytes),
        Value::Name(name) => writer.write_name(name),
        Value::Reference(oref) => writer.write_object_ref(*oref),
        Value::Array(items) => {
            writer.begin_array()?;
            for item in items {
                writer.begin_array_entry()?;
                write_value(writer, item)?;
                writer.end_array_entry()?;
            }
            writer.end_array()
        },
        Value::Dictionary(dict) => {
            writer.begin_dictionary()?;
            for (key, item) in dict {
                writer.begin_dictionary_entry(key)?;
                write_value(writer, item)?;
                writer.end_dictionary_entry()?;
            }
            writer.end_dictionary()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artefacts::{Annotation, AnnotationList, LinkTarget};

    fn finish_to_text(doc: DocumentWriter<Vec<u8>>) -> String {
        let bytes = doc.finish(Some(DocumentId::new(vec![1, 2], vec![3, 4]))).unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn test_minimal_document_structure() {
        let mut doc = DocumentWriter::create(Vec::new(), WriterConfig::default()).unwrap();
        let page = doc.begin_page().unwrap();
        let parent = doc.page_tree_ref();
        {
            let w = doc.writer_mut();
            w.begin_dictionary().unwrap();
            w.write_dictionary_name_entry("Type", "Page").unwrap();
            w.write_dictionary_object_ref_entry("Parent", parent).unwrap();
            w.end_dictionary().unwrap();
        }
        doc.end_page().unwrap();

        let text = finish_to_text(doc);
        assert!(text.starts_with("%PDF-1.4\r\n"));
        assert!(text.contains("/Type /Catalog"));
        assert!(text.contains("/Type /Pages"));
        assert!(text.contains(&format!("/Kids [{}]", page)));
        assert!(text.contains("/Count 1"));
        assert!(text.contains("/ID [<0102> <0304>]"));
        assert!(text.ends_with("%%EOF"));
    }

    #[test]
    fn test_empty_artefact_collections_are_omitted() {
        let doc = DocumentWriter::create(Vec::new(), WriterConfig::default()).unwrap();
        let text = finish_to_text(doc);
        assert!(!text.contains("/Outlines"));
        assert!(!text.contains("/Names"));
        assert!(!text.contains("/AcroForm"));
    }

    #[test]
    fn test_outline_catalog_entry_present_when_registered() {
        let mut doc = DocumentWriter::create(Vec::new(), WriterConfig::default()).unwrap();
        let token = doc.push_outline(OutlineItem::new("Intro", "intro")).unwrap();
        doc.pop_outline(token).unwrap();
        let text = finish_to_text(doc);
        assert!(text.contains("/Outlines"));
        assert!(text.contains("/Type /Outlines"));
    }

    #[test]
    fn test_info_dictionary_written_when_set() {
        let mut doc = DocumentWriter::create(Vec::new(), WriterConfig::default()).unwrap();
        doc.set_info(DocumentInfo::new().with_title("Report").with_author("QA"));
        let text = finish_to_text(doc);
        assert!(text.contains("/Title (Report)"));
        assert!(text.contains("/Author (QA)"));
        assert!(text.contains("/Info"));
    }

    #[test]
    fn test_viewer_preferences_in_catalog() {
        let mut doc = DocumentWriter::create(Vec::new(), WriterConfig::default()).unwrap();
        doc.set_viewer_preferences(ViewerPreferences {
            page_mode: Some("UseOutlines".to_string()),
            fit_window: true,
            ..Default::default()
        });
        let text = finish_to_text(doc);
        assert!(text.contains("/PageMode /UseOutlines"));
        assert!(text.contains("/ViewerPreferences"));
        assert!(text.contains("/FitWindow true"));
    }

    #[test]
    fn test_operations_rejected_after_finish_phase() {
        let mut doc = DocumentWriter::create(Vec::new(), WriterConfig::default()).unwrap();
        doc.phase = Phase::Closed;
        assert!(matches!(
            doc.begin_page().unwrap_err(),
            Error::InvalidState { .. }
        ));
    }

    #[test]
    fn test_page_annotations_reference_from_page_dict() {
        let mut doc = DocumentWriter::create(Vec::new(), WriterConfig::default()).unwrap();
        doc.begin_page().unwrap();
        let parent = doc.page_tree_ref();
        let mut annots = AnnotationList::new("Annots");
        annots.register(Annotation::link(
            [10.0, 10.0, 100.0, 30.0],
            LinkTarget::Uri("https://example.com".to_string()),
        ));
        {
            let w = doc.writer_mut();
            w.begin_dictionary().unwrap();
            w.write_dictionary_name_entry("Type", "Page").unwrap();
            w.write_dictionary_object_ref_entry("Parent", parent).unwrap();
            let annots_ref = annots.write_to(w).unwrap().unwrap();
            w.write_dictionary_object_ref_entry("Annots", annots_ref).unwrap();
            w.end_dictionary().unwrap();
        }
        doc.end_page().unwrap();

        let text = finish_to_text(doc);
        assert!(text.contains("/Annots"));
        assert!(text.contains("/Subtype /Link"));
    }
}
