#![allow(clippy::match_like_matches_macro)]
#![allow(clippy::len_without_is_empty)]

//! # PDF Scribe
//!
//! Low-level PDF serialization engine: turns an already-resolved
//! document model into a byte-exact, spec-conformant PDF file.
//!
//! ## Core Features
//!
//! - **Streaming writer**: indirect objects are serialized and released
//!   the moment they close; buffers are pooled and recycled, so memory
//!   stays flat across documents with many thousands of small objects
//! - **Structured state machine**: balanced `begin_*`/`end_*` pairs for
//!   objects, dictionaries, arrays, entries, and content streams, with
//!   unbalanced use surfaced as errors instead of corrupt output
//! - **Cross-reference tables**: contiguous sections, linked free lists,
//!   exact byte offsets recorded at the `N G obj` token
//! - **Incremental update**: copy an existing file verbatim, continue
//!   its object numbering, chain the table via /Prev
//! - **Artefacts**: outlines, sorted name trees (destinations, embedded
//!   files), link annotations, and interactive form fields serialized
//!   into linked indirect-object graphs
//! - **Filters**: Flate and ASCIIHex stream filters with automatic
//!   fallback to raw bytes when compression does not reduce
//!
//! ## What it is not
//!
//! Layout, style resolution, fonts, and image decoding live in front
//! ends that feed this engine resolved values. Reading existing files
//! is limited to the structural minimum an incremental update needs.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pdf_scribe::{DocumentWriter, WriterConfig};
//!
//! # fn main() -> pdf_scribe::Result<()> {
//! let mut doc = DocumentWriter::create(Vec::new(), WriterConfig::default())?;
//! let page = doc.begin_page()?;
//! let parent = doc.page_tree_ref();
//! let w = doc.writer_mut();
//! w.begin_dictionary()?;
//! w.write_dictionary_name_entry("Type", "Page")?;
//! w.write_dictionary_object_ref_entry("Parent", parent)?;
//! w.end_dictionary()?;
//! doc.end_page()?;
//! let pdf_bytes = doc.finish(None)?;
//! # Ok(())
//! # }
//! ```

pub mod artefacts;
pub mod buffer;
pub mod config;
pub mod document;
pub mod encoding;
pub mod error;
pub mod filters;
pub mod indirect;
pub mod object;
pub mod reader;
pub mod writer;
pub mod xref;

pub use config::{Conformance, WriterConfig};
pub use document::{DocumentInfo, DocumentWriter, ViewerPreferences};
pub use error::{Error, Result};
pub use filters::FilterKind;
pub use object::{DocumentId, ObjectRef};
pub use reader::ExistingPdf;
pub use writer::{PdfWriter, StreamInfo};
pub use xref::XRefTable;
