//! The structured PDF writer.
//!
//! `PdfWriter` drives everything below the document model: it owns the
//! output sink, the cross-reference table, and the buffer pool, and it
//! exposes the balanced `begin_*`/`end_*` surface that content producers
//! write through. The writer is pooled and streaming: an indirect object
//! is serialized to the sink the moment it is released, its offset is
//! recorded in the table at the `N G obj` token, and its buffers go back
//! to the pool. Nothing is held for the whole document except the table
//! itself.
//!
//! The writer is single-document and single-writer; independent documents
//! parallelize by owning independent writers. Scratch state (the hex
//! conversion buffer) is per instance, never shared.

use crate::buffer::BufferPool;
use crate::config::{Conformance, WriterConfig};
use crate::encoding::{encode_text, TextEncoding};
use crate::error::{Error, Result};
use crate::filters::FilterKind;
use crate::indirect::IndirectObject;
use crate::object::{DocumentId, ObjectRef};
use crate::xref::{PreviousXRef, XRefTable};
use chrono::{DateTime, FixedOffset, Offset};
use std::collections::HashMap;
use std::io::Write;

const START_OBJECT: &str = "obj\r\n";
const END_OBJECT: &str = "\r\nendobj\r\n";
const START_STREAM: &str = "\r\nstream\r\n";
const END_STREAM: &str = "\r\nendstream";
const START_DICTIONARY: &str = "<< ";
const END_DICTIONARY: &str = " >>";
const START_NAME: &str = "/";
const START_ARRAY: &str = "[";
const END_ARRAY: &str = "]";
const WHITESPACE: &str = " ";
const NULL_STRING: &str = "null";
const LINE: &str = "\r\n";

/// Well-known name for the document catalog in the writer's registry.
pub const CATALOG_NAME: &str = "Catalog";
/// Well-known name for the document information dictionary.
pub const INFO_NAME: &str = "Info";

static HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Sink adapter that tracks the absolute byte position of every write, so
/// cross-reference offsets are exact without requiring `Seek`.
#[derive(Debug)]
struct CountingSink<W: Write> {
    inner: W,
    position: u64,
}

impl<W: Write> CountingSink<W> {
    fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    fn position(&self) -> u64 {
        self.position
    }
}

impl<W: Write> Write for CountingSink<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.position += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Scopes a writer can have open inside an indirect object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Dictionary,
    DictionaryEntry,
    Array,
    ArrayEntry,
}

impl Scope {
    fn name(&self) -> &'static str {
        match self {
            Scope::Dictionary => "dictionary",
            Scope::DictionaryEntry => "dictionary entry",
            Scope::Array => "array",
            Scope::ArrayEntry => "array entry",
        }
    }
}

/// An indirect object currently open for writing.
#[derive(Debug)]
struct OpenObject {
    object: IndirectObject,
    scopes: Vec<Scope>,
    in_stream: bool,
}

/// Result of closing a content stream: the values the caller needs for
/// the stream dictionary's /Length and /Filter entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    /// Length of the bytes that will reach the file (filtered, or raw on
    /// filter fallback)
    pub length: u64,
    /// Name tokens of the filters actually applied; empty means no
    /// /Filter entry should be written
    pub filters: Vec<&'static str>,
}

/// Streaming writer for one PDF document.
pub struct PdfWriter<W: Write> {
    sink: CountingSink<W>,
    config: WriterConfig,
    xref: XRefTable,
    pool: BufferPool,
    open: Vec<OpenObject>,
    named: HashMap<String, ObjectRef>,
    page_refs: Vec<ObjectRef>,
    finished_entry: bool,
    hex_scratch: String,
}

impl<W: Write> PdfWriter<W> {
    /// Create a writer for a fresh document.
    pub fn new(sink: W, config: WriterConfig) -> Self {
        Self::build(sink, config, 0, None)
    }

    /// Create a writer chained to the table of an existing file.
    ///
    /// New object numbers continue strictly past the original maximum.
    pub fn with_previous(sink: W, config: WriterConfig, previous: PreviousXRef) -> Self {
        let start = previous.max_object + 1;
        Self::build(sink, config, start, Some(previous))
    }

    fn build(sink: W, config: WriterConfig, start: u32, previous: Option<PreviousXRef>) -> Self {
        Self {
            sink: CountingSink::new(sink),
            config,
            xref: XRefTable::new(start, 0, previous),
            pool: BufferPool::new(),
            open: Vec::new(),
            named: HashMap::new(),
            page_refs: Vec::new(),
            finished_entry: false,
            hex_scratch: String::new(),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// True when this writer appends to an existing file.
    pub fn is_update(&self) -> bool {
        self.xref.previous().is_some()
    }

    /// Current absolute byte position on the sink.
    pub fn position(&self) -> u64 {
        self.sink.position()
    }

    /// The cross-reference table being built.
    pub fn xref(&self) -> &XRefTable {
        &self.xref
    }

    /// Resolve a document-level object name registered via
    /// [`PdfWriter::begin_named_object`].
    pub fn object_ref_by_name(&self, name: &str) -> Option<ObjectRef> {
        self.named.get(name).copied()
    }

    /// References of all pages begun so far, in page order.
    pub fn page_refs(&self) -> &[ObjectRef] {
        &self.page_refs
    }

    /// Apply the conformance policy to a data error: lenient mode logs a
    /// warning and continues, strict mode (and any non-data error)
    /// propagates.
    pub fn handle_data_error(&self, err: Error) -> Result<()> {
        if self.config.conformance == Conformance::Lenient && err.is_data_error() {
            log::warn!("Degrading output for recoverable data error: {}", err);
            Ok(())
        } else {
            Err(err)
        }
    }

    //
    // raw routing
    //

    fn out_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        match self.open.last_mut() {
            Some(open) if open.in_stream => {
                open.object
                    .stream_mut()
                    .expect("in_stream implies a stream buffer")
                    .write(bytes);
                Ok(())
            },
            Some(open) => {
                open.object.data_mut().write(bytes);
                Ok(())
            },
            None => {
                self.sink.write_all(bytes)?;
                Ok(())
            },
        }
    }

    fn out_str(&mut self, text: &str) -> Result<()> {
        match self.open.last_mut() {
            Some(open) if open.in_stream => {
                open.object
                    .stream_mut()
                    .expect("in_stream implies a stream buffer")
                    .write_str(text);
                Ok(())
            },
            Some(open) => {
                open.object.data_mut().write_str(text);
                Ok(())
            },
            None => {
                self.sink.write_all(text.as_bytes())?;
                Ok(())
            },
        }
    }

    //
    // document framing
    //

    /// Write the file header: version comment plus the binary marker line.
    /// Skipped by the assembly driver when updating an existing file.
    pub fn write_header(&mut self) -> Result<()> {
        debug_assert!(self.open.is_empty(), "header written with objects open");
        let (major, minor) = self.config.version;
        self.out_str(&format!("%PDF-{}.{}{}", major, minor, LINE))?;
        self.out_bytes(b"%\xE2\xE3\xCF\xD3")?;
        self.out_str(LINE)
    }

    /// Write the cross-reference table.
    ///
    /// Returns the byte offset the table was written at (the `startxref`
    /// value). All objects must have been released first.
    pub fn write_xref(&mut self) -> Result<u64> {
        if !self.open.is_empty() {
            return Err(Error::InvalidState {
                action: "write the cross-reference table",
                state: "indirect objects are still open",
            });
        }
        let table_offset = self.sink.position();
        self.xref.write_to(&mut self.sink, table_offset)?;
        self.out_str(LINE)?;
        Ok(table_offset)
    }

    /// Write the trailer dictionary, `startxref` footer, and end-of-file
    /// marker. The cross-reference table must have been written.
    pub fn write_trailer(&mut self, id: Option<&DocumentId>) -> Result<()> {
        let table_offset = match self.xref.offset() {
            Some(offset) => offset,
            None => {
                return Err(Error::InvalidState {
                    action: "write the trailer",
                    state: "the cross-reference table has not been written",
                })
            },
        };

        self.out_str("trailer")?;
        self.out_str(LINE)?;
        self.out_str(START_DICTIONARY)?;
        self.out_str(&format!("/Size {}{}", self.xref.reference_count(), LINE))?;

        if let Some(root) = self.named.get(CATALOG_NAME).copied() {
            self.out_str(&format!("/Root {}{}", root, LINE))?;
        }
        if let Some(previous) = self.xref.previous().copied() {
            self.out_str(&format!("/Prev {}{}", previous.offset, LINE))?;
        }
        if let Some(info) = self.named.get(INFO_NAME).copied() {
            self.out_str(&format!("/Info {}{}", info, LINE))?;
        }
        if let Some(id) = id {
            self.out_str("/ID ")?;
            self.out_str(START_ARRAY)?;
            self.write_string_hex(&id.one)?;
            self.out_str(WHITESPACE)?;
            self.write_string_hex(&id.two)?;
            self.out_str(END_ARRAY)?;
            self.out_str(LINE)?;
        }
        self.out_str(">>")?;
        self.out_str(LINE)?;

        self.out_str("startxref")?;
        self.out_str(LINE)?;
        self.out_str(&format!("{}{}", table_offset, LINE))?;
        self.out_str("%%EOF")?;
        self.sink.flush()?;

        log::debug!(
            "Finished document: {} references, table at offset {}",
            self.xref.reference_count(),
            table_offset
        );
        Ok(())
    }

    /// Write the cross-reference table and the trailer in one step.
    ///
    /// Returns the table's byte offset.
    pub fn finish_document(&mut self, id: Option<&DocumentId>) -> Result<u64> {
        let table_offset = self.write_xref()?;
        self.write_trailer(id)?;
        Ok(table_offset)
    }

    /// Unwrap the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink.inner
    }

    //
    // indirect object lifecycle
    //

    /// Begin a new indirect object; it becomes the current write target.
    pub fn begin_object(&mut self) -> Result<ObjectRef> {
        self.begin_object_internal(None)
    }

    /// Begin a new indirect object registered under a unique
    /// document-level name (used for `Root`/`Info` trailer resolution).
    pub fn begin_named_object(&mut self, name: &str) -> Result<ObjectRef> {
        self.begin_object_internal(Some(name.to_string()))
    }

    fn begin_object_internal(&mut self, name: Option<String>) -> Result<ObjectRef> {
        if let Some(name) = &name {
            if self.named.contains_key(name) {
                return Err(Error::DuplicateObjectName(name.clone()));
            }
        }
        let oref = self.xref.next_reference();
        if let Some(name) = &name {
            self.named.insert(name.clone(), oref);
        }
        let data = self.pool.checkout();
        log::debug!("Begun indirect object {}", oref);
        self.open.push(OpenObject {
            object: IndirectObject::new(oref, name, data),
            scopes: Vec::new(),
            in_stream: false,
        });
        self.finished_entry = false;
        Ok(oref)
    }

    /// End the current indirect object.
    ///
    /// The object is serialized to the sink immediately — its offset is
    /// recorded at the `N G obj` token — and its buffers are recycled.
    pub fn end_object(&mut self) -> Result<()> {
        let top = self.open.last().ok_or(Error::NoOpenObject)?;
        if top.in_stream {
            return Err(Error::UnbalancedScope {
                expected: "closed stream",
                found: "open stream",
            });
        }
        if let Some(scope) = top.scopes.last() {
            return Err(Error::UnbalancedScope {
                expected: "object root",
                found: scope.name(),
            });
        }
        let open = self.open.pop().expect("checked above");
        self.release_object(open.object)
    }

    /// Reference of the innermost object still open.
    pub fn last_object_reference(&self) -> Option<ObjectRef> {
        self.open.last().map(|open| open.object.reference())
    }

    /// Begin a page object, recording its reference for the page tree.
    pub fn begin_page(&mut self) -> Result<ObjectRef> {
        let oref = self.begin_object()?;
        self.page_refs.push(oref);
        Ok(oref)
    }

    /// End the current page object.
    pub fn end_page(&mut self) -> Result<()> {
        self.end_object()
    }

    /// Mark an object slot free; its entry joins the free list.
    pub fn delete_object(&mut self, oref: ObjectRef) -> Result<()> {
        self.xref.delete(oref)
    }

    /// Allocate an object number without opening the object, so other
    /// objects can reference it before it is written.
    pub fn reserve_object(&mut self) -> ObjectRef {
        self.xref.next_reference()
    }

    /// Open the object for a previously reserved reference.
    pub fn begin_reserved_object(&mut self, oref: ObjectRef) -> Result<()> {
        if self.xref.is_written(oref) {
            return Err(Error::ObjectAlreadyWritten(oref.number, oref.generation));
        }
        let data = self.pool.checkout();
        self.open.push(OpenObject {
            object: IndirectObject::new(oref, None, data),
            scopes: Vec::new(),
            in_stream: false,
        });
        self.finished_entry = false;
        Ok(())
    }

    /// Bind a document-level name to an existing reference (for example
    /// the original file's /Info when an update does not replace it).
    pub fn register_named_ref(&mut self, name: &str, oref: ObjectRef) -> Result<()> {
        if self.named.contains_key(name) {
            return Err(Error::DuplicateObjectName(name.to_string()));
        }
        self.named.insert(name.to_string(), oref);
        Ok(())
    }

    /// Copy bytes straight to the base sink. Only legal while no
    /// indirect object is open; the assembly driver uses this to stream
    /// the original file ahead of an incremental update.
    pub fn write_verbatim(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.open.is_empty() {
            return Err(Error::InvalidState {
                action: "copy verbatim bytes",
                state: "indirect objects are open",
            });
        }
        self.out_bytes(bytes)
    }

    fn release_object(&mut self, mut object: IndirectObject) -> Result<()> {
        let oref = object.reference();
        object.mark_written()?;

        // Record the offset before any byte leaves: a duplicate write
        // fails here, with nothing emitted.
        let offset = self.sink.position();
        self.xref.record_offset(oref, offset)?;

        write!(self.sink, "{} {} {}", oref.number, oref.generation, START_OBJECT)?;
        let (mut data, stream) = object.into_buffers();
        self.sink.write_all(data.output_bytes()?)?;
        if let Some(mut stream) = stream {
            self.sink.write_all(START_STREAM.as_bytes())?;
            self.sink.write_all(stream.output_bytes()?)?;
            self.sink.write_all(END_STREAM.as_bytes())?;
            self.pool.recycle(stream);
        }
        self.sink.write_all(END_OBJECT.as_bytes())?;
        self.pool.recycle(data);

        log::debug!("Released indirect object {} at offset {}", oref, offset);
        Ok(())
    }

    //
    // content streams
    //

    /// Begin a content stream on the current object with the writer's
    /// default filters (Flate when compression is enabled).
    pub fn begin_stream(&mut self, on: ObjectRef) -> Result<()> {
        let filters: &[FilterKind] = if self.config.compress {
            &[FilterKind::Flate]
        } else {
            &[]
        };
        self.begin_stream_filtered(on, filters)
    }

    /// Begin a content stream on the current object with explicit filters.
    pub fn begin_stream_filtered(&mut self, on: ObjectRef, filters: &[FilterKind]) -> Result<()> {
        {
            let top = self.open.last().ok_or(Error::NoOpenObject)?;
            if top.object.reference() != on {
                return Err(Error::StreamTargetMismatch {
                    target: on.to_string(),
                    current: top.object.reference().to_string(),
                });
            }
            if top.object.has_stream() {
                return Err(Error::StreamExists(on.number, on.generation));
            }
        }
        let buffer = self.pool.checkout();
        let top = self.open.last_mut().ok_or(Error::NoOpenObject)?;
        top.object.init_stream(buffer, filters)?;
        top.in_stream = true;
        Ok(())
    }

    /// Close the current content stream.
    ///
    /// Returns the length and applied filter names for the stream
    /// dictionary; see [`PdfWriter::write_stream_meta`].
    pub fn end_stream(&mut self) -> Result<StreamInfo> {
        let top = self.open.last_mut().ok_or(Error::NoOpenObject)?;
        if !top.in_stream {
            return Err(Error::UnbalancedScope {
                expected: "open stream",
                found: "no stream",
            });
        }
        top.in_stream = false;
        let buffer = top.object.stream_mut().expect("stream was open");
        let length = buffer.output_len()?;
        let filters = buffer
            .applied_filters()?
            .iter()
            .map(FilterKind::filter_name)
            .collect();
        Ok(StreamInfo { length, filters })
    }

    /// Write the /Length and /Filter entries for a closed stream into the
    /// currently open dictionary.
    pub fn write_stream_meta(&mut self, info: &StreamInfo) -> Result<()> {
        self.write_dictionary_number_entry("Length", info.length as i64)?;
        match info.filters.as_slice() {
            [] => Ok(()),
            [single] => self.write_dictionary_name_entry("Filter", single),
            many => {
                self.begin_dictionary_entry("Filter")?;
                self.begin_array()?;
                for name in many {
                    self.begin_array_entry()?;
                    self.write_name(name)?;
                    self.end_array_entry()?;
                }
                self.end_array()?;
                self.end_dictionary_entry()
            },
        }
    }

    //
    // dictionaries and arrays
    //

    fn current_in_stream(&self) -> bool {
        self.open.last().map(|open| open.in_stream).unwrap_or(false)
    }

    /// A container may only open at a value position: the object root,
    /// an entry's value slot, or free-form stream content.
    fn check_value_position(&self) -> Result<()> {
        let top = self.open.last().ok_or(Error::NoOpenObject)?;
        match top.scopes.last() {
            None | Some(Scope::DictionaryEntry) | Some(Scope::ArrayEntry) => Ok(()),
            Some(scope) => Err(Error::UnbalancedScope {
                expected: "a value position",
                found: scope.name(),
            }),
        }
    }

    fn push_scope(&mut self, scope: Scope) -> Result<()> {
        let top = self.open.last_mut().ok_or(Error::NoOpenObject)?;
        top.scopes.push(scope);
        Ok(())
    }

    fn pop_scope(&mut self, expected: Scope) -> Result<()> {
        let top = self.open.last_mut().ok_or(Error::NoOpenObject)?;
        match top.scopes.last() {
            Some(scope) if *scope == expected => {
                top.scopes.pop();
                Ok(())
            },
            Some(scope) => Err(Error::UnbalancedScope {
                expected: expected.name(),
                found: scope.name(),
            }),
            None => Err(Error::UnbalancedScope {
                expected: expected.name(),
                found: "nothing",
            }),
        }
    }

    /// Begin a dictionary on the current object.
    ///
    /// Legal at a value position; inside stream content the token is
    /// written without structural tracking, since content operators are
    /// free-form.
    pub fn begin_dictionary(&mut self) -> Result<()> {
        if !self.current_in_stream() {
            self.check_value_position()?;
            self.push_scope(Scope::Dictionary)?;
        }
        self.finished_entry = false;
        self.out_str(START_DICTIONARY)
    }

    /// Begin a named entry in the open dictionary.
    pub fn begin_dictionary_entry(&mut self, name: &str) -> Result<()> {
        if !self.current_in_stream() {
            let top = self.open.last().ok_or(Error::NoOpenObject)?;
            match top.scopes.last() {
                Some(Scope::Dictionary) => {},
                other => {
                    return Err(Error::UnbalancedScope {
                        expected: "dictionary",
                        found: other.map(Scope::name).unwrap_or("nothing"),
                    })
                },
            }
            if self.finished_entry {
                self.out_str(WHITESPACE)?;
            }
            self.finished_entry = false;
            self.push_scope(Scope::DictionaryEntry)?;
        } else {
            if self.finished_entry {
                self.out_str(WHITESPACE)?;
            }
            self.finished_entry = false;
        }
        self.write_name(name)?;
        self.out_str(WHITESPACE)
    }

    /// End the open dictionary entry.
    pub fn end_dictionary_entry(&mut self) -> Result<()> {
        if !self.current_in_stream() {
            self.pop_scope(Scope::DictionaryEntry)?;
        }
        self.finished_entry = true;
        Ok(())
    }

    /// End the open dictionary.
    pub fn end_dictionary(&mut self) -> Result<()> {
        if !self.current_in_stream() {
            self.pop_scope(Scope::Dictionary)?;
        }
        self.finished_entry = true;
        self.out_str(END_DICTIONARY)
    }

    /// Begin an array on the current object. Same position rules as
    /// [`PdfWriter::begin_dictionary`].
    pub fn begin_array(&mut self) -> Result<()> {
        if !self.current_in_stream() {
            self.check_value_position()?;
            self.push_scope(Scope::Array)?;
        }
        self.finished_entry = false;
        self.out_str(START_ARRAY)
    }

    /// Begin an entry in the open array.
    pub fn begin_array_entry(&mut self) -> Result<()> {
        if !self.current_in_stream() {
            let top = self.open.last().ok_or(Error::NoOpenObject)?;
            match top.scopes.last() {
                Some(Scope::Array) => {},
                other => {
                    return Err(Error::UnbalancedScope {
                        expected: "array",
                        found: other.map(Scope::name).unwrap_or("nothing"),
                    })
                },
            }
            if self.finished_entry {
                self.out_str(WHITESPACE)?;
            }
            self.finished_entry = false;
            self.push_scope(Scope::ArrayEntry)
        } else {
            if self.finished_entry {
                self.out_str(WHITESPACE)?;
            }
            self.finished_entry = false;
            Ok(())
        }
    }

    /// End the open array entry.
    pub fn end_array_entry(&mut self) -> Result<()> {
        if !self.current_in_stream() {
            self.pop_scope(Scope::ArrayEntry)?;
        }
        self.finished_entry = true;
        Ok(())
    }

    /// End the open array.
    pub fn end_array(&mut self) -> Result<()> {
        if !self.current_in_stream() {
            self.pop_scope(Scope::Array)?;
        }
        self.finished_entry = true;
        self.out_str(END_ARRAY)
    }

    //
    // primitives
    //

    /// Write an integer token.
    pub fn write_number(&mut self, value: i64) -> Result<()> {
        self.out_str(&value.to_string())
    }

    /// Write a real token in fixed-point, culture-invariant notation.
    pub fn write_real(&mut self, value: f64) -> Result<()> {
        if value.fract() == 0.0 {
            self.out_str(&(value as i64).to_string())
        } else {
            let formatted = format!("{:.5}", value);
            let trimmed = formatted.trim_end_matches('0').trim_end_matches('.').to_string();
            self.out_str(&trimmed)
        }
    }

    /// Write a boolean token.
    pub fn write_boolean(&mut self, value: bool) -> Result<()> {
        self.out_str(if value { "true" } else { "false" })
    }

    /// Write the null token.
    pub fn write_null(&mut self) -> Result<()> {
        self.out_str(NULL_STRING)
    }

    /// Write a name token, escaping delimiters and non-regular bytes as
    /// `#XX` (a space becomes `#20`).
    pub fn write_name(&mut self, name: &str) -> Result<()> {
        let mut escaped = String::with_capacity(name.len() + 1);
        escaped.push_str(START_NAME);
        for byte in name.bytes() {
            match byte {
                b'!' | b'"' | b'$'..=b'&' | b'\''..=b'.' | b'0'..=b'9' | b';' | b'<' | b'>'
                | b'?' | b'@' | b'A'..=b'Z' | b'^'..=b'z' | b'|' | b'~' => {
                    escaped.push(byte as char);
                },
                _ => {
                    escaped.push('#');
                    escaped.push(HEX_DIGITS[(byte >> 4) as usize] as char);
                    escaped.push(HEX_DIGITS[(byte & 0x0F) as usize] as char);
                },
            }
        }
        self.out_str(&escaped)
    }

    /// Write a string literal with the writer's configured encoding.
    ///
    /// Produces a parenthesized byte-encoded literal, or a hex string
    /// when hex output is configured. Hex output encodes through the
    /// legacy encoding first and hex-encodes the resulting bytes.
    pub fn write_string_literal(&mut self, value: &str) -> Result<()> {
        let preferred = self.config.text_encoding;
        self.write_string_literal_with(value, preferred)
    }

    /// Write a string literal with an explicit encoding preference.
    pub fn write_string_literal_with(&mut self, value: &str, preferred: TextEncoding) -> Result<()> {
        let (encoding, bytes) = encode_text(value, preferred);
        if self.config.use_hex_strings {
            let mut prefixed = encoding.prefix().to_vec();
            prefixed.extend_from_slice(&bytes);
            self.write_string_hex(&prefixed)
        } else {
            self.out_str("(")?;
            self.out_bytes(encoding.prefix())?;
            let escaped = escape_string_bytes(&bytes);
            self.out_bytes(&escaped)?;
            self.out_str(")")
        }
    }

    /// Write already-encoded string bytes as a parenthesized literal,
    /// escaping only what the syntax requires. Used when copying string
    /// values out of an existing file without re-encoding them.
    pub fn write_string_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.out_str("(")?;
        let escaped = escape_string_bytes(bytes);
        self.out_bytes(&escaped)?;
        self.out_str(")")
    }

    /// Write raw bytes as a hex string: two hex digits per byte inside
    /// angle brackets.
    pub fn write_string_hex(&mut self, bytes: &[u8]) -> Result<()> {
        let mut scratch = std::mem::take(&mut self.hex_scratch);
        scratch.clear();
        scratch.reserve(bytes.len() * 2 + 2);
        scratch.push('<');
        for byte in bytes {
            scratch.push(HEX_DIGITS[(byte >> 4) as usize] as char);
            scratch.push(HEX_DIGITS[(byte & 0x0F) as usize] as char);
        }
        scratch.push('>');
        let result = self.out_str(&scratch);
        self.hex_scratch = scratch;
        result
    }

    /// Write a date value as `D:YYYYMMDDHHmmSS` with a UTC-offset suffix
    /// when the offset is non-zero.
    pub fn write_date(&mut self, value: &DateTime<FixedOffset>) -> Result<()> {
        let mut text = format!("D:{}", value.format("%Y%m%d%H%M%S"));
        let seconds = value.offset().fix().local_minus_utc();
        if seconds != 0 {
            let sign = if seconds < 0 { '-' } else { '+' };
            let abs = seconds.unsigned_abs();
            text.push_str(&format!("{}{:02}'{:02}'", sign, abs / 3600, (abs % 3600) / 60));
        }
        self.write_string_literal(&text)
    }

    /// Write an indirect reference token `N G R`.
    pub fn write_object_ref(&mut self, oref: ObjectRef) -> Result<()> {
        self.out_str(&oref.to_string())
    }

    /// Write a single space.
    pub fn write_space(&mut self) -> Result<()> {
        self.out_str(WHITESPACE)
    }

    /// End the current line.
    pub fn write_line(&mut self) -> Result<()> {
        self.out_str(LINE)
    }

    /// Write a complete comment line.
    pub fn write_comment_line(&mut self, comment: &str) -> Result<()> {
        self.out_str("%")?;
        self.out_str(comment)?;
        self.out_str(LINE)
    }

    /// Write pre-encoded token text exactly as passed.
    pub fn write_raw(&mut self, data: &str) -> Result<()> {
        self.out_str(data)
    }

    /// Write raw binary data exactly as passed.
    pub fn write_raw_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.out_bytes(data)
    }

    //
    // dictionary entry helpers
    //

    /// Write a complete `/Name value` number entry.
    pub fn write_dictionary_number_entry(&mut self, name: &str, value: i64) -> Result<()> {
        self.begin_dictionary_entry(name)?;
        self.write_number(value)?;
        self.end_dictionary_entry()
    }

    /// Write a complete `/Name value` real entry.
    pub fn write_dictionary_real_entry(&mut self, name: &str, value: f64) -> Result<()> {
        self.begin_dictionary_entry(name)?;
        self.write_real(value)?;
        self.end_dictionary_entry()
    }

    /// Write a complete `/Name (value)` string entry.
    pub fn write_dictionary_string_entry(&mut self, name: &str, value: &str) -> Result<()> {
        self.begin_dictionary_entry(name)?;
        self.write_string_literal(value)?;
        self.end_dictionary_entry()
    }

    /// Write a complete `/Name /Value` name entry.
    pub fn write_dictionary_name_entry(&mut self, name: &str, value: &str) -> Result<()> {
        self.begin_dictionary_entry(name)?;
        self.write_name(value)?;
        self.end_dictionary_entry()
    }

    /// Write a complete `/Name true|false` entry.
    pub fn write_dictionary_boolean_entry(&mut self, name: &str, value: bool) -> Result<()> {
        self.begin_dictionary_entry(name)?;
        self.write_boolean(value)?;
        self.end_dictionary_entry()
    }

    /// Write a complete `/Name N G R` entry.
    pub fn write_dictionary_object_ref_entry(&mut self, name: &str, oref: ObjectRef) -> Result<()> {
        self.begin_dictionary_entry(name)?;
        self.write_object_ref(oref)?;
        self.end_dictionary_entry()
    }

    //
    // array entry helpers
    //

    /// Write a complete array of real numbers.
    pub fn write_array_real_entries(&mut self, reals: &[f64]) -> Result<()> {
        self.begin_array()?;
        for value in reals {
            self.begin_array_entry()?;
            self.write_real(*value)?;
            self.end_array_entry()?;
        }
        self.end_array()
    }

    /// Write a complete array of integers.
    pub fn write_array_number_entries(&mut self, numbers: &[i64]) -> Result<()> {
        self.begin_array()?;
        for value in numbers {
            self.begin_array_entry()?;
            self.write_number(*value)?;
            self.end_array_entry()?;
        }
        self.end_array()
    }

    /// Write a complete array of object references.
    pub fn write_array_ref_entries(&mut self, refs: &[ObjectRef]) -> Result<()> {
        self.begin_array()?;
        for oref in refs {
            self.begin_array_entry()?;
            self.write_object_ref(*oref)?;
            self.end_array_entry()?;
        }
        self.end_array()
    }

    /// Write a complete array of string literals.
    pub fn write_array_string_entries(&mut self, literals: &[&str]) -> Result<()> {
        self.begin_array()?;
        for value in literals {
            self.begin_array_entry()?;
            self.write_string_literal(value)?;
            self.end_array_entry()?;
        }
        self.end_array()
    }
}

/// Escape the characters a parenthesized string literal cannot carry raw.
fn escape_string_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(bytes.len());
    for &byte in bytes {
        match byte {
            b'(' => escaped.extend_from_slice(b"\\("),
            b')' => escaped.extend_from_slice(b"\\)"),
            b'\\' => escaped.extend_from_slice(b"\\\\"),
            b'\r' => escaped.extend_from_slice(b"\\r"),
            b'\n' => escaped.extend_from_slice(b"\\n"),
            b'\t' => escaped.extend_from_slice(b"\\t"),
            other => escaped.push(other),
        }
    }
    escaped
}
