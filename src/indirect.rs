//! Indirect object lifecycle.
//!
//! An indirect object shell is created when the writer begins an object
//! and destroyed when the object is released: its buffers go back to the
//! pool and its slot in the cross-reference table records the byte offset
//! where the object landed. Once written, an object must never be written
//! again.

use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::filters::FilterKind;
use crate::object::ObjectRef;

/// An indirect object under construction.
#[derive(Debug)]
pub struct IndirectObject {
    oref: ObjectRef,
    name: Option<String>,
    data: Buffer,
    stream: Option<Buffer>,
    written: bool,
}

impl IndirectObject {
    /// Create a shell for the given reference, backed by a pooled buffer.
    pub fn new(oref: ObjectRef, name: Option<String>, data: Buffer) -> Self {
        Self {
            oref,
            name,
            data,
            stream: None,
            written: false,
        }
    }

    /// The object's reference.
    pub fn reference(&self) -> ObjectRef {
        self.oref
    }

    /// Optional unique name hint given at creation.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The object-data buffer (the dictionary/array/value to write).
    pub fn data_mut(&mut self) -> &mut Buffer {
        &mut self.data
    }

    /// True once a content stream is attached.
    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Attach a content stream backed by a pooled buffer.
    ///
    /// An object carries at most one stream; a second attachment is a
    /// caller contract violation.
    pub fn init_stream(&mut self, mut buffer: Buffer, filters: &[FilterKind]) -> Result<()> {
        if self.stream.is_some() {
            return Err(Error::StreamExists(self.oref.number, self.oref.generation));
        }
        buffer.set_filters(filters);
        self.stream = Some(buffer);
        Ok(())
    }

    /// The content-stream buffer, if attached.
    pub fn stream_mut(&mut self) -> Option<&mut Buffer> {
        self.stream.as_mut()
    }

    /// True once the object's bytes have reached the sink.
    pub fn written(&self) -> bool {
        self.written
    }

    /// Mark the object written. Fails if it already was.
    pub fn mark_written(&mut self) -> Result<()> {
        if self.written {
            return Err(Error::ObjectAlreadyWritten(
                self.oref.number,
                self.oref.generation,
            ));
        }
        self.written = true;
        Ok(())
    }

    /// Tear the shell apart so its buffers can go back to the pool.
    pub fn into_buffers(self) -> (Buffer, Option<Buffer>) {
        (self.data, self.stream)
    }
}
