//! Embedded file attachments.
//!
//! An embedded file serializes as a /Filespec dictionary referencing an
//! /EmbeddedFile stream. File data is optionally filtered, and each
//! filtered form is cached against the exact filter set that produced
//! it, so repeated output passes never re-filter identical data.

use crate::error::Result;
use crate::filters::{apply_chain, FilterKind};
use crate::object::ObjectRef;
use crate::writer::PdfWriter;
use std::io::Write;

/// One filtered form of the file data.
#[derive(Debug, Clone)]
struct FilteredVariant {
    filters: Vec<FilterKind>,
    bytes: Vec<u8>,
    /// False when the chain declined and `bytes` are the raw data
    applied: bool,
}

/// The file bytes plus cached filtered variants.
#[derive(Debug, Clone)]
struct FileData {
    bytes: Vec<u8>,
    variants: Vec<FilteredVariant>,
}

impl FileData {
    fn filtered(&mut self, filters: &[FilterKind]) -> Result<&FilteredVariant> {
        if let Some(position) = self.variants.iter().position(|v| v.filters == filters) {
            return Ok(&self.variants[position]);
        }
        let (bytes, applied) = match apply_chain(filters, &self.bytes)? {
            Some(filtered) => (filtered, true),
            None => (self.bytes.clone(), false),
        };
        // most recently produced variant goes to the front
        self.variants.insert(
            0,
            FilteredVariant {
                filters: filters.to_vec(),
                bytes,
                applied,
            },
        );
        Ok(&self.variants[0])
    }
}

/// An embedded file registered in the /EmbeddedFiles name tree.
#[derive(Debug, Clone)]
pub struct EmbeddedFile {
    /// File name shown by the reader (/F)
    pub file_name: String,
    /// Key in the embedded-files name tree
    pub destination_name: String,
    /// Description shown against the attachment (/Desc)
    pub description: Option<String>,
    data: FileData,
}

impl EmbeddedFile {
    /// Create an attachment from in-memory file data.
    pub fn new(
        file_name: impl Into<String>,
        destination_name: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            destination_name: destination_name.into(),
            description: None,
            data: FileData {
                bytes: data,
                variants: Vec::new(),
            },
        }
    }

    /// Set the reader-visible description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Unfiltered file length in bytes.
    pub fn file_len(&self) -> usize {
        self.data.bytes.len()
    }

    /// Serialize the /Filespec object, nesting the data stream object.
    pub fn write_filespec<W: Write>(&mut self, writer: &mut PdfWriter<W>) -> Result<ObjectRef> {
        let filespec = writer.begin_object()?;
        writer.begin_dictionary()?;
        writer.write_dictionary_name_entry("Type", "Filespec")?;
        writer.write_dictionary_string_entry("F", &self.file_name)?;

        writer.begin_dictionary_entry("EF")?;
        writer.begin_dictionary()?;
        writer.begin_dictionary_entry("F")?;
        let file_len = self.data.bytes.len();
        let filters: Vec<FilterKind> = if writer.config().compress {
            vec![FilterKind::Flate]
        } else {
            Vec::new()
        };
        let variant = self.data.filtered(&filters)?;
        let data_ref = write_file_data(writer, variant, file_len)?;
        writer.write_object_ref(data_ref)?;
        writer.end_dictionary_entry()?;
        writer.end_dictionary()?;
        writer.end_dictionary_entry()?;

        if let Some(description) = &self.description {
            writer.write_dictionary_string_entry("Desc", description)?;
        }

        writer.end_dictionary()?;
        writer.end_object()?;
        log::debug!("Wrote attachment '{}' as {}", self.file_name, filespec);
        Ok(filespec)
    }
}

/// Write the /EmbeddedFile stream object for an already-filtered variant.
fn write_file_data<W: Write>(
    writer: &mut PdfWriter<W>,
    variant: &FilteredVariant,
    file_len: usize,
) -> Result<ObjectRef> {
    let oref = writer.begin_object()?;
    // the variant bytes are pre-filtered; the stream itself stays raw
    writer.begin_stream_filtered(oref, &[])?;
    writer.write_raw_bytes(&variant.bytes)?;
    let info = writer.end_stream()?;

    writer.begin_dictionary()?;
    writer.write_dictionary_number_entry("Length", info.length as i64)?;
    writer.write_dictionary_name_entry("Type", "EmbeddedFile")?;
    if variant.applied {
        match variant.filters.as_slice() {
            [] => {},
            [single] => writer.write_dictionary_name_entry("Filter", single.filter_name())?,
            many => {
                writer.begin_dictionary_entry("Filter")?;
                writer.begin_array()?;
                for filter in many {
                    writer.begin_array_entry()?;
                    writer.write_name(filter.filter_name())?;
                    writer.end_array_entry()?;
                }
                writer.end_array()?;
                writer.end_dictionary_entry()?;
            },
        }
    }
    writer.begin_dictionary_entry("Params")?;
    writer.begin_dictionary()?;
    writer.write_dictionary_number_entry("Size", file_len as i64)?;
    writer.end_dictionary()?;
    writer.end_dictionary_entry()?;
    writer.end_dictionary()?;
    writer.end_object()?;
    Ok(oref)
}
