//! Writer configuration.
//!
//! Controls the PDF version stamp, conformance mode, stream compression,
//! and how string literals are encoded on the wire.

use crate::encoding::TextEncoding;

/// How data errors are handled during generation.
///
/// Structural errors (unbalanced scopes, double writes) are always fatal
/// regardless of mode; conformance only governs data errors such as an
/// unsupported color space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Conformance {
    /// All data errors abort generation
    Strict,
    /// Data errors degrade gracefully (omitted entries, empty arrays)
    /// and are logged at warn level
    #[default]
    Lenient,
}

/// Configuration for PDF generation.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// PDF version written in the header (major, minor)
    pub version: (u8, u8),
    /// Conformance mode for data errors
    pub conformance: Conformance,
    /// Whether content and embedded-file streams are Flate compressed
    pub compress: bool,
    /// Emit string literals as hex strings instead of parenthesized text
    pub use_hex_strings: bool,
    /// Encoding applied to string literals before they reach the sink
    pub text_encoding: TextEncoding,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            version: (1, 4),
            conformance: Conformance::default(),
            compress: false,
            use_hex_strings: false,
            text_encoding: TextEncoding::PdfDoc,
        }
    }
}

impl WriterConfig {
    /// Set the PDF version written in the header.
    pub fn with_version(mut self, major: u8, minor: u8) -> Self {
        self.version = (major, minor);
        self
    }

    /// Set the conformance mode.
    pub fn with_conformance(mut self, conformance: Conformance) -> Self {
        self.conformance = conformance;
        self
    }

    /// Enable or disable stream compression.
    ///
    /// When enabled, content streams and embedded file data are passed
    /// through FlateDecode; streams that do not shrink fall back to their
    /// raw bytes.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Emit string literals in hexadecimal form.
    pub fn with_hex_strings(mut self, use_hex: bool) -> Self {
        self.use_hex_strings = use_hex;
        self
    }

    /// Set the legacy encoding used for string literals.
    pub fn with_text_encoding(mut self, encoding: TextEncoding) -> Self {
        self.text_encoding = encoding;
        self
    }
}
