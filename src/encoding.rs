//! Legacy text encodings for string literals.
//!
//! PDF string values are byte strings. Text destined for a literal is
//! first passed through a legacy single-byte encoding (PDFDocEncoding)
//! where possible, and otherwise through big-endian UTF-16 with a byte
//! order mark prefix. Hex output must encode through the same path and
//! then hex-encode the resulting bytes; hex-encoding the source text
//! directly produces documents that many readers mis-render silently.

/// Encodings available for string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// PDFDocEncoding, the single-byte text encoding from the PDF spec
    #[default]
    PdfDoc,
    /// Big-endian UTF-16 with a U+FEFF byte order mark prefix
    Utf16Be,
}

impl TextEncoding {
    /// Byte prefix identifying the encoding inside a string value.
    pub fn prefix(&self) -> &'static [u8] {
        match self {
            TextEncoding::PdfDoc => b"",
            TextEncoding::Utf16Be => b"\xFE\xFF",
        }
    }

    /// Encode text, returning `None` when a character has no
    /// representation in this encoding (never for UTF-16).
    pub fn encode(&self, text: &str) -> Option<Vec<u8>> {
        match self {
            TextEncoding::PdfDoc => {
                let mut out = Vec::with_capacity(text.len());
                for ch in text.chars() {
                    out.push(pdfdoc_byte(ch)?);
                }
                Some(out)
            },
            TextEncoding::Utf16Be => {
                let mut out = Vec::with_capacity(text.len() * 2);
                for unit in text.encode_utf16() {
                    out.extend_from_slice(&unit.to_be_bytes());
                }
                Some(out)
            },
        }
    }

    /// Decode bytes previously produced by [`TextEncoding::encode`].
    ///
    /// The byte order mark, if the caller kept it, must be stripped first;
    /// use [`decode_text`] for prefix-aware decoding.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::PdfDoc => bytes.iter().map(|&b| pdfdoc_char(b)).collect(),
            TextEncoding::Utf16Be => {
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16_lossy(&units)
            },
        }
    }
}

/// Encode text with the preferred encoding, falling back to UTF-16BE when
/// the text cannot be represented. Returns the encoding actually used
/// (its prefix has not been prepended).
pub fn encode_text(text: &str, preferred: TextEncoding) -> (TextEncoding, Vec<u8>) {
    if let Some(bytes) = preferred.encode(text) {
        return (preferred, bytes);
    }
    let bytes = TextEncoding::Utf16Be
        .encode(text)
        .expect("UTF-16 encoding is total");
    (TextEncoding::Utf16Be, bytes)
}

/// Decode string-value bytes, honouring a UTF-16BE byte order mark.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(b"\xFE\xFF" as &[u8]) {
        TextEncoding::Utf16Be.decode(rest)
    } else {
        TextEncoding::PdfDoc.decode(bytes)
    }
}

/// Map one PDFDocEncoding byte to its character.
fn pdfdoc_char(byte: u8) -> char {
    match byte {
        0x18 => '\u{02D8}', // breve
        0x19 => '\u{02C7}', // caron
        0x1A => '\u{02C6}', // circumflex
        0x1B => '\u{02D9}', // dot accent
        0x1C => '\u{02DD}', // double acute
        0x1D => '\u{02DB}', // ogonek
        0x1E => '\u{02DA}', // ring
        0x1F => '\u{02DC}', // small tilde
        0x00..=0x7F => byte as char,
        0x80 => '\u{2022}',
        0x81 => '\u{2020}',
        0x82 => '\u{2021}',
        0x83 => '\u{2026}',
        0x84 => '\u{2014}',
        0x85 => '\u{2013}',
        0x86 => '\u{0192}',
        0x87 => '\u{2044}',
        0x88 => '\u{2039}',
        0x89 => '\u{203A}',
        0x8A => '\u{2212}',
        0x8B => '\u{2030}',
        0x8C => '\u{201E}',
        0x8D => '\u{201C}',
        0x8E => '\u{201D}',
        0x8F => '\u{2018}',
        0x90 => '\u{2019}',
        0x91 => '\u{201A}',
        0x92 => '\u{2122}',
        0x93 => '\u{FB01}',
        0x94 => '\u{FB02}',
        0x95 => '\u{0141}',
        0x96 => '\u{0152}',
        0x97 => '\u{0160}',
        0x98 => '\u{0178}',
        0x99 => '\u{017D}',
        0x9A => '\u{0131}',
        0x9B => '\u{0142}',
        0x9C => '\u{0153}',
        0x9D => '\u{0161}',
        0x9E => '\u{017E}',
        0x9F => '\u{FFFD}', // undefined slot
        0xA0 => '\u{20AC}', // euro
        0xA1..=0xFF => char::from_u32(byte as u32).unwrap_or('\u{FFFD}'),
    }
}

/// Map one character to its PDFDocEncoding byte, if it has one.
fn pdfdoc_byte(ch: char) -> Option<u8> {
    let byte = match ch {
        '\u{02D8}' => 0x18,
        '\u{02C7}' => 0x19,
        '\u{02C6}' => 0x1A,
        '\u{02D9}' => 0x1B,
        '\u{02DD}' => 0x1C,
        '\u{02DB}' => 0x1D,
        '\u{02DA}' => 0x1E,
        '\u{02DC}' => 0x1F,
        '\u{2022}' => 0x80,
        '\u{2020}' => 0x81,
        '\u{2021}' => 0x82,
        '\u{2026}' => 0x83,
        '\u{2014}' => 0x84,
        '\u{2013}' => 0x85,
        '\u{0192}' => 0x86,
        '\u{2044}' => 0x87,
        '\u{2039}' => 0x88,
        '\u{203A}' => 0x89,
        '\u{2212}' => 0x8A,
        '\u{2030}' => 0x8B,
        '\u{201E}' => 0x8C,
        '\u{201C}' => 0x8D,
        '\u{201D}' => 0x8E,
        '\u{2018}' => 0x8F,
        '\u{2019}' => 0x90,
        '\u{201A}' => 0x91,
        '\u{2122}' => 0x92,
        '\u{FB01}' => 0x93,
        '\u{FB02}' => 0x94,
        '\u{0141}' => 0x95,
        '\u{0152}' => 0x96,
        '\u{0160}' => 0x97,
        '\u{0178}' => 0x98,
        '\u{017D}' => 0x99,
        '\u{0131}' => 0x9A,
        '\u{0142}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{0161}' => 0x9D,
        '\u{017E}' => 0x9E,
        '\u{20AC}' => 0xA0,
        c if (c as u32) < 0x18 => c as u8,
        c if (0x20..0x80).contains(&(c as u32)) => c as u8,
        c if (0xA1..=0xFF).contains(&(c as u32)) => c as u8,
        _ => return None,
    };
    Some(byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_round_trip() {
        let (enc, bytes) = encode_text("Hello, World!", TextEncoding::PdfDoc);
        assert_eq!(enc, TextEncoding::PdfDoc);
        assert_eq!(bytes, b"Hello, World!");
        assert_eq!(decode_text(&bytes), "Hello, World!");
    }

    #[test]
    fn test_pdfdoc_specials_round_trip() {
        let text = "em\u{2014}dash \u{2022} bullet \u{20AC}1.50";
        let (enc, bytes) = encode_text(text, TextEncoding::PdfDoc);
        assert_eq!(enc, TextEncoding::PdfDoc);
        assert_eq!(TextEncoding::PdfDoc.decode(&bytes), text);
    }

    #[test]
    fn test_utf16_fallback() {
        // CJK has no PDFDocEncoding representation
        let text = "\u{65E5}\u{672C}";
        let (enc, bytes) = encode_text(text, TextEncoding::PdfDoc);
        assert_eq!(enc, TextEncoding::Utf16Be);
        assert_eq!(bytes, [0x65, 0xE5, 0x67, 0x2C]);

        let mut with_bom = enc.prefix().to_vec();
        with_bom.extend_from_slice(&bytes);
        assert_eq!(decode_text(&with_bom), text);
    }

    #[test]
    fn test_latin1_range_round_trip() {
        let text = "na\u{EF}ve caf\u{E9}";
        let (enc, bytes) = encode_text(text, TextEncoding::PdfDoc);
        assert_eq!(enc, TextEncoding::PdfDoc);
        assert_eq!(decode_text(&bytes), text);
    }

    #[test]
    fn test_unencodable_char_is_none() {
        assert_eq!(TextEncoding::PdfDoc.encode("snowman \u{2603}"), None);
    }
}
