//! Stream filters.
//!
//! A filter transforms raw stream bytes before they reach the file and
//! exposes the stable name token written in the /Filter dictionary entry.
//! A compression filter that fails to shrink its input signals "no
//! reduction" so the caller can keep the raw bytes instead of growing the
//! document.

use crate::error::{Error, Result};
use std::io::Write;

/// Filters available to object streams and embedded file data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// Flate (zlib/deflate) compression
    Flate,
    /// Two-hex-digits-per-byte encoding, terminated with `>`
    AsciiHex,
}

impl FilterKind {
    /// Name token written in the /Filter entry.
    pub fn filter_name(&self) -> &'static str {
        match self {
            FilterKind::Flate => "FlateDecode",
            FilterKind::AsciiHex => "ASCIIHexDecode",
        }
    }

    /// Look up a filter by the compression type name used in configuration
    /// files and the public API.
    pub fn from_compression_name(name: &str) -> Result<Self> {
        match name {
            "FlateDecode" | "flate" => Ok(FilterKind::Flate),
            "ASCIIHexDecode" | "ascii-hex" => Ok(FilterKind::AsciiHex),
            other => Err(Error::UnsupportedCompression(other.to_string())),
        }
    }

    /// Apply this filter to `data`.
    ///
    /// Returns `Ok(None)` when the filter achieved no reduction and the
    /// caller should fall back to the unfiltered bytes.
    pub fn encode(&self, data: &[u8]) -> Result<Option<Vec<u8>>> {
        match self {
            FilterKind::Flate => {
                let mut encoder =
                    flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data)?;
                let compressed = encoder.finish()?;
                if compressed.len() < data.len() {
                    Ok(Some(compressed))
                } else {
                    Ok(None)
                }
            },
            FilterKind::AsciiHex => {
                let mut out = Vec::with_capacity(data.len() * 2 + 1);
                for byte in data {
                    out.extend_from_slice(format!("{:02X}", byte).as_bytes());
                }
                out.push(b'>');
                Ok(Some(out))
            },
        }
    }
}

/// Apply a filter chain in order.
///
/// Returns the transformed bytes together with the name tokens to write in
/// the /Filter entry, or `None` when any link in the chain reported no
/// reduction; the caller then writes the raw bytes and omits /Filter.
pub fn apply_chain(filters: &[FilterKind], data: &[u8]) -> Result<Option<Vec<u8>>> {
    let mut current = None;
    for filter in filters {
        let input = current.as_deref().unwrap_or(data);
        match filter.encode(input)? {
            Some(next) => current = Some(next),
            None => return Ok(None),
        }
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flate_reduces_repetitive_data() {
        let data = vec![b'A'; 4096];
        let out = FilterKind::Flate.encode(&data).unwrap().unwrap();
        assert!(out.len() < data.len());
    }

    #[test]
    fn test_flate_signals_no_reduction() {
        // Short input: the zlib header alone exceeds the payload
        let data = b"xy";
        assert!(FilterKind::Flate.encode(data).unwrap().is_none());
    }

    #[test]
    fn test_ascii_hex_encoding() {
        let out = FilterKind::AsciiHex.encode(&[0x00, 0xAB, 0xFF]).unwrap().unwrap();
        assert_eq!(out, b"00ABFF>");
    }

    #[test]
    fn test_chain_falls_back_when_any_filter_declines() {
        let data = b"xy";
        let chain = [FilterKind::AsciiHex, FilterKind::Flate];
        assert!(apply_chain(&chain, data).unwrap().is_none());
    }

    #[test]
    fn test_empty_chain_is_identity() {
        assert_eq!(apply_chain(&[], b"abc").unwrap(), None);
    }

    #[test]
    fn test_unknown_compression_name() {
        let err = FilterKind::from_compression_name("LZWDecode").unwrap_err();
        assert!(matches!(err, Error::UnsupportedCompression(_)));
    }
}
