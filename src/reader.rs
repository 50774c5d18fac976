//! Structural reader for an existing PDF file.
//!
//! Incremental update needs only a skeleton view of the original file:
//! the `startxref` offset, the traditional cross-reference chain, the
//! trailer, the document catalog, and the page tree. This module parses
//! exactly that much and nothing more — it is not a PDF reader. The
//! original bytes are held immutably and copied verbatim to the new
//! file's sink before any appended object.

use crate::error::{Error, Result};
use crate::object::ObjectRef;
use bytes::Bytes;
use indexmap::IndexMap;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::digit1,
    combinator::{map, opt, value},
    sequence::tuple,
    IResult,
};
use std::collections::{HashMap, HashSet};
use std::io::Write;

/// A parsed dictionary, preserving the original key order.
pub type Dict = IndexMap<String, Value>;

/// A parsed PDF value from the original file.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String bytes, escapes and hex already decoded
    String(Vec<u8>),
    /// Name with `#XX` escapes already decoded
    Name(String),
    /// Array of values
    Array(Vec<Value>),
    /// Dictionary of values
    Dictionary(Dict),
    /// Indirect reference
    Reference(ObjectRef),
}

impl Value {
    /// Cast to a reference.
    pub fn as_reference(&self) -> Option<ObjectRef> {
        match self {
            Value::Reference(r) => Some(*r),
            _ => None,
        }
    }

    /// Cast to an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Cast to a dictionary.
    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Cast to an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Cast to string bytes.
    pub fn as_string(&self) -> Option<&[u8]> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

//
// token parsers
//

/// PDF whitespace: space, tab, CR, LF, NUL, form feed.
fn is_pdf_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

fn is_delimiter(byte: u8) -> bool {
    matches!(byte, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

/// Skip whitespace and `%` comments; always succeeds.
fn ws(mut input: &[u8]) -> IResult<&[u8], ()> {
    loop {
        let trimmed = match take_while::<_, _, nom::error::Error<&[u8]>>(is_pdf_whitespace)(input) {
            Ok((rest, _)) => rest,
            Err(_) => input,
        };
        if trimmed.first() == Some(&b'%') {
            let end = trimmed
                .iter()
                .position(|&b| b == b'\r' || b == b'\n')
                .unwrap_or(trimmed.len());
            input = &trimmed[end..];
        } else {
            return Ok((trimmed, ()));
        }
    }
}

fn parse_error(input: &[u8]) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))
}

fn unsigned(input: &[u8]) -> IResult<&[u8], u64> {
    map(digit1, |digits: &[u8]| {
        std::str::from_utf8(digits)
            .unwrap_or("0")
            .parse::<u64>()
            .unwrap_or(0)
    })(input)
}

/// An integer or real number token.
fn number(input: &[u8]) -> IResult<&[u8], Value> {
    let (rest, (sign, body)) = tuple((
        opt(alt((tag("+"), tag("-")))),
        take_while1(|b: u8| b.is_ascii_digit() || b == b'.'),
    ))(input)?;
    let text = std::str::from_utf8(body).map_err(|_| parse_error(input))?;
    let negative = sign == Some(b"-" as &[u8]);
    if text.contains('.') {
        let magnitude: f64 = text.parse().map_err(|_| parse_error(input))?;
        Ok((rest, Value::Real(if negative { -magnitude } else { magnitude })))
    } else {
        let magnitude: i64 = text.parse().map_err(|_| parse_error(input))?;
        Ok((rest, Value::Integer(if negative { -magnitude } else { magnitude })))
    }
}

/// An indirect reference token: `N G R`.
fn reference(input: &[u8]) -> IResult<&[u8], Value> {
    let (rest, (number, _, generation, _, _)) =
        tuple((unsigned, ws, unsigned, ws, tag("R")))(input)?;
    // `R` must stand alone, not begin a keyword
    if rest
        .first()
        .map(|&b| !is_pdf_whitespace(b) && !is_delimiter(b))
        .unwrap_or(false)
    {
        return Err(parse_error(input));
    }
    Ok((
        rest,
        Value::Reference(ObjectRef::new(number as u32, generation as u16)),
    ))
}

/// A name token with `#XX` escapes decoded.
fn name(input: &[u8]) -> IResult<&[u8], String> {
    let (rest, _) = tag("/")(input)?;
    let (rest, body) = take_while(|b: u8| !is_pdf_whitespace(b) && !is_delimiter(b))(rest)?;
    let mut decoded = String::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        if body[i] == b'#' && i + 2 < body.len() {
            let hex = std::str::from_utf8(&body[i + 1..i + 3]).unwrap_or("");
            if let Ok(byte) = u8::from_str_radix(hex, 16) {
                decoded.push(byte as char);
                i += 3;
                continue;
            }
        }
        decoded.push(body[i] as char);
        i += 1;
    }
    Ok((rest, decoded))
}

/// A literal string with nesting and backslash escapes decoded.
fn literal_string(input: &[u8]) -> IResult<&[u8], Value> {
    if input.first() != Some(&b'(') {
        return Err(parse_error(input));
    }
    let mut out = Vec::new();
    let mut depth = 1usize;
    let mut i = 1;
    while i < input.len() {
        match input[i] {
            b'\\' if i + 1 < input.len() => {
                i += 1;
                match input[i] {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0C),
                    b'0'..=b'7' => {
                        let mut code = 0u16;
                        let mut digits = 0;
                        while digits < 3 && i < input.len() && (b'0'..=b'7').contains(&input[i]) {
                            code = code * 8 + (input[i] - b'0') as u16;
                            digits += 1;
                            i += 1;
                        }
                        i -= 1;
                        out.push(code as u8);
                    },
                    other => out.push(other),
                }
            },
            b'(' => {
                depth += 1;
                out.push(b'(');
            },
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[i + 1..], Value::String(out)));
                }
                out.push(b')');
            },
            other => out.push(other),
        }
        i += 1;
    }
    Err(parse_error(input))
}

/// A hex string: whitespace ignored, odd final digit padded with zero.
fn hex_string(input: &[u8]) -> IResult<&[u8], Value> {
    if input.first() != Some(&b'<') || input.get(1) == Some(&b'<') {
        return Err(parse_error(input));
    }
    let close = input
        .iter()
        .position(|&b| b == b'>')
        .ok_or_else(|| parse_error(input))?;
    let mut digits: Vec<u8> = input[1..close]
        .iter()
        .copied()
        .filter(|b| !is_pdf_whitespace(*b))
        .collect();
    if digits.len() % 2 == 1 {
        digits.push(b'0');
    }
    let mut out = Vec::with_capacity(digits.len() / 2);
    for pair in digits.chunks_exact(2) {
        let hex = std::str::from_utf8(pair).map_err(|_| parse_error(input))?;
        out.push(u8::from_str_radix(hex, 16).map_err(|_| parse_error(input))?);
    }
    Ok((&input[close + 1..], Value::String(out)))
}

fn array(input: &[u8]) -> IResult<&[u8], Value> {
    let (mut rest, _) = tag("[")(input)?;
    let mut items = Vec::new();
    loop {
        let (after_ws, _) = ws(rest)?;
        if after_ws.first() == Some(&b']') {
            return Ok((&after_ws[1..], Value::Array(items)));
        }
        let (after_value, item) = parse_value(after_ws)?;
        items.push(item);
        rest = after_value;
    }
}

fn dictionary(input: &[u8]) -> IResult<&[u8], Value> {
    let (mut rest, _) = tag("<<")(input)?;
    let mut dict = Dict::new();
    loop {
        let (after_ws, _) = ws(rest)?;
        if after_ws.starts_with(b">>") {
            return Ok((&after_ws[2..], Value::Dictionary(dict)));
        }
        let (after_key, key) = name(after_ws)?;
        let (after_ws2, _) = ws(after_key)?;
        let (after_value, val) = parse_value(after_ws2)?;
        dict.insert(key, val);
        rest = after_value;
    }
}

/// Parse one PDF value.
pub fn parse_value(input: &[u8]) -> IResult<&[u8], Value> {
    alt((
        dictionary,
        array,
        hex_string,
        literal_string,
        map(name, Value::Name),
        value(Value::Boolean(true), tag("true")),
        value(Value::Boolean(false), tag("false")),
        value(Value::Null, tag("null")),
        reference,
        number,
    ))(input)
}

//
// existing file model
//

/// Read-only structural view of the PDF file being updated.
#[derive(Debug)]
pub struct ExistingPdf {
    bytes: Bytes,
    startxref: u64,
    entries: HashMap<u32, (u64, u16, bool)>,
    trailer: Dict,
    catalog: Dict,
    page_tree_ref: ObjectRef,
    page_kids: Vec<ObjectRef>,
    size: u32,
}

impl ExistingPdf {
    /// Parse the structural skeleton of an existing file.
    ///
    /// Fails before any output is produced when the file has no catalog
    /// or no page tree — an unreadable hybrid must never be emitted.
    pub fn load(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes: Bytes = bytes.into();
        let startxref = find_startxref(&bytes)?;

        let mut entries: HashMap<u32, (u64, u16, bool)> = HashMap::new();
        let mut trailer: Option<Dict> = None;
        let mut visited: HashSet<u64> = HashSet::new();
        let mut next_table = Some(startxref);

        while let Some(offset) = next_table {
            if !visited.insert(offset) {
                break;
            }
            let (section_entries, table_trailer) = parse_xref_at(&bytes, offset)?;
            for (number, entry) in section_entries {
                // the newest table in the chain wins
                entries.entry(number).or_insert(entry);
            }
            next_table = table_trailer
                .get("Prev")
                .and_then(Value::as_integer)
                .map(|p| p as u64);
            if trailer.is_none() {
                trailer = Some(table_trailer);
            }
        }
        let trailer = trailer.ok_or(Error::UnsupportedStructure(
            "the original file has no trailer".to_string(),
        ))?;

        let catalog_ref = trailer
            .get("Root")
            .and_then(Value::as_reference)
            .ok_or(Error::MissingCatalog)?;
        let catalog = parse_object_dict(&bytes, &entries, catalog_ref)?.ok_or(Error::MissingCatalog)?;

        let page_tree_ref = catalog
            .get("Pages")
            .and_then(Value::as_reference)
            .ok_or(Error::MissingPageTree)?;
        let pages = parse_object_dict(&bytes, &entries, page_tree_ref)?.ok_or(Error::MissingPageTree)?;
        let page_kids: Vec<ObjectRef> = pages
            .get("Kids")
            .and_then(Value::as_array)
            .map(|kids| kids.iter().filter_map(Value::as_reference).collect())
            .unwrap_or_default();

        let max_object = entries.keys().copied().max().unwrap_or(0);
        let size = trailer
            .get("Size")
            .and_then(Value::as_integer)
            .map(|s| s as u32)
            .unwrap_or(max_object + 1);

        log::debug!(
            "Loaded original file: {} bytes, {} references, table at {}",
            bytes.len(),
            size,
            startxref
        );
        Ok(Self {
            bytes,
            startxref,
            entries,
            trailer,
            catalog,
            page_tree_ref,
            page_kids,
            size,
        })
    }

    /// Load an existing file from disk.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Self::load(std::fs::read(path)?)
    }

    /// The original file's bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total length of the original file in bytes.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// True when the original file holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte offset of the original cross-reference table (its `startxref`).
    pub fn table_offset(&self) -> u64 {
        self.startxref
    }

    /// Highest object number used in the original file.
    pub fn max_object(&self) -> u32 {
        self.entries.keys().copied().max().unwrap_or(0)
    }

    /// Total reference count of the original chain.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Chain summary consumed by the writer's cross-reference table.
    pub fn previous_xref(&self) -> crate::xref::PreviousXRef {
        crate::xref::PreviousXRef {
            offset: self.startxref,
            max_object: self.max_object(),
            size: self.size,
        }
    }

    /// The original trailer dictionary.
    pub fn trailer(&self) -> &Dict {
        &self.trailer
    }

    /// The original document catalog dictionary.
    pub fn catalog(&self) -> &Dict {
        &self.catalog
    }

    /// Reference of the original page tree root.
    pub fn page_tree_ref(&self) -> ObjectRef {
        self.page_tree_ref
    }

    /// Page (or subtree) references from the original page tree's /Kids.
    pub fn page_kids(&self) -> &[ObjectRef] {
        &self.page_kids
    }

    /// Reference of the original document information dictionary, if any.
    pub fn info_ref(&self) -> Option<ObjectRef> {
        self.trailer.get("Info").and_then(Value::as_reference)
    }

    /// The original two-part document identifier, if present.
    pub fn document_id(&self) -> Option<(Vec<u8>, Vec<u8>)> {
        let id = self.trailer.get("ID")?.as_array()?;
        match id {
            [Value::String(one), Value::String(two)] => Some((one.clone(), two.clone())),
            _ => None,
        }
    }

    /// Copy the original bytes verbatim to `sink`, returning the count
    /// written. A line terminator is appended only when the file does not
    /// already end with one, so appended objects start on a fresh line.
    pub fn copy_to<W: Write>(&self, sink: &mut W) -> Result<u64> {
        sink.write_all(&self.bytes)?;
        let mut written = self.bytes.len() as u64;
        if !matches!(self.bytes.last(), Some(b'\r') | Some(b'\n')) {
            sink.write_all(b"\r\n")?;
            written += 2;
        }
        Ok(written)
    }
}

/// Scan backwards from the end of the file for `startxref`.
fn find_startxref(bytes: &[u8]) -> Result<u64> {
    let keyword = b"startxref";
    let window_start = bytes.len().saturating_sub(2048);
    let window = &bytes[window_start..];
    let pos = window
        .windows(keyword.len())
        .rposition(|chunk| chunk == keyword)
        .ok_or(Error::UnsupportedStructure(
            "no startxref marker near the end of the file".to_string(),
        ))?;
    let after = &window[pos + keyword.len()..];
    let (after_ws, _) = ws(after).map_err(|_| Error::ParseError {
        offset: window_start + pos,
        reason: "malformed startxref".to_string(),
    })?;
    let digits: Vec<u8> = after_ws
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .copied()
        .collect();
    String::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(Error::ParseError {
            offset: window_start + pos,
            reason: "startxref offset is not a number".to_string(),
        })
}

/// Parse one traditional cross-reference table and its trailer.
fn parse_xref_at(bytes: &[u8], offset: u64) -> Result<(Vec<(u32, (u64, u16, bool))>, Dict)> {
    let offset = offset as usize;
    if offset >= bytes.len() {
        return Err(Error::ParseError {
            offset,
            reason: "cross-reference offset is past the end of the file".to_string(),
        });
    }
    let input = &bytes[offset..];
    let (input, _) = ws(input).map_err(|_| malformed(offset, "whitespace"))?;
    if !input.starts_with(b"xref") {
        return Err(Error::UnsupportedStructure(
            "the original file uses a cross-reference stream, which this engine cannot chain to"
                .to_string(),
        ));
    }
    let mut rest = &input[4..];
    let mut entries = Vec::new();
    loop {
        let (after_ws, _) = ws(rest).map_err(|_| malformed(offset, "section header"))?;
        if after_ws.starts_with(b"trailer") {
            rest = &after_ws[b"trailer".len()..];
            break;
        }
        let (after_start, start) =
            unsigned(after_ws).map_err(|_| malformed(offset, "section start"))?;
        let (after_ws2, _) = ws(after_start).map_err(|_| malformed(offset, "section header"))?;
        let (mut cursor, count) =
            unsigned(after_ws2).map_err(|_| malformed(offset, "section count"))?;
        for index in 0..count {
            let (after_ws3, _) = ws(cursor).map_err(|_| malformed(offset, "entry"))?;
            let (after_off, entry_offset) =
                unsigned(after_ws3).map_err(|_| malformed(offset, "entry offset"))?;
            let (after_ws4, _) = ws(after_off).map_err(|_| malformed(offset, "entry"))?;
            let (after_gen, generation) =
                unsigned(after_ws4).map_err(|_| malformed(offset, "entry generation"))?;
            let (after_ws5, _) = ws(after_gen).map_err(|_| malformed(offset, "entry"))?;
            let in_use = match after_ws5.first() {
                Some(b'n') => true,
                Some(b'f') => false,
                _ => return Err(malformed(offset, "entry kind")),
            };
            cursor = &after_ws5[1..];
            entries.push((
                start as u32 + index as u32,
                (entry_offset, generation as u16, in_use),
            ));
        }
        rest = cursor;
    }
    let (after_ws, _) = ws(rest).map_err(|_| malformed(offset, "trailer"))?;
    let (_, trailer) = dictionary(after_ws).map_err(|_| malformed(offset, "trailer dictionary"))?;
    match trailer {
        Value::Dictionary(dict) => Ok((entries, dict)),
        _ => Err(malformed(offset, "trailer dictionary")),
    }
}

fn malformed(offset: usize, what: &str) -> Error {
    Error::ParseError {
        offset,
        reason: format!("malformed {}", what),
    }
}

/// Parse the dictionary body of the indirect object `oref` points at.
fn parse_object_dict(
    bytes: &[u8],
    entries: &HashMap<u32, (u64, u16, bool)>,
    oref: ObjectRef,
) -> Result<Option<Dict>> {
    let (offset, _, in_use) = match entries.get(&oref.number) {
        Some(entry) => *entry,
        None => return Ok(None),
    };
    if !in_use || offset as usize >= bytes.len() {
        return Ok(None);
    }
    let input = &bytes[offset as usize..];
    let parsed: IResult<&[u8], Value> = (|input| {
        let (input, _) = ws(input)?;
        let (input, _) = unsigned(input)?;
        let (input, _) = ws(input)?;
        let (input, _) = unsigned(input)?;
        let (input, _) = ws(input)?;
        let (input, _) = tag("obj")(input)?;
        let (input, _) = ws(input)?;
        parse_value(input)
    })(input);
    match parsed {
        Ok((_, Value::Dictionary(dict))) => Ok(Some(dict)),
        Ok(_) => Ok(None),
        Err(_) => Err(Error::ParseError {
            offset: offset as usize,
            reason: format!("could not parse indirect object {}", oref),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse_value(b"42 ").unwrap().1, Value::Integer(42));
        assert_eq!(parse_value(b"-17 ").unwrap().1, Value::Integer(-17));
        assert_eq!(parse_value(b"3.5 ").unwrap().1, Value::Real(3.5));
        assert_eq!(parse_value(b"true ").unwrap().1, Value::Boolean(true));
        assert_eq!(parse_value(b"null ").unwrap().1, Value::Null);
    }

    #[test]
    fn test_parse_reference_vs_numbers() {
        assert_eq!(
            parse_value(b"12 0 R ").unwrap().1,
            Value::Reference(ObjectRef::new(12, 0))
        );
        // two numbers not followed by R stay numbers
        assert_eq!(parse_value(b"12 0 obj").unwrap().1, Value::Integer(12));
    }

    #[test]
    fn test_parse_name_with_escape() {
        assert_eq!(
            parse_value(b"/Name#20With#20Space ").unwrap().1,
            Value::Name("Name With Space".to_string())
        );
    }

    #[test]
    fn test_parse_strings() {
        assert_eq!(
            parse_value(b"(Hello (nested) \\(escaped\\))").unwrap().1,
            Value::String(b"Hello (nested) (escaped)".to_vec())
        );
        assert_eq!(
            parse_value(b"<48656C6C6F>").unwrap().1,
            Value::String(b"Hello".to_vec())
        );
    }

    #[test]
    fn test_parse_dictionary_preserves_order() {
        let (_, parsed) =
            parse_value(b"<< /Type /Catalog /Pages 2 0 R /Lang (en) >>").unwrap();
        let dict = parsed.as_dict().unwrap().clone();
        let keys: Vec<&String> = dict.keys().collect();
        assert_eq!(keys, ["Type", "Pages", "Lang"]);
        assert_eq!(dict.get("Pages").unwrap().as_reference(), Some(ObjectRef::new(2, 0)));
    }

    #[test]
    fn test_parse_nested_array() {
        let (_, parsed) = parse_value(b"[1 [2 3] /Four (five)]").unwrap();
        let items = parsed.as_array().unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[1].as_array().unwrap().len(), 2);
    }

    fn minimal_pdf() -> Vec<u8> {
        // A syntactically complete one-page file with aligned offsets
        let mut out = Vec::new();
        let header = b"%PDF-1.4\n";
        out.extend_from_slice(header);
        let catalog_at = out.len();
        out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R /Lang (en-GB) >>\nendobj\n");
        let pages_at = out.len();
        out.extend_from_slice(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n");
        let page_at = out.len();
        out.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n");
        let xref_at = out.len();
        out.extend_from_slice(b"xref\n0 4\n");
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in [catalog_at, pages_at, page_at] {
            out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        out.extend_from_slice(b"trailer\n<< /Size 4 /Root 1 0 R >>\n");
        out.extend_from_slice(format!("startxref\n{}\n%%EOF\n", xref_at).as_bytes());
        out
    }

    #[test]
    fn test_load_minimal_file() {
        let pdf = minimal_pdf();
        let existing = ExistingPdf::load(pdf).unwrap();
        assert_eq!(existing.max_object(), 3);
        assert_eq!(existing.size(), 4);
        assert_eq!(existing.page_tree_ref(), ObjectRef::new(2, 0));
        assert_eq!(existing.page_kids().to_vec(), vec![ObjectRef::new(3, 0)]);
        assert_eq!(
            existing.catalog().get("Lang").unwrap().as_string(),
            Some(b"en-GB" as &[u8])
        );
    }

    #[test]
    fn test_previous_xref_summary() {
        let existing = ExistingPdf::load(minimal_pdf()).unwrap();
        let prev = existing.previous_xref();
        assert_eq!(prev.max_object, 3);
        assert_eq!(prev.size, 4);
        assert_eq!(prev.offset, existing.table_offset());
    }

    #[test]
    fn test_missing_root_is_precondition_error() {
        let pdf = b"%PDF-1.4\nxref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1 >>\nstartxref\n9\n%%EOF".to_vec();
        let err = ExistingPdf::load(pdf).unwrap_err();
        assert!(matches!(err, Error::MissingCatalog));
    }

    #[test]
    fn test_catalog_without_pages_is_precondition_error() {
        let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
        let catalog_at = out.len();
        out.extend_from_slice(b"1 0 obj\n<< /Type /Catalog >>\nendobj\n");
        let xref_at = out.len();
        out.extend_from_slice(b"xref\n0 2\n0000000000 65535 f \n");
        out.extend_from_slice(format!("{:010} 00000 n \n", catalog_at).as_bytes());
        out.extend_from_slice(b"trailer\n<< /Size 2 /Root 1 0 R >>\n");
        out.extend_from_slice(format!("startxref\n{}\n%%EOF", xref_at).as_bytes());
        let err = ExistingPdf::load(out).unwrap_err();
        assert!(matches!(err, Error::MissingPageTree));
    }

    #[test]
    fn test_xref_stream_is_unsupported() {
        let mut out: Vec<u8> = b"%PDF-1.5\n".to_vec();
        let obj_at = out.len();
        out.extend_from_slice(b"1 0 obj\n<< /Type /XRef >>\nstream\nendstream\nendobj\n");
        out.extend_from_slice(format!("startxref\n{}\n%%EOF", obj_at).as_bytes());
        let err = ExistingPdf::load(out).unwrap_err();
        assert!(matches!(err, Error::UnsupportedStructure(_)));
    }

    #[test]
    fn test_copy_to_appends_line_end_when_missing() {
        let mut pdf = minimal_pdf();
        assert_eq!(pdf.pop(), Some(b'\n')); // strip the final newline
        let existing = ExistingPdf::load(pdf.clone()).unwrap();
        let mut sink = Vec::new();
        let written = existing.copy_to(&mut sink).unwrap();
        assert_eq!(written as usize, pdf.len() + 2);
        assert!(sink.ends_with(b"%%EOF\r\n"));
    }
}
