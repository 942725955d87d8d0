//! Cell value codec.
//!
//! Cell contents are opaque byte strings. The codec stores a value as a one
//! byte type tag followed by the raw payload, with a single sentinel byte for
//! nil. Records written before the tagged format existed hold untagged
//! structured-text documents; `decode` detects those by the document opener
//! and parses them instead of reading a tag.

const NULL_TAG: u8 = 0x00;
const STRING_TAG: u8 = 0x01;
const BINARY_TAG: u8 = 0x02;

/// A decoded cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Nil,
    Text(String),
    Bytes(Vec<u8>),
    /// Legacy structured-text document (the pre-tag on-disk format).
    Doc(serde_json::Value),
}

impl CellValue {
    pub fn is_nil(&self) -> bool {
        matches!(self, CellValue::Nil)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            CellValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// Encode a value into its stored byte form.
pub fn encode(value: &CellValue) -> Vec<u8> {
    match value {
        CellValue::Nil => vec![NULL_TAG],
        CellValue::Text(s) => {
            let mut out = Vec::with_capacity(1 + s.len());
            out.push(STRING_TAG);
            out.extend_from_slice(s.as_bytes());
            out
        }
        CellValue::Bytes(b) => {
            let mut out = Vec::with_capacity(1 + b.len());
            out.push(BINARY_TAG);
            out.extend_from_slice(b);
            out
        }
        CellValue::Doc(doc) => {
            // Untagged, for compatibility with pre-tag records.
            serde_json::to_vec(doc).expect("BUG: a json value always serializes")
        }
    }
}

/// Decode a stored byte form. Never fails: unrecognized input degrades to
/// `Bytes` rather than erroring.
pub fn decode(bytes: &[u8]) -> CellValue {
    if bytes.is_empty() {
        return CellValue::Nil;
    }
    // Legacy structured-text documents open with `{` or `[`; the tagged
    // format never does (tags are control bytes).
    if bytes[0] == b'{' || bytes[0] == b'[' {
        if let Ok(doc) = serde_json::from_slice(bytes) {
            return CellValue::Doc(doc);
        }
        return CellValue::Bytes(bytes.to_vec());
    }
    match bytes[0] {
        NULL_TAG => CellValue::Nil,
        STRING_TAG => match String::from_utf8(bytes[1..].to_vec()) {
            Ok(s) => CellValue::Text(s),
            Err(e) => CellValue::Bytes(e.into_bytes()),
        },
        BINARY_TAG => CellValue::Bytes(bytes[1..].to_vec()),
        _ => CellValue::Bytes(bytes[1..].to_vec()),
    }
}
