//! Cell key encoding.
//!
//! One store column family holds every cell of a table:
//! `{row_id}\x00{family}\x00{qualifier}\x00{be64(!timestamp)}` → value bytes.
//!
//! NUL is the lowest byte, so full keys group by row in lexicographic row-id
//! order, then by family and qualifier within a row. The bitwise-inverted
//! timestamp sorts a cell's versions newest first, which makes "latest at or
//! before T" a short forward scan. Row ids, families, and qualifiers must not
//! contain NUL; the address parser and name validation enforce this.

use strata_model::Timestamp;

const SEP: u8 = 0x00;

/// Build a cell key for one version.
pub fn cell_key(row_id: &str, family: &str, qualifier: &str, ts: Timestamp) -> Vec<u8> {
    let mut key =
        Vec::with_capacity(row_id.len() + family.len() + qualifier.len() + 3 + 8);
    key.extend_from_slice(row_id.as_bytes());
    key.push(SEP);
    key.extend_from_slice(family.as_bytes());
    key.push(SEP);
    key.extend_from_slice(qualifier.as_bytes());
    key.push(SEP);
    key.extend_from_slice(&(!ts.0).to_be_bytes());
    key
}

/// Prefix covering every cell of a row.
pub fn row_prefix(row_id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(row_id.len() + 1);
    key.extend_from_slice(row_id.as_bytes());
    key.push(SEP);
    key
}

/// Prefix covering every cell of a row under one family.
pub fn family_prefix(row_id: &str, family: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(row_id.len() + family.len() + 2);
    key.extend_from_slice(row_id.as_bytes());
    key.push(SEP);
    key.extend_from_slice(family.as_bytes());
    key.push(SEP);
    key
}

/// Prefix covering every version of one cell.
pub fn cell_prefix(row_id: &str, family: &str, qualifier: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(row_id.len() + family.len() + qualifier.len() + 3);
    key.extend_from_slice(row_id.as_bytes());
    key.push(SEP);
    key.extend_from_slice(family.as_bytes());
    key.push(SEP);
    key.extend_from_slice(qualifier.as_bytes());
    key.push(SEP);
    key
}

/// A parsed cell key.
#[derive(Debug, PartialEq)]
pub struct CellKey<'a> {
    pub row_id: &'a str,
    pub family: &'a str,
    pub qualifier: &'a str,
    pub timestamp: Timestamp,
}

/// Parse a cell key back into its parts. `None` on malformed keys.
pub fn parse_cell_key(key: &[u8]) -> Option<CellKey<'_>> {
    let row_end = key.iter().position(|&b| b == SEP)?;
    let row_id = std::str::from_utf8(&key[..row_end]).ok()?;

    let rest = &key[row_end + 1..];
    let family_end = rest.iter().position(|&b| b == SEP)?;
    let family = std::str::from_utf8(&rest[..family_end]).ok()?;

    // What remains is `{qualifier}\x00{8-byte inverted timestamp}`.
    let rest = &rest[family_end + 1..];
    if rest.len() < 9 || rest[rest.len() - 9] != SEP {
        return None;
    }
    let qualifier = std::str::from_utf8(&rest[..rest.len() - 9]).ok()?;
    let inverted: [u8; 8] = rest[rest.len() - 8..].try_into().ok()?;
    let timestamp = Timestamp(!u64::from_be_bytes(inverted));

    Some(CellKey {
        row_id,
        family,
        qualifier,
        timestamp,
    })
}
