//! Keys, ranges and the composite key encodings shared by the index and the engine.
//!
//! An index entry key is a `(row, family, qualifier)` triple compared byte-wise,
//! component by component. Composite components are null-byte delimited tuples:
//!
//! - value/field pair: `value\0field`
//! - hit / term-frequency qualifier: `datatype\0owner\0value\0field`
//! - field-index family: `fi\0field`
//! - field-index qualifier: `value\0datatype\0owner`
//! - document family: `datatype\0owner`

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ProximaError, Result};

/// Separator between the components of a composite key.
pub const NULL_BYTE: char = '\u{0}';

/// Largest code point, appended to an owner id to reach past all of its children.
pub const MAX_UNICODE: &str = "\u{10FFFF}";

/// Family prefix of field-index entries.
pub const FIELD_INDEX_PREFIX: &str = "fi";

/// Default family of term-frequency entries.
pub const TERM_FREQUENCY_FAMILY: &str = "tf";

/// Separator between a parent owner id and a child suffix.
pub const CHILD_SEPARATOR: char = '.';

/// A sorted index key.
///
/// Ordering is row, then family, then qualifier, each byte-lexicographic.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key {
    row: Vec<u8>,
    family: Vec<u8>,
    qualifier: Vec<u8>,
}

/// Depth at which two keys are compared or a successor is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartialKey {
    Row,
    RowFamily,
    RowFamilyQualifier,
}

impl Key {
    /// Create a key from its three components.
    pub fn new<R, F, Q>(row: R, family: F, qualifier: Q) -> Self
    where
        R: Into<Vec<u8>>,
        F: Into<Vec<u8>>,
        Q: Into<Vec<u8>>,
    {
        Key {
            row: row.into(),
            family: family.into(),
            qualifier: qualifier.into(),
        }
    }

    /// Create a key with an empty qualifier, e.g. a document key `shard : datatype\0uid`.
    pub fn with_family<R, F>(row: R, family: F) -> Self
    where
        R: Into<Vec<u8>>,
        F: Into<Vec<u8>>,
    {
        Key::new(row, family, Vec::new())
    }

    pub fn row(&self) -> &[u8] {
        &self.row
    }

    pub fn family(&self) -> &[u8] {
        &self.family
    }

    pub fn qualifier(&self) -> &[u8] {
        &self.qualifier
    }

    /// Replace the qualifier, keeping row and family.
    pub fn with_qualifier<Q: Into<Vec<u8>>>(&self, qualifier: Q) -> Key {
        Key {
            row: self.row.clone(),
            family: self.family.clone(),
            qualifier: qualifier.into(),
        }
    }

    /// The smallest key strictly greater than every key sharing `part` with this one.
    pub fn following_key(&self, part: PartialKey) -> Key {
        match part {
            PartialKey::Row => Key::new(followed_by_null(&self.row), Vec::new(), Vec::new()),
            PartialKey::RowFamily => {
                Key::new(self.row.clone(), followed_by_null(&self.family), Vec::new())
            }
            PartialKey::RowFamilyQualifier => Key::new(
                self.row.clone(),
                self.family.clone(),
                followed_by_null(&self.qualifier),
            ),
        }
    }

    /// Split a `datatype\0owner` family (document and attribute keys).
    pub fn document_id(&self) -> Result<DocumentId<'_>> {
        DocumentId::parse(&self.family)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{}",
            printable(&self.row),
            printable(&self.family),
            printable(&self.qualifier)
        )
    }
}

fn followed_by_null(bytes: &[u8]) -> Vec<u8> {
    let mut next = Vec::with_capacity(bytes.len() + 1);
    next.extend_from_slice(bytes);
    next.push(0);
    next
}

fn printable(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).replace(NULL_BYTE, "\\x00")
}

/// The `datatype` and `owner` halves of a document family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentId<'a> {
    pub datatype: &'a str,
    pub owner: &'a str,
}

impl<'a> DocumentId<'a> {
    /// Parse a `datatype\0owner` byte string.
    pub fn parse(family: &'a [u8]) -> Result<Self> {
        let split = family.iter().position(|b| *b == 0).ok_or_else(|| {
            ProximaError::malformed_key(format!(
                "expected `datatype\\0uid` but found `{}`",
                printable(family)
            ))
        })?;
        let datatype = std::str::from_utf8(&family[..split])
            .map_err(|e| ProximaError::malformed_key(format!("datatype is not UTF-8: {e}")))?;
        let owner = std::str::from_utf8(&family[split + 1..])
            .map_err(|e| ProximaError::malformed_key(format!("uid is not UTF-8: {e}")))?;
        Ok(DocumentId { datatype, owner })
    }
}

/// `value\0field`
pub fn value_field(value: &str, field: &str) -> String {
    let mut out = String::with_capacity(value.len() + field.len() + 1);
    out.push_str(value);
    out.push(NULL_BYTE);
    out.push_str(field);
    out
}

/// `fi\0field`
pub fn field_index_family(field: &str) -> String {
    format!("{FIELD_INDEX_PREFIX}{NULL_BYTE}{field}")
}

/// `value\0datatype\0owner`
pub fn field_index_qualifier(value: &str, datatype: &str, owner: &str) -> String {
    format!("{value}{NULL_BYTE}{datatype}{NULL_BYTE}{owner}")
}

/// Split a field-index qualifier `value\0datatype\0owner` into `(datatype, owner)`.
///
/// The value itself is known to the caller and not returned.
pub fn parse_field_index_qualifier(qualifier: &[u8]) -> Result<(&str, &str)> {
    let text = std::str::from_utf8(qualifier)
        .map_err(|e| ProximaError::malformed_key(format!("field index qualifier: {e}")))?;
    let mut parts = text.splitn(3, NULL_BYTE);
    let _value = parts.next();
    match (parts.next(), parts.next()) {
        (Some(datatype), Some(owner)) => Ok((datatype, owner)),
        _ => Err(ProximaError::malformed_key(format!(
            "expected `value\\0datatype\\0uid` but found `{}`",
            printable(qualifier)
        ))),
    }
}

/// True when `owner` is `parent` itself or one of its `.`-separated descendants.
pub fn is_same_or_child_owner(owner: &str, parent: &str) -> bool {
    match owner.strip_prefix(parent) {
        Some("") => true,
        Some(rest) => rest.starts_with(CHILD_SEPARATOR),
        None => false,
    }
}

/// A range of keys with optional, individually inclusive or exclusive bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Range {
    start: Option<Key>,
    start_inclusive: bool,
    end: Option<Key>,
    end_inclusive: bool,
}

impl Range {
    /// A range over every key.
    pub fn all() -> Self {
        Range::default()
    }

    pub fn new(start: Option<Key>, start_inclusive: bool, end: Option<Key>, end_inclusive: bool) -> Self {
        Range {
            start,
            start_inclusive,
            end,
            end_inclusive,
        }
    }

    /// `[start, end)`
    pub fn half_open(start: Key, end: Key) -> Self {
        Range::new(Some(start), true, Some(end), false)
    }

    /// `[start, end]`
    pub fn closed(start: Key, end: Key) -> Self {
        Range::new(Some(start), true, Some(end), true)
    }

    /// Every key sharing `key`'s components up to `part`.
    pub fn exact(key: &Key, part: PartialKey) -> Self {
        let start = match part {
            PartialKey::Row => Key::new(key.row.clone(), Vec::new(), Vec::new()),
            PartialKey::RowFamily => Key::with_family(key.row.clone(), key.family.clone()),
            PartialKey::RowFamilyQualifier => key.clone(),
        };
        Range::half_open(start, key.following_key(part))
    }

    /// The same upper bound with a new inclusive lower bound.
    pub fn with_start(&self, start: Key) -> Range {
        Range {
            start: Some(start),
            start_inclusive: true,
            end: self.end.clone(),
            end_inclusive: self.end_inclusive,
        }
    }

    /// True when `key` sorts before the lower bound.
    pub fn before_start(&self, key: &Key) -> bool {
        match &self.start {
            None => false,
            Some(start) if self.start_inclusive => key < start,
            Some(start) => key <= start,
        }
    }

    /// True when `key` sorts after the upper bound.
    pub fn after_end(&self, key: &Key) -> bool {
        match &self.end {
            None => false,
            Some(end) if self.end_inclusive => key > end,
            Some(end) => key >= end,
        }
    }

    pub fn contains(&self, key: &Key) -> bool {
        !self.before_start(key) && !self.after_end(key)
    }
}
