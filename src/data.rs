use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::key::{DocumentId, Key};

/// A normalized, typed attribute value.
///
/// Only the normalized form is ever matched against the index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypedValue {
    pub type_name: String,
    pub original: String,
    pub normalized: String,
}

/// The value of a single attribute.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Text stored exactly as indexed.
    Text(String),

    /// A value with a normalized string representation.
    Typed(TypedValue),
}

impl AttributeValue {
    /// The form of the value that appears in index keys.
    pub fn as_term(&self) -> &str {
        match self {
            AttributeValue::Text(s) => s,
            AttributeValue::Typed(t) => &t.normalized,
        }
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<TypedValue> for AttributeValue {
    fn from(v: TypedValue) -> Self {
        AttributeValue::Typed(v)
    }
}

/// A field value together with the key it was read from.
///
/// The metadata key's family is `datatype\0owner`; the owner identifies the
/// (possibly child) record holding the value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub value: AttributeValue,
    pub metadata: Key,
}

impl Attribute {
    pub fn new(value: impl Into<AttributeValue>, metadata: Key) -> Self {
        Attribute {
            value: value.into(),
            metadata,
        }
    }

    /// The `datatype` and `owner` this attribute belongs to.
    pub fn document_id(&self) -> Result<DocumentId<'_>> {
        self.metadata.document_id()
    }
}

/// Read access to the attributes of an aggregated document.
pub trait AttributeSource {
    /// All attributes recorded for `field`, empty if the field is absent.
    fn for_field(&self, field: &str) -> &[Attribute];
}

/// An aggregated document: every attribute read for a candidate, grouped by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    fields: BTreeMap<String, Vec<Attribute>>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text attribute owned by the record named in `metadata`.
    pub fn add_text(mut self, field: impl Into<String>, text: impl Into<String>, metadata: Key) -> Self {
        self.put(field, Attribute::new(AttributeValue::Text(text.into()), metadata));
        self
    }

    /// Add a typed attribute.
    pub fn add_typed(mut self, field: impl Into<String>, value: TypedValue, metadata: Key) -> Self {
        self.put(field, Attribute::new(value, metadata));
        self
    }

    /// Record an attribute. An identical attribute already present is not duplicated.
    pub fn put(&mut self, field: impl Into<String>, attribute: Attribute) {
        let values = self.fields.entry(field.into()).or_default();
        if !values.contains(&attribute) {
            values.push(attribute);
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl AttributeSource for Document {
    fn for_field(&self, field: &str) -> &[Attribute] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Metadata key of an attribute read from the event record `row : datatype\0owner : field\0value`.
pub fn attribute_key(row: &str, datatype: &str, owner: &str, field: &str, value: &str) -> Key {
    Key::new(row, format!("{datatype}\0{owner}"), format!("{field}\0{value}"))
}
