//! Field-index lookups for negated proximity functions.
//!
//! Terms of a negated function are never aggregated into the candidate
//! document, so in top-level-document mode they are fetched from the field
//! index and assembled into a pseudo-document. A [`NegatedLookup`] lives for a
//! single evaluation; its iterator and caches are dropped with it.

use std::time::Instant;

use ahash::{AHashMap, AHashSet};
use log::{debug, trace};

use crate::data::{Attribute, AttributeValue, Document};
use crate::error::Result;
use crate::iterator::{BoundedLookupIterator, SortedKeyValueIterator};
use crate::key::{
    DocumentId, Key, MAX_UNICODE, NULL_BYTE, PartialKey, Range, field_index_family, field_index_qualifier,
    is_same_or_child_owner, parse_field_index_qualifier,
};
use crate::proximity::FunctionSearchSpace;

pub(crate) struct NegatedLookup<'a> {
    prototype: &'a dyn SortedKeyValueIterator,
    iter: Option<BoundedLookupIterator>,
    row: &'a [u8],
    document: DocumentId<'a>,
    include_children: bool,
    /// field -> values that returned entries
    fetched: AHashMap<String, AHashSet<String>>,
    /// field -> values with no entries
    missed: AHashMap<String, AHashSet<String>>,
}

impl<'a> NegatedLookup<'a> {
    pub(crate) fn new(
        prototype: &'a dyn SortedKeyValueIterator,
        row: &'a [u8],
        document: DocumentId<'a>,
        include_children: bool,
    ) -> Self {
        NegatedLookup {
            prototype,
            iter: None,
            row,
            document,
            include_children,
            fetched: AHashMap::new(),
            missed: AHashMap::new(),
        }
    }

    /// Fetch the terms of every negated function into a pseudo-document.
    pub(crate) fn build(mut self, space: &FunctionSearchSpace) -> Result<Document> {
        let start = Instant::now();
        let mut doc = Document::new();

        for descriptor in space.negated() {
            for field in &descriptor.fields {
                // One missing term already fails the function in this field.
                let missed = self.missed.get(field.as_str()).is_some_and(|missed| {
                    descriptor.values.iter().any(|value| missed.contains(value.as_str()))
                });
                if missed {
                    continue;
                }

                for value in &descriptor.values {
                    if self.fetched.get(field.as_str()).is_some_and(|f| f.contains(value.as_str())) {
                        continue;
                    }
                    if self.fetch(&mut doc, field, value)? {
                        self.fetched.entry(field.clone()).or_default().insert(value.clone());
                    } else {
                        self.missed.entry(field.clone()).or_default().insert(value.clone());
                        break;
                    }
                }
            }
        }

        debug!(
            "built negated document for {}/{} in {:?} ({} fields)",
            self.document.datatype,
            self.document.owner,
            start.elapsed(),
            doc.len()
        );
        Ok(doc)
    }

    /// `row : fi\0field : value\0datatype\0owner` up to the owner itself, or
    /// through all of its children.
    fn seek_range(&self, field: &str, value: &str) -> Range {
        let family = field_index_family(field);
        let qualifier = field_index_qualifier(value, self.document.datatype, self.document.owner);
        let start = Key::new(self.row, family.clone(), qualifier.clone());
        let end = if self.include_children {
            Key::new(self.row, family, format!("{qualifier}{MAX_UNICODE}"))
        } else {
            start.following_key(PartialKey::RowFamilyQualifier)
        };
        Range::half_open(start, end)
    }

    fn fetch(&mut self, doc: &mut Document, field: &str, value: &str) -> Result<bool> {
        let range = self.seek_range(field, value);
        let families = [field_index_family(field).into_bytes()];
        let prototype = self.prototype;
        let iter = self
            .iter
            .get_or_insert_with(|| BoundedLookupIterator::new(prototype.deep_copy()));
        iter.seek(&range, &families, true)?;

        let mut fetched = 0usize;
        while let Some(key) = iter.top_key() {
            let (datatype, owner) = parse_field_index_qualifier(key.qualifier())?;
            if is_same_or_child_owner(owner, self.document.owner) {
                let metadata = Key::new(
                    self.row,
                    format!("{datatype}{NULL_BYTE}{owner}"),
                    format!("{field}{NULL_BYTE}{value}"),
                );
                doc.put(field, Attribute::new(AttributeValue::Text(value.to_string()), metadata));
                fetched += 1;
            } else {
                trace!("ignoring field index entry of unrelated owner {owner}");
            }
            iter.next()?;
        }
        Ok(fetched > 0)
    }
}
