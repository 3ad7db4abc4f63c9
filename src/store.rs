//! In-memory sorted index.
//!
//! [`MemoryIndex`] accumulates entries and hands out immutable snapshots that
//! iterators read without holding any lock.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::iterator::SortedListIterator;
use crate::key::{Key, NULL_BYTE, TERM_FREQUENCY_FAMILY, field_index_family, field_index_qualifier};

/// A mutable, thread-safe sorted map of index entries.
///
/// Writers take the write lock; [`snapshot`](Self::snapshot) copies the entries
/// out under the read lock so later writes never affect an open iterator.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    entries: RwLock<BTreeMap<Key, Vec<u8>>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry.
    pub fn insert(&self, key: Key, value: impl Into<Vec<u8>>) {
        self.entries.write().insert(key, value.into());
    }

    /// Record a field-index entry `row : fi\0field : value\0datatype\0owner`.
    pub fn insert_field_index(&self, row: &str, field: &str, value: &str, datatype: &str, owner: &str) {
        self.insert(
            Key::new(row, field_index_family(field), field_index_qualifier(value, datatype, owner)),
            Vec::new(),
        );
    }

    /// Record a term-frequency entry `row : tf : datatype\0owner\0value\0field`.
    pub fn insert_term_frequency(
        &self,
        row: &str,
        datatype: &str,
        owner: &str,
        value: &str,
        field: &str,
        offsets: impl Into<Vec<u8>>,
    ) {
        let qualifier = format!("{datatype}{NULL_BYTE}{owner}{NULL_BYTE}{value}{NULL_BYTE}{field}");
        self.insert(Key::new(row, TERM_FREQUENCY_FAMILY, qualifier), offsets);
    }

    pub fn remove(&self, key: &Key) -> Option<Vec<u8>> {
        self.entries.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// An iterator over the entries as of now.
    pub fn snapshot(&self) -> SortedListIterator {
        let entries: Vec<(Key, Vec<u8>)> = self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        SortedListIterator::new(Arc::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterator::{SortedKeyValueIterator, collect_entries};
    use crate::key::Range;

    #[test]
    fn test_snapshot_is_isolated() {
        let index = MemoryIndex::new();
        index.insert_field_index("row", "TEXT", "fox", "datatype", "uid0");
        let mut snapshot = index.snapshot();

        index.insert_field_index("row", "TEXT", "fox", "datatype", "uid1");
        assert_eq!(index.len(), 2);

        snapshot.seek(&Range::all(), &[], false).unwrap();
        let entries = collect_entries(&mut snapshot).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.qualifier(), b"fox\0datatype\0uid0");
    }

    #[test]
    fn test_term_frequency_layout() {
        let index = MemoryIndex::new();
        index.insert_term_frequency("row", "datatype", "uid0", "fox", "TEXT", vec![3]);
        let key = Key::new("row", "tf", "datatype\0uid0\0fox\0TEXT");
        assert_eq!(index.remove(&key), Some(vec![3]));
        assert!(index.is_empty());
    }
}
