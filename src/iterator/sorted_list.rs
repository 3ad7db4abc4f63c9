//! An iterator over an in-memory, sorted snapshot of entries.

use std::sync::Arc;

use crate::error::Result;
use crate::iterator::{SortedKeyValueIterator, family_selected};
use crate::key::{Key, Range};

/// Entries of a snapshot, sorted by key with no duplicate keys.
pub type Entries = Arc<Vec<(Key, Vec<u8>)>>;

/// Iterates a shared, immutable snapshot.
///
/// Deep copies share the snapshot and only duplicate the cursor.
#[derive(Debug, Clone)]
pub struct SortedListIterator {
    entries: Entries,
    position: usize,
    range: Range,
    families: Vec<Vec<u8>>,
    inclusive: bool,
}

impl SortedListIterator {
    /// Wrap an already sorted snapshot.
    pub fn new(entries: Entries) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
        let position = entries.len();
        SortedListIterator {
            entries,
            position,
            range: Range::all(),
            families: Vec::new(),
            inclusive: false,
        }
    }

    /// Sort arbitrary entries. A later entry for a key replaces an earlier one.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Key, Vec<u8>)>,
    {
        let mut sorted: Vec<(Key, Vec<u8>)> = entries.into_iter().collect();
        // Stable: equal keys stay in insertion order.
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        let mut deduped: Vec<(Key, Vec<u8>)> = Vec::with_capacity(sorted.len());
        for entry in sorted {
            match deduped.last_mut() {
                Some(last) if last.0 == entry.0 => *last = entry,
                _ => deduped.push(entry),
            }
        }
        SortedListIterator::new(Arc::new(deduped))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn skip_filtered(&mut self) {
        while let Some((key, _)) = self.entries.get(self.position) {
            if self.range.after_end(key) {
                self.position = self.entries.len();
                return;
            }
            if family_selected(&self.families, self.inclusive, key.family()) {
                return;
            }
            self.position += 1;
        }
    }
}

impl SortedKeyValueIterator for SortedListIterator {
    fn seek(&mut self, range: &Range, families: &[Vec<u8>], inclusive: bool) -> Result<()> {
        self.range = range.clone();
        self.families = families.to_vec();
        self.inclusive = inclusive;
        self.position = self.entries.partition_point(|(key, _)| range.before_start(key));
        self.skip_filtered();
        Ok(())
    }

    fn next(&mut self) -> Result<()> {
        if self.position < self.entries.len() {
            self.position += 1;
            self.skip_filtered();
        }
        Ok(())
    }

    fn has_top(&self) -> bool {
        self.position < self.entries.len()
    }

    fn top_key(&self) -> Option<&Key> {
        self.entries.get(self.position).map(|(key, _)| key)
    }

    fn top_value(&self) -> Option<&[u8]> {
        self.entries.get(self.position).map(|(_, value)| value.as_slice())
    }

    fn deep_copy(&self) -> Box<dyn SortedKeyValueIterator> {
        Box::new(SortedListIterator::new(Arc::clone(&self.entries)))
    }
}
