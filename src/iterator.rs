//! Pull iterators over sorted index entries.
//!
//! Every iterator in the crate implements [`SortedKeyValueIterator`]. Sources are
//! stacked: a [`SkipScanIterator`] or [`BoundedLookupIterator`] wraps another
//! iterator (usually a [`SortedListIterator`] or a store-provided one) and
//! narrows what it returns.

use std::fmt::Debug;

use crate::error::Result;
use crate::key::Key;
use crate::key::Range;

pub mod bounded;
pub mod skip_scan;
pub mod sorted_list;

pub use bounded::BoundedLookupIterator;
pub use skip_scan::SkipScanIterator;
pub use sorted_list::SortedListIterator;

/// Trait for sorted key/value iterators.
///
/// A freshly created or deep-copied iterator has no top entry until it is seeked.
pub trait SortedKeyValueIterator: Send + Sync + Debug {
    /// Position at the first entry inside `range` that passes the family filter.
    ///
    /// With `inclusive` only the listed families are returned; otherwise every
    /// family except the listed ones. An empty exclusive list returns all families.
    fn seek(&mut self, range: &Range, families: &[Vec<u8>], inclusive: bool) -> Result<()>;

    /// Advance to the next entry. Does nothing once the iterator is exhausted.
    fn next(&mut self) -> Result<()>;

    /// Whether a current entry exists.
    fn has_top(&self) -> bool;

    fn top_key(&self) -> Option<&Key>;

    fn top_value(&self) -> Option<&[u8]>;

    /// An independent, unpositioned iterator over the same data.
    fn deep_copy(&self) -> Box<dyn SortedKeyValueIterator>;
}

/// Whether `family` passes a seek's family filter.
pub fn family_selected(families: &[Vec<u8>], inclusive: bool, family: &[u8]) -> bool {
    let listed = families.iter().any(|f| f.as_slice() == family);
    if inclusive { listed } else { !listed }
}

/// Drain an iterator from its current position, collecting keys and values.
pub fn collect_entries(iter: &mut dyn SortedKeyValueIterator) -> Result<Vec<(Key, Vec<u8>)>> {
    let mut entries = Vec::new();
    while let (Some(key), Some(value)) = (iter.top_key(), iter.top_value()) {
        entries.push((key.clone(), value.to_vec()));
        iter.next()?;
    }
    Ok(entries)
}
