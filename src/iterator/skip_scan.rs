//! Skip-scan over a finite set of candidate qualifiers.
//!
//! Instead of visiting every entry of a range, the iterator jumps from one
//! candidate qualifier to the next. Each miss costs one re-seek of the source,
//! so a scan costs at most one seek per candidate and row/family boundary.

use std::sync::Arc;

use log::trace;

use crate::error::Result;
use crate::iterator::SortedKeyValueIterator;
use crate::key::{Key, PartialKey, Range, TERM_FREQUENCY_FAMILY};
use crate::search_space::SearchSpaceSet;

/// Returns exactly the entries of the seek range whose qualifier is in the search space.
///
/// The source is always seeked with this iterator's own family filter
/// (the term-frequency family unless overridden), whatever the caller passes.
///
/// Running out of candidates in one row does not end the scan: it continues
/// at the next row and family, and only ends past the seek range.
#[derive(Debug)]
pub struct SkipScanIterator {
    source: Box<dyn SortedKeyValueIterator>,
    search_space: Arc<SearchSpaceSet>,
    families: Vec<Vec<u8>>,
    range: Range,
    exhausted: bool,
    reseeks: usize,
}

impl SkipScanIterator {
    pub fn new(source: Box<dyn SortedKeyValueIterator>, search_space: Arc<SearchSpaceSet>) -> Self {
        SkipScanIterator {
            source,
            search_space,
            families: vec![TERM_FREQUENCY_FAMILY.as_bytes().to_vec()],
            range: Range::all(),
            exhausted: true,
            reseeks: 0,
        }
    }

    /// Scan `family` instead of the term-frequency family.
    pub fn with_family(mut self, family: impl Into<Vec<u8>>) -> Self {
        self.families = vec![family.into()];
        self
    }

    pub fn search_space(&self) -> &SearchSpaceSet {
        &self.search_space
    }

    /// Source re-seeks performed since the last [`seek`](SortedKeyValueIterator::seek).
    pub fn reseeks(&self) -> usize {
        self.reseeks
    }

    fn find_top(&mut self) -> Result<()> {
        loop {
            let next_start = match self.source.top_key() {
                None => return Ok(()),
                Some(key) if self.range.after_end(key) => {
                    self.exhausted = true;
                    return Ok(());
                }
                Some(key) if self.search_space.contains(key.qualifier()) => return Ok(()),
                Some(key) => match self.search_space.successor(key.qualifier()) {
                    Some(candidate) => key.with_qualifier(candidate),
                    None => key.following_key(PartialKey::RowFamily),
                },
            };

            if self.range.after_end(&next_start) {
                self.exhausted = true;
                return Ok(());
            }

            trace!("skip-scan re-seek to {next_start}");
            self.reseeks += 1;
            let range = self.range.with_start(next_start);
            self.source.seek(&range, &self.families, true)?;
        }
    }

    fn current(&self) -> Option<&Key> {
        if self.exhausted { None } else { self.source.top_key() }
    }
}

impl SortedKeyValueIterator for SkipScanIterator {
    fn seek(&mut self, range: &Range, _families: &[Vec<u8>], _inclusive: bool) -> Result<()> {
        self.range = range.clone();
        self.reseeks = 0;
        self.exhausted = self.search_space.is_empty();
        if self.exhausted {
            return Ok(());
        }
        self.source.seek(range, &self.families, true)?;
        self.find_top()
    }

    fn next(&mut self) -> Result<()> {
        if self.has_top() {
            self.source.next()?;
            self.find_top()?;
        }
        Ok(())
    }

    fn has_top(&self) -> bool {
        self.current().is_some()
    }

    fn top_key(&self) -> Option<&Key> {
        self.current()
    }

    fn top_value(&self) -> Option<&[u8]> {
        if self.has_top() { self.source.top_value() } else { None }
    }

    fn deep_copy(&self) -> Box<dyn SortedKeyValueIterator> {
        Box::new(SkipScanIterator {
            source: self.source.deep_copy(),
            search_space: Arc::clone(&self.search_space),
            families: self.families.clone(),
            range: Range::all(),
            exhausted: true,
            reseeks: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterator::{SortedListIterator, collect_entries};

    fn tf(row: &str, qualifier: &str) -> (Key, Vec<u8>) {
        (Key::new(row, "tf", qualifier), qualifier.as_bytes().to_vec())
    }

    fn source() -> Box<dyn SortedKeyValueIterator> {
        Box::new(SortedListIterator::from_entries(vec![
            tf("row", "datatype\0uid0\0brown\0TEXT"),
            tf("row", "datatype\0uid0\0fox\0TEXT"),
            tf("row", "datatype\0uid0\0jumps\0TEXT"),
            tf("row", "datatype\0uid0\0quick\0TEXT"),
            tf("row", "datatype\0uid1\0fox\0TEXT"),
            (Key::new("row", "fi\0TEXT", "fox\0datatype\0uid0"), Vec::new()),
            tf("row2", "datatype\0uid0\0fox\0TEXT"),
        ]))
    }

    fn qualifiers(iter: &mut dyn SortedKeyValueIterator) -> Vec<String> {
        collect_entries(iter)
            .unwrap()
            .into_iter()
            .map(|(k, _)| String::from_utf8(k.qualifier().to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn test_only_candidates_returned() {
        let space: SearchSpaceSet = ["datatype\0uid0\0fox\0TEXT", "datatype\0uid0\0quick\0TEXT"]
            .into_iter()
            .collect();
        let mut iter = SkipScanIterator::new(source(), Arc::new(space));
        let range = Range::exact(&Key::with_family("row", "tf"), PartialKey::RowFamily);
        iter.seek(&range, &[], false).unwrap();

        assert_eq!(
            qualifiers(&mut iter),
            vec!["datatype\0uid0\0fox\0TEXT", "datatype\0uid0\0quick\0TEXT"]
        );
    }

    #[test]
    fn test_empty_search_space_exhausts() {
        let mut iter = SkipScanIterator::new(source(), Arc::new(SearchSpaceSet::new()));
        iter.seek(&Range::all(), &[], false).unwrap();
        assert!(!iter.has_top());
        assert_eq!(iter.reseeks(), 0);
    }

    #[test]
    fn test_no_successor_moves_to_next_row() {
        let space: SearchSpaceSet = ["datatype\0uid0\0brown\0TEXT"].into_iter().collect();
        let mut iter = SkipScanIterator::new(source(), Arc::new(space));
        iter.seek(&Range::all(), &[], false).unwrap();

        let entries = collect_entries(&mut iter).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.row(), b"row");
    }

    #[test]
    fn test_candidates_across_rows() {
        let space: SearchSpaceSet = ["datatype\0uid0\0fox\0TEXT"].into_iter().collect();
        let mut iter = SkipScanIterator::new(source(), Arc::new(space));
        iter.seek(&Range::all(), &[], false).unwrap();

        let rows: Vec<Vec<u8>> = collect_entries(&mut iter)
            .unwrap()
            .into_iter()
            .map(|(k, _)| k.row().to_vec())
            .collect();
        assert_eq!(rows, vec![b"row".to_vec(), b"row2".to_vec()]);
    }

    #[test]
    fn test_range_end_is_respected() {
        let space: SearchSpaceSet = ["datatype\0uid0\0brown\0TEXT", "datatype\0uid1\0fox\0TEXT"]
            .into_iter()
            .collect();
        let mut iter = SkipScanIterator::new(source(), Arc::new(space));
        let range = Range::closed(
            Key::new("row", "tf", "datatype\0uid0\0brown\0TEXT"),
            Key::new("row", "tf", "datatype\0uid0\0quick\0TEXT"),
        );
        iter.seek(&range, &[], false).unwrap();
        assert_eq!(qualifiers(&mut iter), vec!["datatype\0uid0\0brown\0TEXT"]);
    }

    #[test]
    fn test_deep_copy_shares_search_space() {
        let space: SearchSpaceSet = ["datatype\0uid0\0fox\0TEXT"].into_iter().collect();
        let iter = SkipScanIterator::new(source(), Arc::new(space));
        let mut copy = iter.deep_copy();
        assert!(!copy.has_top());
        copy.seek(&Range::all(), &[], false).unwrap();
        assert!(copy.has_top());
    }
}
