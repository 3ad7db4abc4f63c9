use crate::error::Result;
use crate::iterator::SortedKeyValueIterator;
use crate::key::{Key, Range};

/// Walks a source strictly inside the seek range.
///
/// Used for point lookups against the field index. The first entry the source
/// returns outside the range ends the iteration, even if the source would
/// return more.
#[derive(Debug)]
pub struct BoundedLookupIterator {
    source: Box<dyn SortedKeyValueIterator>,
    range: Option<Range>,
}

impl BoundedLookupIterator {
    pub fn new(source: Box<dyn SortedKeyValueIterator>) -> Self {
        BoundedLookupIterator { source, range: None }
    }

    fn current(&self) -> Option<&Key> {
        let range = self.range.as_ref()?;
        self.source.top_key().filter(|key| range.contains(key))
    }
}

impl SortedKeyValueIterator for BoundedLookupIterator {
    fn seek(&mut self, range: &Range, families: &[Vec<u8>], inclusive: bool) -> Result<()> {
        self.range = Some(range.clone());
        self.source.seek(range, families, inclusive)
    }

    fn next(&mut self) -> Result<()> {
        if self.has_top() {
            self.source.next()?;
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
        Box::new(BoundedLookupIterator::new(self.source.deep_copy()))
    }
}
