//! The candidate set a skip-scan is restricted to.

use std::collections::BTreeSet;
use std::ops::Bound;

use serde::{Deserialize, Serialize};

/// An ordered, immutable set of byte strings.
///
/// Members are either `value\0field` pairs (the global search space of a query) or
/// full `datatype\0owner\0value\0field` hit qualifiers (term-frequency fetches).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSpaceSet {
    members: BTreeSet<Vec<u8>>,
}

impl SearchSpaceSet {
    pub fn new() -> Self {
        SearchSpaceSet::default()
    }

    pub fn insert<M: Into<Vec<u8>>>(&mut self, member: M) -> bool {
        self.members.insert(member.into())
    }

    pub fn contains(&self, member: &[u8]) -> bool {
        self.members.contains(member)
    }

    /// The smallest member strictly greater than `member`.
    pub fn successor(&self, member: &[u8]) -> Option<&[u8]> {
        self.members
            .range::<[u8], _>((Bound::Excluded(member), Bound::Unbounded))
            .next()
            .map(Vec::as_slice)
    }

    pub fn first(&self) -> Option<&[u8]> {
        self.members.first().map(Vec::as_slice)
    }

    pub fn last(&self) -> Option<&[u8]> {
        self.members.last().map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<M: Into<Vec<u8>>> FromIterator<M> for SearchSpaceSet {
    fn from_iter<I: IntoIterator<Item = M>>(iter: I) -> Self {
        SearchSpaceSet {
            members: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<M: Into<Vec<u8>>> Extend<M> for SearchSpaceSet {
    fn extend<I: IntoIterator<Item = M>>(&mut self, iter: I) {
        self.members.extend(iter.into_iter().map(Into::into));
    }
}
