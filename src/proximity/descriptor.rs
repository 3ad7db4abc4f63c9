use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::key::value_field;
use crate::proximity::ProximityKind;
use crate::search_space::SearchSpaceSet;

/// One proximity function call, reduced to what evaluation needs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub kind: ProximityKind,
    /// Whether the call sits under a negation or deferred subtree.
    pub negated: bool,
    /// Alternative fields; the function holds if it holds in any one of them.
    pub fields: BTreeSet<String>,
    /// Term values, never empty.
    pub values: BTreeSet<String>,
}

impl FunctionDescriptor {
    /// The `value\0field` pairs this function requires in `field`.
    pub fn value_fields<'a>(&'a self, field: &'a str) -> impl Iterator<Item = String> + 'a {
        self.values.iter().map(move |value| value_field(value, field))
    }
}

/// Everything proximity evaluation needs from a query, built once per query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSearchSpace {
    descriptors: Vec<FunctionDescriptor>,
    fields: BTreeSet<String>,
    search_space: SearchSpaceSet,
    has_negated: bool,
}

impl FunctionSearchSpace {
    /// Collect descriptors, dropping exact duplicates, and build the unions.
    pub fn from_descriptors<I>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = FunctionDescriptor>,
    {
        let mut space = FunctionSearchSpace::default();
        for descriptor in descriptors {
            if space.descriptors.contains(&descriptor) {
                continue;
            }
            for field in &descriptor.fields {
                space.fields.insert(field.clone());
                space.search_space.extend(descriptor.value_fields(field));
            }
            space.has_negated |= descriptor.negated;
            space.descriptors.push(descriptor);
        }
        space
    }

    pub fn descriptors(&self) -> &[FunctionDescriptor] {
        &self.descriptors
    }

    /// Union of all functions' fields.
    pub fn fields(&self) -> &BTreeSet<String> {
        &self.fields
    }

    /// Union of all functions' `value\0field` pairs.
    pub fn search_space(&self) -> &SearchSpaceSet {
        &self.search_space
    }

    pub fn has_negated(&self) -> bool {
        self.has_negated
    }

    pub fn negated(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.descriptors.iter().filter(|d| d.negated)
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
