//! Proximity functions: `within`, `adjacent` and `phrase`.
//!
//! [`ProximityFunctionParser`] extracts every proximity function call from a
//! [`QueryTree`](crate::query::QueryTree) and reduces the calls to a
//! [`FunctionSearchSpace`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod descriptor;
pub mod parser;

pub use descriptor::{FunctionDescriptor, FunctionSearchSpace};
pub use parser::ProximityFunctionParser;

/// Field to values map used to recover fields a function call omits.
pub type FieldValueMap = BTreeMap<String, BTreeSet<String>>;

/// The proximity function variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProximityKind {
    /// `within(field, distance, termOffsetMap, terms...)`
    Within,
    /// `adjacent(field, termOffsetMap, terms...)`
    Adjacent,
    /// `phrase(field, termOffsetMap, terms...)`
    Phrase,
}

impl ProximityKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "within" => Some(ProximityKind::Within),
            "adjacent" => Some(ProximityKind::Adjacent),
            "phrase" => Some(ProximityKind::Phrase),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProximityKind::Within => "within",
            ProximityKind::Adjacent => "adjacent",
            ProximityKind::Phrase => "phrase",
        }
    }

    /// Index of the first term argument when the field argument is present.
    pub fn value_offset(&self) -> usize {
        match self {
            ProximityKind::Within => 3,
            ProximityKind::Adjacent | ProximityKind::Phrase => 2,
        }
    }
}

impl fmt::Display for ProximityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
