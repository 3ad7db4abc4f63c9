//! # Proxima
//!
//! Proximity and phrase hit resolution over sorted, sharded term indexes.
//!
//! Given a boolean query containing `within`, `adjacent` and `phrase`
//! functions and a candidate document that already matched the rest of the
//! query, Proxima computes exactly which field/value occurrences satisfy the
//! proximity functions.
//!
//! ## Features
//!
//! - Skip-scan iteration restricted to a finite candidate set
//! - Bounded field-index lookups for negated functions
//! - Top-level documents with child records
//! - Parallel batch evaluation
//!
//! ## Example
//!
//! ```
//! use proxima::{Document, EngineConfig, FieldValueMap, Key, SearchSpaceEngine, attribute_key};
//!
//! let engine = SearchSpaceEngine::from_query_str(
//!     "content:within(TEXT, 3, termOffsetMap, 'quick', 'fox')",
//!     &FieldValueMap::new(),
//!     EngineConfig::default(),
//! )
//! .unwrap();
//!
//! let doc = Document::new()
//!     .add_text("TEXT", "quick", attribute_key("shard", "datatype", "uid0", "TEXT", "quick"))
//!     .add_text("TEXT", "fox", attribute_key("shard", "datatype", "uid0", "TEXT", "fox"));
//!
//! let hits = engine.evaluate(&Key::with_family("shard", "datatype\0uid0"), &doc).unwrap();
//! assert_eq!(hits.len(), 2);
//! ```
mod data;
mod engine;
mod error;
pub mod iterator;
pub mod key;
pub mod proximity;
pub mod query;
pub mod search_space;
pub mod store;

// Re-exports for the public API
pub use data::{Attribute, AttributeSource, AttributeValue, Document, TypedValue, attribute_key};
pub use engine::config::{AggregationMode, EngineConfig, EngineConfigBuilder, FunctionConfig};
pub use engine::{Hit, SearchSpaceEngine};
pub use error::{ProximaError, Result};
pub use iterator::{BoundedLookupIterator, SkipScanIterator, SortedKeyValueIterator, SortedListIterator};
pub use key::{Key, PartialKey, Range};
pub use proximity::{FieldValueMap, FunctionDescriptor, FunctionSearchSpace, ProximityFunctionParser, ProximityKind};
pub use query::{QueryParser, QueryTree};
pub use search_space::SearchSpaceSet;
pub use store::MemoryIndex;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
