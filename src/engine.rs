//! Per-document proximity hit evaluation.
//!
//! A [`SearchSpaceEngine`] is built once per query. For every candidate
//! document it computes the exact set of [`Hit`]s satisfying at least one
//! proximity function in full:
//!
//! 1. terms of negated functions are recorded (event mode) or fetched from the
//!    field index (top-level-document mode);
//! 2. every attribute of a function field whose `value\0field` pair is in the
//!    query's search space is recorded together with its owner;
//! 3. for each function and each of its fields, the owners of all required
//!    pairs are intersected; a non-empty intersection emits one hit per owner
//!    and pair.

pub mod config;
pub mod hit;
pub mod negated;
pub mod occurrence;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, warn};
use rayon::prelude::*;

use crate::data::{AttributeSource, Document};
use crate::error::{ProximaError, Result};
use crate::iterator::{SkipScanIterator, SortedKeyValueIterator};
use crate::key::{DocumentId, Key, Range, is_same_or_child_owner};
use crate::proximity::{FieldValueMap, FunctionSearchSpace, ProximityFunctionParser};
use crate::query::QueryTree;
use crate::search_space::SearchSpaceSet;

use self::config::{AggregationMode, EngineConfig};
use self::negated::NegatedLookup;
use self::occurrence::DocumentOccurrenceIndex;

pub use self::hit::Hit;

/// Evaluates proximity functions against candidate documents.
///
/// The parsed search space is immutable and shared by all copies of an engine.
/// The optional source is the raw index, used for negated-term lookups and
/// term-frequency fetches; copies each get their own deep copy of it.
#[derive(Debug)]
pub struct SearchSpaceEngine {
    search_space: Arc<FunctionSearchSpace>,
    config: EngineConfig,
    source: Option<Box<dyn SortedKeyValueIterator>>,
}

impl SearchSpaceEngine {
    /// Create an engine over an already parsed search space.
    pub fn new(search_space: FunctionSearchSpace, config: EngineConfig) -> Self {
        Self {
            search_space: Arc::new(search_space),
            config,
            source: None,
        }
    }

    /// Parse the proximity functions of `tree` and create an engine for them.
    ///
    /// `fallback` maps fields to the values they hold and resolves calls that
    /// omit their field argument.
    pub fn from_query(tree: &QueryTree, fallback: &FieldValueMap, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let space = ProximityFunctionParser::new(&config.functions, fallback).parse(tree)?;
        if space.has_negated() && config.is_top_level_document() {
            debug!("negated proximity functions will be resolved against the field index");
        }
        Ok(Self::new(space, config))
    }

    /// Parse query text and create an engine for its proximity functions.
    pub fn from_query_str(query: &str, fallback: &FieldValueMap, config: EngineConfig) -> Result<Self> {
        let tree = crate::query::parse(query)?;
        Self::from_query(&tree, fallback, config)
    }

    /// Attach the raw index holding field-index and term-frequency entries.
    pub fn with_source(mut self, source: Box<dyn SortedKeyValueIterator>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn search_space(&self) -> &FunctionSearchSpace {
        &self.search_space
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// An independent engine sharing this one's search space.
    pub fn deep_copy(&self) -> Self {
        Self {
            search_space: Arc::clone(&self.search_space),
            config: self.config.clone(),
            source: self.source.as_ref().map(|s| s.deep_copy()),
        }
    }

    /// Compute the hits of one document.
    ///
    /// `document_key` is `row : datatype\0uid`. Failed negated-term lookups are
    /// logged and leave the negated terms out; they do not fail the evaluation.
    pub fn evaluate(&self, document_key: &Key, document: &dyn AttributeSource) -> Result<BTreeSet<Hit>> {
        let start = Instant::now();
        let id = document_key.document_id()?;
        let space = self.search_space.search_space();
        let mut occurrences = DocumentOccurrenceIndex::new();

        let negated_document = if self.search_space.has_negated() {
            match self.config.aggregation {
                AggregationMode::Event => {
                    self.record_negated_terms(&id, &mut occurrences);
                    None
                }
                AggregationMode::TopLevelDocument => self.negated_document(document_key, &id),
            }
        } else {
            None
        };

        for field in self.search_space.fields() {
            occurrences.record_attributes(field, document, space)?;
            if let Some(negated) = &negated_document {
                occurrences.record_attributes(field, negated, space)?;
            }
        }

        let hits = self.collect_hits(&id, &occurrences);
        debug!(
            "evaluated {}/{} in {:?}: {} hits",
            id.datatype,
            id.owner,
            start.elapsed(),
            hits.len()
        );
        Ok(hits)
    }

    /// Evaluate many documents in parallel.
    ///
    /// Each worker evaluates with its own deep copy of the engine. Results are in
    /// input order.
    pub fn evaluate_all<D>(&self, documents: &[(Key, D)]) -> Vec<Result<BTreeSet<Hit>>>
    where
        D: AttributeSource + Sync,
    {
        documents
            .par_iter()
            .map_init(|| self.deep_copy(), |engine, (key, doc)| engine.evaluate(key, doc))
            .collect()
    }

    /// Fetch the term-frequency entries of `hits` for the document at `document_key`.
    ///
    /// The hits are the skip-scan search space, so only their entries are read.
    /// Every hit must belong to the document or one of its children.
    pub fn term_frequencies(&self, document_key: &Key, hits: &BTreeSet<Hit>) -> Result<BTreeMap<Hit, Vec<u8>>> {
        let mut frequencies = BTreeMap::new();
        let (Some(first), Some(last)) = (hits.first(), hits.last()) else {
            return Ok(frequencies);
        };
        let id = document_key.document_id()?;
        if let Some(foreign) = hits
            .iter()
            .find(|hit| hit.datatype() != id.datatype || !is_same_or_child_owner(hit.owner(), id.owner))
        {
            return Err(ProximaError::invalid_argument(format!(
                "hit {foreign} does not belong to {}/{}",
                id.datatype, id.owner
            )));
        }
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| ProximaError::invalid_config("term frequency lookups need a source"))?;

        let family = self.config.term_frequency_family.as_str();
        let row = document_key.row();
        let range = Range::closed(
            Key::new(row, family, first.as_bytes()),
            Key::new(row, family, last.as_bytes()),
        );
        let candidates: SearchSpaceSet = hits.iter().map(Hit::as_bytes).collect();
        let mut iter = SkipScanIterator::new(source.deep_copy(), Arc::new(candidates)).with_family(family);
        iter.seek(&range, &[], true)?;

        while let (Some(key), Some(value)) = (iter.top_key(), iter.top_value()) {
            frequencies.insert(Hit::parse(key.qualifier())?, value.to_vec());
            iter.next()?;
        }
        debug!("fetched {} of {} term frequency entries", frequencies.len(), hits.len());
        Ok(frequencies)
    }

    /// Event mode: the single owner is known, so negated terms are recorded as present.
    fn record_negated_terms(&self, id: &DocumentId<'_>, occurrences: &mut DocumentOccurrenceIndex) {
        let space = self.search_space.search_space();
        for descriptor in self.search_space.negated() {
            for field in &descriptor.fields {
                for pair in descriptor.value_fields(field) {
                    if space.contains(pair.as_bytes()) {
                        occurrences.record(field, pair, id.owner);
                    }
                }
            }
        }
    }

    fn negated_document(&self, document_key: &Key, id: &DocumentId<'_>) -> Option<Document> {
        let Some(source) = self.source.as_deref() else {
            warn!(
                "no field index source configured; negated proximity functions for {}/{} are skipped",
                id.datatype, id.owner
            );
            return None;
        };

        match NegatedLookup::new(source, document_key.row(), *id, true).build(&self.search_space) {
            Ok(document) => Some(document),
            Err(e) => {
                error!("failed to build negated document for {document_key}: {e}");
                None
            }
        }
    }

    fn collect_hits(&self, id: &DocumentId<'_>, occurrences: &DocumentOccurrenceIndex) -> BTreeSet<Hit> {
        let mut hits = BTreeSet::new();
        for descriptor in self.search_space.descriptors() {
            for field in &descriptor.fields {
                let pairs: Vec<String> = descriptor.value_fields(field).collect();
                if !pairs.iter().all(|pair| occurrences.contains(field, pair)) {
                    continue;
                }
                let Some(owners) = occurrences.common_owners(pairs.iter().map(String::as_str)) else {
                    continue;
                };
                for owner in &owners {
                    for pair in &pairs {
                        hits.insert(Hit::from_value_field(id.datatype, owner, pair));
                    }
                }
            }
        }
        hits
    }
}
