use ahash::{AHashMap, AHashSet};

use crate::data::AttributeSource;
use crate::error::Result;
use crate::key::value_field;
use crate::search_space::SearchSpaceSet;

/// Per-evaluation record of which `value\0field` pairs occur in a document and who owns them.
#[derive(Debug, Default)]
pub struct DocumentOccurrenceIndex {
    /// field -> {value\0field}
    document_hits: AHashMap<String, AHashSet<String>>,
    /// value\0field -> {owner}
    owners: AHashMap<String, AHashSet<String>>,
}

impl DocumentOccurrenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value\0field` for `field`, owned by `owner`.
    pub fn record(&mut self, field: &str, pair: String, owner: &str) {
        self.owners.entry(pair.clone()).or_default().insert(owner.to_string());
        self.document_hits.entry(field.to_string()).or_default().insert(pair);
    }

    /// Record every attribute of `field` whose pair is in `search_space`.
    pub fn record_attributes(
        &mut self,
        field: &str,
        source: &dyn AttributeSource,
        search_space: &SearchSpaceSet,
    ) -> Result<()> {
        for attribute in source.for_field(field) {
            let pair = value_field(attribute.value.as_term(), field);
            if search_space.contains(pair.as_bytes()) {
                let id = attribute.document_id()?;
                self.record(field, pair, id.owner);
            }
        }
        Ok(())
    }

    pub fn contains(&self, field: &str, pair: &str) -> bool {
        self.document_hits.get(field).is_some_and(|pairs| pairs.contains(pair))
    }

    /// Owners holding every one of `pairs`, or `None` as soon as the intersection is empty.
    pub fn common_owners<'a, I>(&self, pairs: I) -> Option<AHashSet<String>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut common: Option<AHashSet<String>> = None;
        for pair in pairs {
            let owners = self.owners.get(pair)?;
            let next: AHashSet<String> = match common {
                None => owners.clone(),
                Some(current) => current.into_iter().filter(|o| owners.contains(o)).collect(),
            };
            if next.is_empty() {
                return None;
            }
            common = Some(next);
        }
        common
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Document, attribute_key};

    fn index() -> DocumentOccurrenceIndex {
        let mut index = DocumentOccurrenceIndex::new();
        index.record("TEXT", "brown\0TEXT".to_string(), "uid0");
        index.record("TEXT", "brown\0TEXT".to_string(), "uid1");
        index.record("TEXT", "fox\0TEXT".to_string(), "uid1");
        index.record("TEXT", "fox\0TEXT".to_string(), "uid2");
        index
    }

    #[test]
    fn test_common_owners() {
        let index = index();
        let owners = index.common_owners(["brown\0TEXT", "fox\0TEXT"]).unwrap();
        assert_eq!(owners.len(), 1);
        assert!(owners.contains("uid1"));
    }

    #[test]
    fn test_common_owners_order_independent() {
        let index = index();
        let sorted = |owners: Option<AHashSet<String>>| {
            let mut owners: Vec<String> = owners.unwrap_or_default().into_iter().collect();
            owners.sort();
            owners
        };
        assert_eq!(
            sorted(index.common_owners(["brown\0TEXT", "fox\0TEXT"])),
            sorted(index.common_owners(["fox\0TEXT", "brown\0TEXT"]))
        );
    }

    #[test]
    fn test_common_owners_short_circuits() {
        let mut index = index();
        index.record("TEXT", "dog\0TEXT".to_string(), "uid9");
        assert!(index.common_owners(["brown\0TEXT", "dog\0TEXT", "fox\0TEXT"]).is_none());
        assert!(index.common_owners(["missing\0TEXT"]).is_none());
    }

    #[test]
    fn test_record_attributes_filters_by_search_space() {
        let doc = Document::new()
            .add_text("TEXT", "quick", attribute_key("row", "datatype", "uid0", "TEXT", "quick"))
            .add_text("TEXT", "lazy", attribute_key("row", "datatype", "uid0", "TEXT", "lazy"));
        let space: SearchSpaceSet = ["quick\0TEXT"].into_iter().collect();

        let mut index = DocumentOccurrenceIndex::new();
        index.record_attributes("TEXT", &doc, &space).unwrap();
        assert!(index.contains("TEXT", "quick\0TEXT"));
        assert!(!index.contains("TEXT", "lazy\0TEXT"));
        assert!(!index.contains("BODY", "quick\0TEXT"));
    }
}
