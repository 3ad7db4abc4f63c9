use std::collections::BTreeSet;

use log::debug;

use crate::engine::config::FunctionConfig;
use crate::error::{ProximaError, Result};
use crate::proximity::{FieldValueMap, FunctionDescriptor, FunctionSearchSpace, ProximityKind};
use crate::query::{Literal, NodeId, NodeKind, QueryTree};

/// Extracts proximity function calls from a query tree.
///
/// Argument shapes:
///
/// - `within(field, distance, termOffsetMap, terms...)`
/// - `within(distance, termOffsetMap, terms...)`
/// - `adjacent(field, termOffsetMap, terms...)`, `adjacent(termOffsetMap, terms...)`
/// - `phrase(field, termOffsetMap, terms...)`, `phrase(termOffsetMap, terms...)`
///
/// The field argument may be a disjunction such as `(TEXT_A || TEXT_B)`. When it
/// is omitted, the fields are every field of the fallback map holding at least
/// one of the terms.
#[derive(Debug, Clone)]
pub struct ProximityFunctionParser<'a> {
    config: &'a FunctionConfig,
    fallback: &'a FieldValueMap,
}

impl<'a> ProximityFunctionParser<'a> {
    pub fn new(config: &'a FunctionConfig, fallback: &'a FieldValueMap) -> Self {
        Self { config, fallback }
    }

    /// Parse every proximity function of the configured namespace.
    pub fn parse(&self, tree: &QueryTree) -> Result<FunctionSearchSpace> {
        let mut descriptors = Vec::new();
        for (id, name) in tree.functions(&self.config.namespace) {
            if let Some(kind) = ProximityKind::from_name(name) {
                descriptors.push(self.parse_function(tree, id, kind)?);
            }
        }

        let space = FunctionSearchSpace::from_descriptors(descriptors);
        debug!(
            "parsed {} proximity functions over {} fields ({} field/value pairs, negated: {})",
            space.descriptors().len(),
            space.fields().len(),
            space.search_space().len(),
            space.has_negated()
        );
        Ok(space)
    }

    fn parse_function(&self, tree: &QueryTree, id: NodeId, kind: ProximityKind) -> Result<FunctionDescriptor> {
        let args = tree.children(id);
        let Some(&first) = args.first() else {
            return Err(ProximaError::malformed_query(format!("`{kind}` has no arguments")));
        };

        let field_omitted = self.is_field_omitted(tree, first);
        let offset = if field_omitted {
            kind.value_offset() - 1
        } else {
            kind.value_offset()
        };

        let mut values = BTreeSet::new();
        for &arg in args.iter().skip(offset) {
            for literal in tree.literals_in(arg) {
                match literal {
                    Literal::String(value) => {
                        values.insert(value.clone());
                    }
                    other => {
                        return Err(ProximaError::unsupported_literal(kind.name(), other.to_string()));
                    }
                }
            }
        }
        if values.is_empty() {
            return Err(ProximaError::malformed_query(format!("`{kind}` has no term values")));
        }

        let fields = if field_omitted {
            self.fields_for_values(&values)
        } else {
            let fields: BTreeSet<String> = tree.identifiers_in(first).into_iter().map(str::to_string).collect();
            if fields.is_empty() {
                return Err(ProximaError::malformed_query(format!(
                    "first argument of `{kind}` names no field"
                )));
            }
            fields
        };

        Ok(FunctionDescriptor {
            kind,
            negated: tree.is_negated(id),
            fields,
            values,
        })
    }

    /// A number or the offset placeholder in first position means the field was left out.
    fn is_field_omitted(&self, tree: &QueryTree, first: NodeId) -> bool {
        match tree.kind(first) {
            Some(NodeKind::Literal(Literal::Number(_))) => true,
            Some(NodeKind::Identifier(name)) => *name == self.config.offset_placeholder,
            _ => false,
        }
    }

    fn fields_for_values(&self, values: &BTreeSet<String>) -> BTreeSet<String> {
        self.fallback
            .iter()
            .filter(|(_, field_values)| values.iter().any(|v| field_values.contains(v)))
            .map(|(field, _)| field.clone())
            .collect()
    }
}
