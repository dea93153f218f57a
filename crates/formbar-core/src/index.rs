//! Dependency index: field name to the conditionals whose expression
//! references it.

use std::collections::BTreeMap;

use serde::Serialize;

use formbar_model::{ConditionalId, ConditionalRecord};

use crate::expr::referenced_fields;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyIndex {
    by_field: BTreeMap<String, Vec<ConditionalId>>,
}

impl DependencyIndex {
    /// Index `conditionals`. Each field maps to its dependants in the order
    /// they appear in `conditionals`, without duplicates.
    pub fn build(conditionals: &[ConditionalRecord]) -> Self {
        let mut by_field: BTreeMap<String, Vec<ConditionalId>> = BTreeMap::new();
        for conditional in conditionals {
            for name in referenced_fields(&conditional.expr) {
                let dependants = by_field.entry(name.to_string()).or_default();
                if !dependants.contains(&conditional.id) {
                    dependants.push(conditional.id.clone());
                }
            }
        }
        Self { by_field }
    }

    /// Conditionals that must be re-evaluated when `field` changes.
    pub fn dependants(&self, field: &str) -> &[ConditionalId] {
        self.by_field.get(field).map_or(&[], Vec::as_slice)
    }

    /// Indexed field names with their dependants, sorted by field name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ConditionalId])> {
        self.by_field
            .iter()
            .map(|(field, ids)| (field.as_str(), ids.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.by_field.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }
}
