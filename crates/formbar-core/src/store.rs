//! Field state store.
//!
//! Holds the authoritative value, activation state and decoration of every
//! field in a session. Reads are public; writes are only reachable through the
//! change dispatcher and the reconciler.

use std::collections::HashMap;

use formbar_model::{FieldName, FieldRecord, FieldValue};

use crate::effect::Effect;
use crate::error::{Result, SessionError};

/// Field records of one form session, kept in document order.
#[derive(Debug, Clone, Default)]
pub struct FieldStore {
    records: Vec<FieldRecord>,
    positions: HashMap<String, usize>,
}

impl FieldStore {
    /// Build a store from scanned records. A later record with an already
    /// seen name is ignored.
    pub fn new(records: impl IntoIterator<Item = FieldRecord>) -> Self {
        let mut store = Self::default();
        for record in records {
            if store.positions.contains_key(record.name.as_str()) {
                continue;
            }
            store
                .positions
                .insert(record.name.as_str().to_string(), store.records.len());
            store.records.push(record);
        }
        store
    }

    pub fn get(&self, name: &str) -> Option<&FieldRecord> {
        self.positions.get(name).map(|&index| &self.records[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut FieldRecord> {
        self.positions
            .get(name)
            .map(|&index| &mut self.records[index])
    }

    /// Write a user-entered value.
    ///
    /// The value is coerced to the field's shape and the desired mark is
    /// refreshed; any resulting mark change is returned as effects.
    pub(crate) fn write_value(&mut self, name: &str, value: FieldValue) -> Result<Vec<Effect>> {
        let record = self
            .get_mut(name)
            .ok_or_else(|| SessionError::UnknownField(name.to_string()))?;
        if !record.is_active() {
            return Err(SessionError::FieldInactive(name.to_string()));
        }
        record.value = value.coerce_for(name, record.kind)?;
        let before = record.decoration;
        record.refresh_decoration();

        let mut effects = Vec::new();
        Effect::decoration_changes(&record.name, &before, &record.decoration, &mut effects);
        Ok(effects)
    }

    /// Field names in document order.
    pub fn names(&self) -> impl Iterator<Item = &FieldName> {
        self.records.iter().map(|r| &r.name)
    }
}
