//! Conditional reconciler.
//!
//! Turns the result of one conditional into field state transitions. A field
//! is active iff none of the conditionals governing it last evaluated false,
//! so nested regions compose: closing an outer region deactivates everything
//! inside it regardless of the inner conditionals.

use std::collections::HashMap;
use std::mem;

use tracing::debug;

use formbar_model::{
    ConditionalMode, ConditionalRecord, Decoration, FieldName, FieldRecord, FieldState,
    FieldValue,
};

use crate::effect::Effect;
use crate::store::FieldStore;

/// Conditionals of a session with their last known results.
#[derive(Debug, Clone, Default)]
pub struct Conditionals {
    records: Vec<ConditionalRecord>,
    positions: HashMap<String, usize>,
    results: Vec<Option<bool>>,
    broken: Vec<bool>,
    /// Field name to the positions of the conditionals governing it.
    governors: HashMap<String, Vec<usize>>,
}

impl Conditionals {
    /// Records are ordered by document position; that order is the
    /// evaluation order for the rest of the session.
    pub fn new(mut records: Vec<ConditionalRecord>) -> Self {
        records.sort_by_key(|c| c.position);
        let mut positions = HashMap::new();
        let mut governors: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, record) in records.iter().enumerate() {
            positions.insert(record.id.as_str().to_string(), index);
            for field in &record.governs {
                governors
                    .entry(field.as_str().to_string())
                    .or_default()
                    .push(index);
            }
        }
        let len = records.len();
        Self {
            records,
            positions,
            results: vec![None; len],
            broken: vec![false; len],
            governors,
        }
    }

    pub fn records(&self) -> &[ConditionalRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&ConditionalRecord> {
        self.records.get(index)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Last result, `None` before the first evaluation.
    pub fn result(&self, index: usize) -> Option<bool> {
        self.results.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A broken conditional is never sent to the evaluator and always counts
    /// as false.
    pub fn is_broken(&self, index: usize) -> bool {
        self.broken.get(index).copied().unwrap_or(false)
    }

    pub(crate) fn mark_broken(&mut self, index: usize) {
        if let Some(flag) = self.broken.get_mut(index) {
            *flag = true;
        }
    }

    /// Whether applying `result` would change the conditional's last result.
    pub fn would_transition(&self, index: usize, result: bool) -> bool {
        self.result(index) != Some(result)
    }

    fn closed_governors<'a>(&'a self, field: &str) -> impl Iterator<Item = usize> + 'a {
        self.governors
            .get(field)
            .into_iter()
            .flatten()
            .copied()
            .filter(move |&index| self.results[index] == Some(false))
    }

    /// Whether `field` should be active given the current results.
    pub fn field_is_open(&self, field: &str) -> bool {
        self.closed_governors(field).next().is_none()
    }

    /// Whether an inactive `field` should also be hidden: at least one closed
    /// governor works on visibility.
    fn field_is_hidden(&self, field: &str) -> bool {
        self.closed_governors(field)
            .any(|index| self.records[index].mode == ConditionalMode::Visibility)
    }
}

/// What one reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Fields that switched between active and inactive, in governed order.
    pub transitioned: Vec<FieldName>,
    pub effects: Vec<Effect>,
}

impl ReconcileOutcome {
    pub fn is_empty(&self) -> bool {
        self.transitioned.is_empty() && self.effects.is_empty()
    }
}

/// Record `result` as the new result of conditional `index` and bring its
/// governed fields in line.
///
/// Re-applying the last known result is a no-op.
pub fn reconcile(
    store: &mut FieldStore,
    conditionals: &mut Conditionals,
    index: usize,
    result: bool,
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();
    if !conditionals.would_transition(index, result) {
        return outcome;
    }
    conditionals.results[index] = Some(result);

    let record = &conditionals.records[index];
    outcome.effects.push(Effect::Region {
        conditional: record.id.clone(),
        active: result,
        mode: record.mode,
    });

    for name in &record.governs {
        let Some(field) = store.get_mut(name.as_str()) else {
            continue;
        };
        let open = conditionals.field_is_open(name.as_str());
        if open == field.is_active() {
            // Still closed by another governor; only the look may differ,
            // unless this region resets a value nobody has stashed yet.
            if !open {
                if !result && record.reset_on_deactivate && field.stash.is_none() {
                    stash_and_clear(field, &mut outcome.effects);
                }
                let before = field.decoration;
                field.decoration = Decoration::inactive(conditionals.field_is_hidden(name.as_str()));
                Effect::decoration_changes(name, &before, &field.decoration, &mut outcome.effects);
            }
            continue;
        }

        if open {
            activate(field, &mut outcome.effects);
        } else {
            let hidden = conditionals.field_is_hidden(name.as_str());
            deactivate(field, record.reset_on_deactivate, hidden, &mut outcome.effects);
        }
        debug!(
            conditional = %record.id,
            field = %name,
            state = %field.state,
            "field transitioned"
        );
        outcome.transitioned.push(name.clone());
    }
    outcome
}

fn activate(field: &mut FieldRecord, effects: &mut Vec<Effect>) {
    let before = field.decoration;
    field.state = FieldState::Active;
    if let Some(stashed) = field.stash.take() {
        if stashed != field.value {
            field.value = stashed;
            effects.push(Effect::Value {
                field: field.name.clone(),
                value: field.value.clone(),
            });
        }
    }
    field.refresh_decoration();
    Effect::decoration_changes(&field.name, &before, &field.decoration, effects);
}

fn deactivate(field: &mut FieldRecord, reset: bool, hidden: bool, effects: &mut Vec<Effect>) {
    let before = field.decoration;
    field.state = FieldState::Inactive;
    if reset {
        stash_and_clear(field, effects);
    }
    field.decoration = Decoration::inactive(hidden);
    Effect::decoration_changes(&field.name, &before, &field.decoration, effects);
}

fn stash_and_clear(field: &mut FieldRecord, effects: &mut Vec<Effect>) {
    let previous = mem::replace(&mut field.value, FieldValue::empty_for(field.kind));
    if previous != field.value {
        effects.push(Effect::Value {
            field: field.name.clone(),
            value: field.value.clone(),
        });
    }
    field.stash = Some(previous);
}

#[cfg(test)]
mod tests {
    use super::*;
    use formbar_model::{ConditionalId, FieldKind};

    fn field(name: &str) -> FieldRecord {
        let mut record = FieldRecord::new(FieldName::new(name).unwrap(), FieldKind::Text);
        record.value = FieldValue::scalar("v");
        record
    }

    fn conditional(id: &str, governs: &[&str], mode: ConditionalMode, position: usize) -> ConditionalRecord {
        ConditionalRecord {
            id: ConditionalId::new(id).unwrap(),
            expr: "$x".to_string(),
            governs: governs.iter().map(|n| FieldName::new(*n).unwrap()).collect(),
            reset_on_deactivate: true,
            mode,
            position,
        }
    }

    #[test]
    fn nested_regions_need_every_governor_open() {
        let mut store = FieldStore::new([field("a"), field("b")]);
        let mut conditionals = Conditionals::new(vec![
            conditional("outer", &["a", "b"], ConditionalMode::ReadOnly, 0),
            conditional("inner", &["b"], ConditionalMode::Visibility, 1),
        ]);

        reconcile(&mut store, &mut conditionals, 0, true);
        let outcome = reconcile(&mut store, &mut conditionals, 1, false);
        assert_eq!(outcome.transitioned, vec![FieldName::new("b").unwrap()]);
        assert!(store.get("b").unwrap().decoration.hidden);

        // Closing the outer region only transitions `a`; `b` stays inactive
        // and hidden.
        let outcome = reconcile(&mut store, &mut conditionals, 0, false);
        assert_eq!(outcome.transitioned, vec![FieldName::new("a").unwrap()]);
        assert!(!store.get("a").unwrap().decoration.hidden);
        assert!(store.get("a").unwrap().decoration.readonly);

        // Opening the inner region leaves `b` closed by the outer one, now
        // dimmed instead of hidden.
        let outcome = reconcile(&mut store, &mut conditionals, 1, true);
        assert!(outcome.transitioned.is_empty());
        let b = store.get("b").unwrap();
        assert!(!b.is_active());
        assert!(!b.decoration.hidden);
        assert_eq!(b.stash, Some(FieldValue::scalar("v")));
    }

    fn closed_in_order(order: [usize; 2]) -> FieldRecord {
        let mut store = FieldStore::new([field("b")]);
        let mut outer = conditional("outer", &["b"], ConditionalMode::ReadOnly, 0);
        outer.reset_on_deactivate = false;
        let inner = conditional("inner", &["b"], ConditionalMode::Visibility, 1);
        let mut conditionals = Conditionals::new(vec![outer, inner]);
        reconcile(&mut store, &mut conditionals, 0, true);
        reconcile(&mut store, &mut conditionals, 1, true);
        for index in order {
            reconcile(&mut store, &mut conditionals, index, false);
        }
        store.get("b").unwrap().clone()
    }

    #[test]
    fn reset_region_clears_regardless_of_closing_order() {
        let inner_first = closed_in_order([1, 0]);
        let outer_first = closed_in_order([0, 1]);
        assert_eq!(outer_first, inner_first);
        assert_eq!(outer_first.value, FieldValue::Unset);
        assert_eq!(outer_first.stash, Some(FieldValue::scalar("v")));
        assert!(outer_first.decoration.hidden);
    }

    #[test]
    fn reset_keeps_the_first_stash() {
        let mut store = FieldStore::new([field("b")]);
        let mut conditionals = Conditionals::new(vec![
            conditional("outer", &["b"], ConditionalMode::ReadOnly, 0),
            conditional("inner", &["b"], ConditionalMode::ReadOnly, 1),
        ]);
        reconcile(&mut store, &mut conditionals, 1, true);
        reconcile(&mut store, &mut conditionals, 0, false);
        let outcome = reconcile(&mut store, &mut conditionals, 1, false);
        assert!(outcome.transitioned.is_empty());
        let b = store.get("b").unwrap();
        assert_eq!(b.stash, Some(FieldValue::scalar("v")));

        reconcile(&mut store, &mut conditionals, 1, true);
        reconcile(&mut store, &mut conditionals, 0, true);
        assert_eq!(store.get("b").unwrap().value, FieldValue::scalar("v"));
    }

    #[test]
    fn same_result_is_a_no_op() {
        let mut store = FieldStore::new([field("a")]);
        let mut conditionals =
            Conditionals::new(vec![conditional("c", &["a"], ConditionalMode::Visibility, 0)]);
        let first = reconcile(&mut store, &mut conditionals, 0, false);
        assert!(!first.is_empty());
        let second = reconcile(&mut store, &mut conditionals, 0, false);
        assert!(second.is_empty());
        assert_eq!(conditionals.result(0), Some(false));
    }
}
