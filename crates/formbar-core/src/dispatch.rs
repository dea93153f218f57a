//! Change dispatch: work queue and report of one dispatch chain.
//!
//! A chain starts from one trigger (a field edit, a manual reconcile or the
//! initial evaluation) and runs until no reconciliation transitions another
//! field. Pending conditionals are drained in document order.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use formbar_model::{ConditionalId, Diagnostic, FieldName, FieldValue};

use crate::effect::Effect;

/// Edit of one field, as delivered by the DOM adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: FieldName,
    pub value: FieldValue,
}

impl FieldChange {
    pub fn new(field: FieldName, value: FieldValue) -> Self {
        Self { field, value }
    }
}

/// Everything one dispatch chain did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub effects: Vec<Effect>,
    pub diagnostics: Vec<Diagnostic>,
    /// Conditionals sent to the evaluator, in evaluation order.
    pub evaluated: Vec<ConditionalId>,
    /// Fields that switched between active and inactive.
    pub transitioned: Vec<FieldName>,
    /// The chain stopped on a cascade cycle.
    pub aborted: bool,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
            && self.diagnostics.is_empty()
            && self.evaluated.is_empty()
            && self.transitioned.is_empty()
            && !self.aborted
    }

    /// Append another report, as when several debounced fields flush at once.
    pub fn merge(&mut self, other: DispatchReport) {
        self.effects.extend(other.effects);
        self.diagnostics.extend(other.diagnostics);
        self.evaluated.extend(other.evaluated);
        self.transitioned.extend(other.transitioned);
        self.aborted |= other.aborted;
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Mutable state of a running dispatch chain.
#[derive(Debug, Default)]
pub(crate) struct Chain {
    pending: BTreeSet<usize>,
    transitioned: HashSet<usize>,
    /// Fields changed during the chain, including the trigger.
    pub(crate) touched: BTreeSet<String>,
    pub(crate) report: DispatchReport,
}

impl Chain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enqueue(&mut self, index: usize) {
        self.pending.insert(index);
    }

    /// Next conditional in document order.
    pub(crate) fn next(&mut self) -> Option<usize> {
        self.pending.pop_first()
    }

    /// Record a transition of conditional `index`. Returns `false` if it
    /// already transitioned in this chain.
    pub(crate) fn record_transition(&mut self, index: usize) -> bool {
        self.transitioned.insert(index)
    }

    pub(crate) fn finish(self) -> DispatchReport {
        self.report
    }
}
