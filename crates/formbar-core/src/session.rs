//! Form session: the engine state of one loaded form.
//!
//! A session owns the field store, the dependency index and the last known
//! result of every conditional. Every state change goes through one of the
//! dispatch entry points ([`FormSession::initialize`],
//! [`FormSession::set_value`], [`FormSession::on_field_changed`],
//! [`FormSession::reconcile`] and the debounced [`FormSession::input`]), each
//! of which runs one dispatch chain and returns its [`DispatchReport`].

use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, trace, warn};

use formbar_markup::FormMarkup;
use formbar_model::{
    ComputedField, ConditionalId, ConditionalRecord, Diagnostic, DiagnosticKind, FieldName,
    FieldRecord, RuleRef,
};

use crate::debounce::Debouncer;
use crate::dispatch::{Chain, DispatchReport, FieldChange};
use crate::effect::Effect;
use crate::error::{Result, SessionError};
use crate::evaluator::{EvalError, EvalValue, Evaluator, display_value, is_truthy};
use crate::expr::{referenced_fields, substitute};
use crate::index::DependencyIndex;
use crate::reconcile::{Conditionals, ReconcileOutcome, reconcile};
use crate::store::FieldStore;

/// Text shown by a computed field whose expression is false or failed.
pub const NOT_A_NUMBER: &str = "NaN";

#[derive(Debug, Clone)]
struct ComputedState {
    field: ComputedField,
    broken: bool,
    text: Option<String>,
}

/// Result of checking one validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    pub field: FieldName,
    pub rule: RuleRef,
    pub passed: bool,
}

/// Engine state of one form.
pub struct FormSession<E> {
    store: FieldStore,
    index: DependencyIndex,
    conditionals: Conditionals,
    computed: Vec<ComputedState>,
    /// Field name to positions of the computed fields referencing it.
    computed_index: BTreeMap<String, Vec<usize>>,
    evaluator: E,
    debouncer: Debouncer,
    diagnostics: Vec<Diagnostic>,
}

impl<E: Evaluator> FormSession<E> {
    /// Build a session from scanned markup.
    ///
    /// Expressions naming undeclared fields are reported as malformed
    /// declarations (see [`FormSession::diagnostics`]); such a conditional
    /// is treated as permanently false and never evaluated.
    pub fn new(form: FormMarkup, evaluator: E) -> Self {
        let store = FieldStore::new(form.fields);
        let mut conditionals = Conditionals::new(form.conditionals);
        let index = DependencyIndex::build(conditionals.records());
        let mut diagnostics = Vec::new();

        let mut broken = Vec::new();
        for (position, record) in conditionals.records().iter().enumerate() {
            let unknown: Vec<&str> = referenced_fields(&record.expr)
                .into_iter()
                .filter(|name| !store.contains(name))
                .collect();
            if unknown.is_empty() {
                continue;
            }
            error!(
                conditional = %record.id,
                expr = %record.expr,
                unknown = ?unknown,
                "conditional references undeclared fields"
            );
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::MalformedDeclaration,
                    format!(
                        "expression '{}' references undeclared field(s): {}",
                        record.expr,
                        unknown.join(", ")
                    ),
                )
                .with_conditional(&record.id),
            );
            broken.push(position);
        }
        for position in broken {
            conditionals.mark_broken(position);
        }

        let mut computed = Vec::with_capacity(form.computed.len());
        let mut computed_index: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (position, field) in form.computed.into_iter().enumerate() {
            let mut broken = false;
            for name in referenced_fields(&field.expr) {
                if store.contains(name) {
                    computed_index
                        .entry(name.to_string())
                        .or_default()
                        .push(position);
                } else {
                    broken = true;
                }
            }
            if broken {
                error!(computed = %field.id, expr = %field.expr, "computed field references undeclared fields");
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MalformedDeclaration,
                    format!(
                        "computed field '{}': expression '{}' references undeclared fields",
                        field.id, field.expr
                    ),
                ));
            }
            computed.push(ComputedState {
                field,
                broken,
                text: None,
            });
        }

        debug!(
            fields = store.len(),
            conditionals = conditionals.len(),
            indexed_fields = index.len(),
            "built form session"
        );

        Self {
            store,
            index,
            conditionals,
            computed,
            computed_index,
            evaluator,
            debouncer: Debouncer::default(),
            diagnostics,
        }
    }

    /// Override the keystroke debounce delay.
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debouncer = Debouncer::new(delay);
        self
    }

    /// Evaluate every conditional once, in document order, then every
    /// computed field. Runs as a single dispatch chain.
    pub fn initialize(&mut self) -> DispatchReport {
        let mut chain = Chain::new();
        for position in 0..self.conditionals.len() {
            chain.enqueue(position);
        }
        self.drain(&mut chain);
        self.refresh_computed(None, &mut chain.report);
        let report = chain.finish();
        info!(
            evaluated = report.evaluated.len(),
            inactive = self.fields().filter(|f| !f.is_active()).count(),
            diagnostics = report.diagnostics.len(),
            "initialized form"
        );
        report
    }

    /// Apply a user edit and dispatch it immediately.
    pub fn set_value(&mut self, change: FieldChange) -> Result<DispatchReport> {
        let mut effects = self.store.write_value(change.field.as_str(), change.value)?;
        let mut report = self.on_field_changed(change.field.as_str())?;
        effects.append(&mut report.effects);
        report.effects = effects;
        Ok(report)
    }

    /// Re-evaluate everything that depends on `field`.
    pub fn on_field_changed(&mut self, field: &str) -> Result<DispatchReport> {
        if !self.store.contains(field) {
            return Err(SessionError::UnknownField(field.to_string()));
        }
        let mut chain = Chain::new();
        chain.touched.insert(field.to_string());
        for id in self.index.dependants(field) {
            if let Some(position) = self.conditionals.position(id.as_str()) {
                chain.enqueue(position);
            }
        }
        debug!(field, "dispatching field change");
        self.drain(&mut chain);
        let touched = chain.touched.clone();
        self.refresh_computed(Some(&touched), &mut chain.report);
        Ok(chain.finish())
    }

    /// Apply an evaluation result for conditional `id` and run the cascade it
    /// causes. Errors are treated as false, and so is any result for a
    /// conditional reported as malformed at build.
    pub fn reconcile(
        &mut self,
        id: &str,
        result: std::result::Result<EvalValue, EvalError>,
    ) -> Result<DispatchReport> {
        let position = self
            .conditionals
            .position(id)
            .ok_or_else(|| SessionError::UnknownConditional(id.to_string()))?;
        let mut chain = Chain::new();
        let truthy = match result {
            Ok(value) => is_truthy(&value),
            Err(err) => {
                self.report_eval_failure(position, &err, &mut chain.report);
                false
            }
        };
        if self.step(position, truthy, &mut chain) {
            self.drain(&mut chain);
        }
        let touched = chain.touched.clone();
        self.refresh_computed(Some(&touched), &mut chain.report);
        Ok(chain.finish())
    }

    /// Record a keystroke. The value is stored at once; dispatch waits until
    /// the field has been quiet for the debounce delay. Fields whose kind is
    /// not debounced are dispatched immediately.
    pub fn input(&mut self, change: FieldChange, now: Instant) -> Result<DispatchReport> {
        let kind = self
            .store
            .get(change.field.as_str())
            .map(|f| f.kind)
            .ok_or_else(|| SessionError::UnknownField(change.field.to_string()))?;
        if !kind.is_debounced() {
            return self.set_value(change);
        }
        let effects = self.store.write_value(change.field.as_str(), change.value)?;
        trace!(field = %change.field, "debouncing keystroke");
        self.debouncer.touch(change.field, now);
        Ok(DispatchReport {
            effects,
            ..DispatchReport::default()
        })
    }

    /// Dispatch every debounced field whose delay has elapsed at `now`.
    pub fn flush_due(&mut self, now: Instant) -> DispatchReport {
        let due = self.debouncer.take_due(now);
        self.dispatch_all(due)
    }

    /// Dispatch every pending debounced field, e.g. before submit.
    pub fn flush_all(&mut self) -> DispatchReport {
        let pending = self.debouncer.take_all();
        self.dispatch_all(pending)
    }

    /// Earliest instant at which [`FormSession::flush_due`] has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    fn dispatch_all(&mut self, fields: Vec<FieldName>) -> DispatchReport {
        let mut report = DispatchReport::default();
        for field in fields {
            match self.on_field_changed(field.as_str()) {
                Ok(chain) => report.merge(chain),
                Err(err) => warn!(field = %field, "dropping debounced change: {err}"),
            }
        }
        report
    }

    /// Check the rules of one field. Inactive fields have no failing rules.
    pub fn check_field(&self, field: &str) -> Result<Vec<RuleOutcome>> {
        let record = self
            .store
            .get(field)
            .ok_or_else(|| SessionError::UnknownField(field.to_string()))?;
        Ok(self.check_record(record))
    }

    /// Check the rules of every active field, in document order.
    pub fn check_all(&self) -> Vec<RuleOutcome> {
        self.store
            .iter()
            .flat_map(|record| self.check_record(record))
            .collect()
    }

    fn check_record(&self, record: &FieldRecord) -> Vec<RuleOutcome> {
        if !record.is_active() {
            return Vec::new();
        }
        record
            .effective_rules()
            .into_iter()
            .map(|rule| {
                let passed = self.evaluate_expr(&rule.expr).unwrap_or_else(|err| {
                    warn!(field = %record.name, expr = %rule.expr, "rule check failed: {err}");
                    false
                });
                RuleOutcome {
                    field: record.name.clone(),
                    rule,
                    passed,
                }
            })
            .collect()
    }

    fn evaluate_expr(&self, expr: &str) -> std::result::Result<bool, String> {
        let substituted = substitute(expr, &self.store).map_err(|e| e.to_string())?;
        let value = self
            .evaluator
            .evaluate(&substituted.expr)
            .map_err(|e| e.to_string())?;
        Ok(is_truthy(&value))
    }

    pub fn field(&self, name: &str) -> Option<&FieldRecord> {
        self.store.get(name)
    }

    /// Fields in document order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldRecord> {
        self.store.iter()
    }

    pub fn store(&self) -> &FieldStore {
        &self.store
    }

    pub fn index(&self) -> &DependencyIndex {
        &self.index
    }

    /// Conditionals in document order.
    pub fn conditionals(&self) -> &[ConditionalRecord] {
        self.conditionals.records()
    }

    /// Last result of conditional `id`; `None` before its first evaluation.
    pub fn conditional_result(&self, id: &str) -> Option<bool> {
        self.conditionals
            .position(id)
            .and_then(|position| self.conditionals.result(position))
    }

    /// Current display text of computed field `id`.
    pub fn computed_text(&self, id: &str) -> Option<&str> {
        self.computed
            .iter()
            .find(|c| c.field.id == id)
            .and_then(|c| c.text.as_deref())
    }

    /// Problems found while building the session.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain the chain's queue. Stops early on a cascade cycle.
    fn drain(&mut self, chain: &mut Chain) {
        while let Some(position) = chain.next() {
            let truthy = self.evaluate_conditional(position, &mut chain.report);
            if !self.step(position, truthy, chain) {
                break;
            }
        }
    }

    /// Reconcile one result and queue the dependants of every transitioned
    /// field. Returns `false` when the chain must abort.
    fn step(&mut self, position: usize, truthy: bool, chain: &mut Chain) -> bool {
        let truthy = truthy && !self.conditionals.is_broken(position);
        // A first evaluation has nothing to flip from and is not a transition.
        let flips = self
            .conditionals
            .result(position)
            .is_some_and(|previous| previous != truthy);
        if flips && !chain.record_transition(position) {
            let id = self.conditional_id(position);
            warn!(conditional = %id, "cascade cycle detected; aborting dispatch chain");
            chain.report.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::CascadeCycle,
                    "conditional changed state twice in one dispatch chain",
                )
                .with_conditional(&id),
            );
            chain.report.aborted = true;
            return false;
        }

        let ReconcileOutcome {
            transitioned,
            effects,
        } = reconcile(&mut self.store, &mut self.conditionals, position, truthy);
        chain.report.effects.extend(effects);
        for field in transitioned {
            for id in self.index.dependants(field.as_str()) {
                if let Some(dependant) = self.conditionals.position(id.as_str()) {
                    chain.enqueue(dependant);
                }
            }
            chain.touched.insert(field.as_str().to_string());
            chain.report.transitioned.push(field);
        }
        true
    }

    /// Substitute and evaluate conditional `position`; failures count as
    /// false.
    fn evaluate_conditional(&self, position: usize, report: &mut DispatchReport) -> bool {
        if self.conditionals.is_broken(position) {
            return false;
        }
        let Some(record) = self.conditionals.get(position) else {
            return false;
        };
        let substituted = match substitute(&record.expr, &self.store) {
            Ok(substituted) => substituted,
            Err(err) => {
                warn!(conditional = %record.id, "{err}");
                report.diagnostics.push(
                    Diagnostic::new(DiagnosticKind::MalformedDeclaration, err.to_string())
                        .with_conditional(&record.id),
                );
                return false;
            }
        };
        for field in &substituted.fallbacks {
            debug!(conditional = %record.id, field = %field, "value sent as None");
            report.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::SubstitutionFallback,
                    "value does not match the field datatype and was sent as None",
                )
                .with_conditional(&record.id)
                .with_field(field),
            );
        }

        trace!(conditional = %record.id, expr = %substituted.expr, "evaluating");
        report.evaluated.push(record.id.clone());
        match self.evaluator.evaluate(&substituted.expr) {
            Ok(value) => is_truthy(&value),
            Err(err) => {
                self.report_eval_failure(position, &err, report);
                false
            }
        }
    }

    fn report_eval_failure(&self, position: usize, err: &EvalError, report: &mut DispatchReport) {
        let id = self.conditional_id(position);
        warn!(conditional = %id, "evaluation failed, treating as false: {err}");
        report.diagnostics.push(
            Diagnostic::new(DiagnosticKind::EvaluationFailure, err.to_string()).with_conditional(&id),
        );
    }

    fn conditional_id(&self, position: usize) -> ConditionalId {
        self.conditionals
            .get(position)
            .map(|c| c.id.clone())
            .unwrap_or_else(|| ConditionalId::generated(position))
    }

    /// Re-evaluate computed fields referencing any of `touched`, or all of
    /// them when `touched` is `None`. Emits an effect when the text changes.
    fn refresh_computed(&mut self, touched: Option<&BTreeSet<String>>, report: &mut DispatchReport) {
        let positions: BTreeSet<usize> = match touched {
            None => (0..self.computed.len()).collect(),
            Some(fields) => fields
                .iter()
                .filter_map(|f| self.computed_index.get(f))
                .flatten()
                .copied()
                .collect(),
        };
        for position in positions {
            let text = self.computed_value(&self.computed[position]);
            let state = &mut self.computed[position];
            if state.text.as_deref() == Some(text.as_str()) {
                continue;
            }
            report.effects.push(Effect::Computed {
                id: state.field.id.clone(),
                text: text.clone(),
            });
            state.text = Some(text);
        }
    }

    fn computed_value(&self, state: &ComputedState) -> String {
        if state.broken {
            return NOT_A_NUMBER.to_string();
        }
        let value = substitute(&state.field.expr, &self.store)
            .map_err(|e| e.to_string())
            .and_then(|s| self.evaluator.evaluate(&s.expr).map_err(|e| e.to_string()));
        match value {
            Ok(value) if is_truthy(&value) => display_value(&value),
            Ok(_) => NOT_A_NUMBER.to_string(),
            Err(err) => {
                debug!(computed = %state.field.id, "evaluation failed: {err}");
                NOT_A_NUMBER.to_string()
            }
        }
    }
}
