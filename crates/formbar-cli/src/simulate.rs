//! Run the conditional engine over a scanned form.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use formbar_core::{DispatchReport, Evaluator, FieldChange, FormSession, RuleOutcome, Unavailable};
use formbar_markup::FormMarkup;
use formbar_model::{
    ConditionalId, ConditionalMode, Diagnostic, FieldKind, FieldName, FieldRecord, FieldState,
    FieldValue,
};

use crate::logging::redact_value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSummary {
    pub name: FieldName,
    pub kind: FieldKind,
    pub state: FieldState,
    pub value: String,
    pub hidden: bool,
    pub readonly: bool,
    pub required: bool,
    pub desired: bool,
}

impl FieldSummary {
    fn from_record(record: &FieldRecord) -> Self {
        Self {
            name: record.name.clone(),
            kind: record.kind,
            state: record.state,
            value: record.value.to_string(),
            hidden: record.decoration.hidden,
            readonly: record.decoration.readonly,
            required: record.decoration.required_marked,
            desired: record.decoration.desired_marked,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionalSummary {
    pub id: ConditionalId,
    pub expr: String,
    pub mode: ConditionalMode,
    /// `None` until evaluated.
    pub result: Option<bool>,
    pub governs: Vec<FieldName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputedSummary {
    pub id: String,
    pub expr: String,
    pub text: Option<String>,
}

/// One dependency index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub field: String,
    pub conditionals: Vec<ConditionalId>,
}

/// Static view of a form: declarations and their dependencies. Nothing is
/// evaluated.
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub eval_url: Option<String>,
    pub fields: Vec<FieldSummary>,
    pub conditionals: Vec<ConditionalSummary>,
    pub index: Vec<IndexEntry>,
    pub computed: Vec<ComputedSummary>,
    pub diagnostics: Vec<Diagnostic>,
}

impl InspectReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Final state of a simulation.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub fields: Vec<FieldSummary>,
    pub conditionals: Vec<ConditionalSummary>,
    pub computed: Vec<ComputedSummary>,
    /// Build-time diagnostics followed by those of every dispatch chain.
    pub diagnostics: Vec<Diagnostic>,
    /// Rules of active fields that did not pass.
    pub rule_failures: Vec<RuleOutcome>,
    /// Whether any dispatch chain stopped on a cascade cycle.
    pub aborted: bool,
}

impl SimulationResult {
    pub fn has_errors(&self) -> bool {
        self.aborted || self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

pub fn inspect_form(form: FormMarkup) -> InspectReport {
    let eval_url = form.eval_url.clone();
    let computed = form
        .computed
        .iter()
        .map(|field| ComputedSummary {
            id: field.id.clone(),
            expr: field.expr.clone(),
            text: None,
        })
        .collect();
    let session = FormSession::new(form, Unavailable);
    let index = session
        .index()
        .iter()
        .map(|(field, conditionals)| IndexEntry {
            field: field.to_string(),
            conditionals: conditionals.to_vec(),
        })
        .collect();
    InspectReport {
        eval_url,
        fields: field_summaries(&session),
        conditionals: conditional_summaries(&session),
        index,
        computed,
        diagnostics: session.diagnostics().to_vec(),
    }
}

/// Initialize `form`, then apply each `(field, value)` in order as if typed,
/// flushing the debounce queue after each one.
pub fn run_simulation<E: Evaluator>(
    form: FormMarkup,
    evaluator: E,
    assignments: &[(String, String)],
    debounce: Duration,
) -> Result<SimulationResult> {
    let computed_fields = form.computed.clone();
    let mut session = FormSession::new(form, evaluator).with_debounce(debounce);
    let mut diagnostics = session.diagnostics().to_vec();
    let mut aborted = false;

    let report = session.initialize();
    absorb(report, &mut diagnostics, &mut aborted);

    for (name, raw) in assignments {
        let (field, kind) = session
            .field(name)
            .map(|record| (record.name.clone(), record.kind))
            .with_context(|| format!("form has no field named '{name}'"))?;
        debug!(field = %field, value = redact_value(raw), "applying value");
        let change = FieldChange::new(field, parse_value(kind, raw));
        let report = session
            .input(change, Instant::now())
            .with_context(|| format!("set field '{name}'"))?;
        absorb(report, &mut diagnostics, &mut aborted);
        absorb(session.flush_all(), &mut diagnostics, &mut aborted);
    }

    let rule_failures: Vec<RuleOutcome> = session
        .check_all()
        .into_iter()
        .filter(|outcome| !outcome.passed)
        .collect();
    let computed = computed_fields
        .into_iter()
        .map(|field| {
            let text = session.computed_text(&field.id).map(str::to_string);
            ComputedSummary {
                id: field.id,
                expr: field.expr,
                text,
            }
        })
        .collect();
    let result = SimulationResult {
        fields: field_summaries(&session),
        conditionals: conditional_summaries(&session),
        computed,
        diagnostics,
        rule_failures,
        aborted,
    };
    info!(
        fields = result.fields.len(),
        inactive = result
            .fields
            .iter()
            .filter(|f| !f.state.is_active())
            .count(),
        rule_failures = result.rule_failures.len(),
        "simulation finished"
    );
    Ok(result)
}

/// Choose the evaluator endpoint: the explicit URL, then the settings URL,
/// then the form's own `evalurl` if it is absolute.
pub fn resolve_eval_url(
    explicit: Option<&str>,
    settings: Option<&str>,
    form: Option<&str>,
) -> Option<String> {
    let chosen = [explicit, settings]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty());
    if let Some(url) = chosen {
        return Some(url.to_string());
    }
    let url = form.map(str::trim).filter(|url| !url.is_empty())?;
    if url.starts_with("http://") || url.starts_with("https://") {
        Some(url.to_string())
    } else {
        warn!(
            url,
            "form evalurl is relative; pass --eval-url or set evaluator.url"
        );
        None
    }
}

/// Checkbox values are comma separated.
fn parse_value(kind: FieldKind, raw: &str) -> FieldValue {
    if kind.is_multi_valued() {
        FieldValue::list(raw.split(',').map(str::trim))
    } else {
        FieldValue::scalar(raw)
    }
}

fn absorb(report: DispatchReport, diagnostics: &mut Vec<Diagnostic>, aborted: &mut bool) {
    *aborted |= report.aborted;
    diagnostics.extend(report.diagnostics);
}

fn field_summaries<E: Evaluator>(session: &FormSession<E>) -> Vec<FieldSummary> {
    session.fields().map(FieldSummary::from_record).collect()
}

fn conditional_summaries<E: Evaluator>(session: &FormSession<E>) -> Vec<ConditionalSummary> {
    session
        .conditionals()
        .iter()
        .map(|record| ConditionalSummary {
            id: record.id.clone(),
            expr: record.expr.clone(),
            mode: record.mode,
            result: session.conditional_result(record.id.as_str()),
            governs: record.governs.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_url_wins() {
        assert_eq!(
            resolve_eval_url(Some("http://a/x"), Some("http://b/x"), Some("http://c/x")),
            Some("http://a/x".to_string())
        );
        assert_eq!(
            resolve_eval_url(None, Some("http://b/x"), Some("http://c/x")),
            Some("http://b/x".to_string())
        );
        assert_eq!(
            resolve_eval_url(Some("  "), None, Some("https://c/x")),
            Some("https://c/x".to_string())
        );
    }

    #[test]
    fn relative_form_url_is_not_used() {
        assert_eq!(resolve_eval_url(None, None, Some("/rules/evaluate")), None);
        assert_eq!(resolve_eval_url(None, None, None), None);
    }

    #[test]
    fn checkbox_values_split_on_commas() {
        assert_eq!(
            parse_value(FieldKind::Checkbox, "chess, go,"),
            FieldValue::list(["chess", "go"])
        );
        assert_eq!(
            parse_value(FieldKind::Text, "a,b"),
            FieldValue::scalar("a,b")
        );
    }
}
