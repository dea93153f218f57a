//! Remote predicate evaluator interface.
//!
//! The engine never interprets expressions itself. A substituted expression
//! is handed to an [`Evaluator`], which answers with a JSON value; the engine
//! only looks at the value's truthiness.

use serde_json::Value;
use thiserror::Error;

/// Result value returned by an evaluator.
pub type EvalValue = Value;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EvalError {
    /// Network failure or timeout.
    #[error("evaluator unreachable: {0}")]
    Transport(String),

    #[error("evaluator answered HTTP {0}")]
    Status(u16),

    /// The evaluator answered but flagged the expression as failed.
    #[error("evaluator rejected expression '{0}'")]
    Rejected(String),

    #[error("malformed evaluator response: {0}")]
    InvalidResponse(String),

    /// The form declares no evaluation endpoint.
    #[error("no evaluator configured")]
    Unavailable,
}

/// Evaluates substituted expressions.
pub trait Evaluator {
    fn evaluate(&self, expr: &str) -> Result<EvalValue, EvalError>;
}

impl<F> Evaluator for F
where
    F: Fn(&str) -> Result<EvalValue, EvalError>,
{
    fn evaluate(&self, expr: &str) -> Result<EvalValue, EvalError> {
        self(expr)
    }
}

/// Evaluator of a form without an evaluation endpoint. Every call fails, so
/// every conditional stays closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl Evaluator for Unavailable {
    fn evaluate(&self, _expr: &str) -> Result<EvalValue, EvalError> {
        Err(EvalError::Unavailable)
    }
}

/// Truthiness of an evaluation result: `null`, `false`, zero, the empty
/// string and empty collections are false.
pub fn is_truthy(value: &EvalValue) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Text shown for an evaluation result; strings are shown unquoted.
pub fn display_value(value: &EvalValue) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
