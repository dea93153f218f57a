//! Error types for the conditional engine.

use thiserror::Error;

use formbar_model::ModelError;

/// Substitution failed because the expression names a field the form does not
/// declare.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubstituteError {
    #[error("expression '{expr}' references unknown field '{field}'")]
    UnknownField { field: String, expr: String },
}

/// Errors returned by [`FormSession`](crate::FormSession) operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SessionError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("unknown conditional: {0}")]
    UnknownConditional(String),

    /// Inactive fields are read-only; edits to them are refused.
    #[error("field '{0}' is inactive and cannot be edited")]
    FieldInactive(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Substitute(#[from] SubstituteError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
