use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{ConditionalId, FieldName};

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Form configuration is broken.
    Error,
    /// Engine fell back to a safe default.
    Warning,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Expression references a field the form does not declare.
    MalformedDeclaration,
    /// Evaluator call failed; the result was treated as false.
    EvaluationFailure,
    /// A conditional tried to change state twice in one dispatch chain.
    CascadeCycle,
    /// A value could not be represented and was substituted as `None`.
    SubstitutionFallback,
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            Self::MalformedDeclaration | Self::CascadeCycle => Severity::Error,
            Self::EvaluationFailure | Self::SubstitutionFallback => Severity::Warning,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedDeclaration => "malformed-declaration",
            Self::EvaluationFailure => "evaluation-failure",
            Self::CascadeCycle => "cascade-cycle",
            Self::SubstitutionFallback => "substitution-fallback",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub conditional: Option<ConditionalId>,
    pub field: Option<FieldName>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            conditional: None,
            field: None,
            message: message.into(),
        }
    }

    pub fn with_conditional(mut self, id: &ConditionalId) -> Self {
        self.conditional = Some(id.clone());
        self
    }

    pub fn with_field(mut self, name: &FieldName) -> Self {
        self.field = Some(name.clone());
        self
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.kind)?;
        if let Some(id) = &self.conditional {
            write!(f, "{id}: ")?;
        } else if let Some(field) = &self.field {
            write!(f, "{field}: ")?;
        }
        f.write_str(&self.message)
    }
}
