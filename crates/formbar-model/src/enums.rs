//! Type-safe enumerations for form declarations.
//!
//! The markup carries all of these as attribute strings; parsing is
//! case-insensitive and tolerant of the aliases older form configurations use.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared datatype of a field.
///
/// The datatype decides how a value is rendered into an expression before it
/// is sent to the evaluator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Datatype {
    String,
    Text,
    Date,
    Number,
    Boolean,
    Array,
    #[default]
    Unset,
}

impl Datatype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Datatype::String => "string",
            Datatype::Text => "text",
            Datatype::Date => "date",
            Datatype::Number => "number",
            Datatype::Boolean => "boolean",
            Datatype::Array => "array",
            Datatype::Unset => "unset",
        }
    }

    /// Returns true if values of this datatype are rendered as quoted
    /// string literals.
    pub fn is_quoted(&self) -> bool {
        matches!(self, Datatype::String | Datatype::Text | Datatype::Date)
    }
}

impl fmt::Display for Datatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Datatype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "string" | "str" => Ok(Datatype::String),
            "text" => Ok(Datatype::Text),
            "date" => Ok(Datatype::Date),
            "number" | "integer" | "int" | "float" | "decimal" => Ok(Datatype::Number),
            "boolean" | "bool" => Ok(Datatype::Boolean),
            "array" | "list" => Ok(Datatype::Array),
            "" | "unset" => Ok(Datatype::Unset),
            _ => Err(format!("Unknown datatype: {s}")),
        }
    }
}

/// Kind of input element a field is rendered as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Hidden,
    /// Read-only display of a value (`div[name]`).
    Static,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Radio => "radio",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Hidden => "hidden",
            FieldKind::Static => "static",
        }
    }

    /// Checkbox groups are the only multi-valued fields.
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, FieldKind::Checkbox)
    }

    /// Free-typing inputs whose changes are debounced until the user stops
    /// typing.
    pub fn is_debounced(&self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::Textarea)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = String;

    /// Parses an `input[type]` value or an element name. HTML5 text-like
    /// input types all collapse onto `Text`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "" | "text" | "email" | "number" | "date" | "tel" | "url" | "search" | "password" => {
                Ok(FieldKind::Text)
            }
            "textarea" => Ok(FieldKind::Textarea),
            "select" => Ok(FieldKind::Select),
            "radio" => Ok(FieldKind::Radio),
            "checkbox" => Ok(FieldKind::Checkbox),
            "hidden" => Ok(FieldKind::Hidden),
            "static" | "div" => Ok(FieldKind::Static),
            _ => Err(format!("Unknown field type: {s}")),
        }
    }
}

/// What a conditional does to its region when it evaluates false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionalMode {
    /// Region is hidden.
    #[default]
    Visibility,
    /// Region stays visible but is dimmed and read-only.
    ReadOnly,
}

impl ConditionalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionalMode::Visibility => "visibility",
            ConditionalMode::ReadOnly => "readonly",
        }
    }
}

impl fmt::Display for ConditionalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Activation state of a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldState {
    #[default]
    Active,
    Inactive,
}

impl FieldState {
    pub fn is_active(&self) -> bool {
        matches!(self, FieldState::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldState::Active => "active",
            FieldState::Inactive => "inactive",
        }
    }
}

impl fmt::Display for FieldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of an inline validation rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    #[default]
    Error,
    Warning,
    Info,
}

impl RuleKind {
    /// Parse a rule kind, returning `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warning" | "warn" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Info",
        }
    }
}
