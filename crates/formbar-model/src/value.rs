use serde::{Deserialize, Serialize};
use std::fmt;

use crate::enums::FieldKind;
use crate::error::ModelError;

/// Current value of a field.
///
/// Checkbox groups always hold a `List`; every other kind holds `Unset` or a
/// non-empty `Scalar`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldValue {
    #[default]
    Unset,
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Scalar value, normalising the empty string to `Unset`.
    pub fn scalar(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            FieldValue::Unset
        } else {
            FieldValue::Scalar(value)
        }
    }

    /// List value; empty entries are dropped the way unchecked boxes are.
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::List(
            values
                .into_iter()
                .map(Into::into)
                .filter(|v: &String| !v.is_empty())
                .collect(),
        )
    }

    /// The value a field of `kind` holds after being cleared.
    pub fn empty_for(kind: FieldKind) -> Self {
        if kind.is_multi_valued() {
            FieldValue::List(Vec::new())
        } else {
            FieldValue::Unset
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Unset => true,
            FieldValue::Scalar(s) => s.is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    /// Bring a value into the shape required by `kind`.
    ///
    /// Scalars assigned to a checkbox group become a one-element list; a list
    /// assigned to a scalar field is rejected.
    pub fn coerce_for(self, field: &str, kind: FieldKind) -> Result<Self, ModelError> {
        match (kind.is_multi_valued(), self) {
            (true, FieldValue::Unset) => Ok(FieldValue::List(Vec::new())),
            (true, FieldValue::Scalar(s)) => Ok(FieldValue::list([s])),
            (true, FieldValue::List(items)) => Ok(FieldValue::list(items)),
            (false, FieldValue::List(_)) => Err(ModelError::ValueShape {
                field: field.to_string(),
                kind,
            }),
            (false, FieldValue::Scalar(s)) => Ok(FieldValue::scalar(s)),
            (false, FieldValue::Unset) => Ok(FieldValue::Unset),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unset => Ok(()),
            FieldValue::Scalar(s) => f.write_str(s),
            FieldValue::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}
