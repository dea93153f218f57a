use serde::{Deserialize, Serialize};

use crate::enums::ConditionalMode;
use crate::ids::{ConditionalId, FieldName};

/// A declared region whose status depends on an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalRecord {
    pub id: ConditionalId,
    pub expr: String,
    /// Fields inside the region, in document order.
    pub governs: Vec<FieldName>,
    pub reset_on_deactivate: bool,
    pub mode: ConditionalMode,
    /// Document position among all conditionals of the form.
    pub position: usize,
}

impl ConditionalRecord {
    pub fn governs_field(&self, name: &str) -> bool {
        self.governs.iter().any(|f| f.as_str() == name)
    }
}

/// A display element showing the result of an expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedField {
    pub id: String,
    pub expr: String,
}
