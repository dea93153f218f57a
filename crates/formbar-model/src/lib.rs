//! Data model for conditional forms.
//!
//! Fields, conditionals and computed fields are declared in the form markup
//! and scanned once per form load. Everything here is plain data; the engine
//! in `formbar-core` owns the mutable session state built from it.

pub mod conditional;
pub mod diagnostic;
pub mod enums;
pub mod error;
pub mod field;
pub mod ids;
pub mod value;

pub use conditional::{ComputedField, ConditionalRecord};
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use enums::{ConditionalMode, Datatype, FieldKind, FieldState, RuleKind};
pub use error::{ModelError, Result};
pub use field::{Decoration, FieldRecord, RuleRef};
pub use ids::{ConditionalId, FieldName};
pub use value::FieldValue;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes() {
        let mut record = FieldRecord::new(FieldName::new("age").unwrap(), FieldKind::Text);
        record.datatype = Datatype::Number;
        record.value = FieldValue::scalar("17");
        let json = serde_json::to_string(&record).expect("serialize record");
        let round: FieldRecord = serde_json::from_str(&json).expect("deserialize record");
        assert_eq!(round, record);
    }
}
