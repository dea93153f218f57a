use serde::Serialize;

use formbar_model::{ConditionalId, ConditionalMode, Decoration, FieldName, FieldValue};

/// Presentation change for the DOM adapter to mirror.
///
/// Effects only describe what changed; replaying the same effect twice leaves
/// the page unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// A conditional's region switched between its active and inactive look.
    Region {
        conditional: ConditionalId,
        active: bool,
        mode: ConditionalMode,
    },
    Visible { field: FieldName, visible: bool },
    ReadOnly { field: FieldName, readonly: bool },
    /// The engine cleared or restored a field value.
    Value { field: FieldName, value: FieldValue },
    Desired { field: FieldName, marked: bool },
    Required { field: FieldName, marked: bool },
    /// New display text of a computed field.
    Computed { id: String, text: String },
}

impl Effect {
    /// Push one effect per decoration flag that differs between `before` and
    /// `after`.
    pub fn decoration_changes(
        field: &FieldName,
        before: &Decoration,
        after: &Decoration,
        out: &mut Vec<Effect>,
    ) {
        if before.hidden != after.hidden {
            out.push(Effect::Visible {
                field: field.clone(),
                visible: !after.hidden,
            });
        }
        if before.readonly != after.readonly {
            out.push(Effect::ReadOnly {
                field: field.clone(),
                readonly: after.readonly,
            });
        }
        if before.desired_marked != after.desired_marked {
            out.push(Effect::Desired {
                field: field.clone(),
                marked: after.desired_marked,
            });
        }
        if before.required_marked != after.required_marked {
            out.push(Effect::Required {
                field: field.clone(),
                marked: after.required_marked,
            });
        }
    }

    /// Field the effect applies to, if it targets a single field.
    pub fn field(&self) -> Option<&FieldName> {
        match self {
            Effect::Visible { field, .. }
            | Effect::ReadOnly { field, .. }
            | Effect::Value { field, .. }
            | Effect::Desired { field, .. }
            | Effect::Required { field, .. } => Some(field),
            Effect::Region { .. } | Effect::Computed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoration_diff_emits_changed_flags_only() {
        let name = FieldName::new("email").unwrap();
        let before = Decoration::active(true, false, &FieldValue::Unset);
        let after = Decoration::inactive(true);
        let mut effects = Vec::new();
        Effect::decoration_changes(&name, &before, &after, &mut effects);
        assert_eq!(
            effects,
            vec![
                Effect::Visible {
                    field: name.clone(),
                    visible: false
                },
                Effect::ReadOnly {
                    field: name.clone(),
                    readonly: true
                },
                Effect::Required {
                    field: name.clone(),
                    marked: false
                },
            ]
        );

        effects.clear();
        Effect::decoration_changes(&name, &after, &after, &mut effects);
        assert!(effects.is_empty());
    }
}
