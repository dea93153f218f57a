use serde::{Deserialize, Serialize};

use crate::enums::{Datatype, FieldKind, FieldState, RuleKind};
use crate::ids::FieldName;
use crate::value::FieldValue;

/// Presentation state of a field as the DOM adapter should render it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
    pub hidden: bool,
    pub readonly: bool,
    pub desired_marked: bool,
    pub required_marked: bool,
}

impl Decoration {
    /// Decoration of an active field.
    ///
    /// A field that is both required and desired only carries the required
    /// mark. The desired mark is shown while the value is empty.
    pub fn active(required: bool, desired: bool, value: &FieldValue) -> Self {
        Self {
            hidden: false,
            readonly: false,
            desired_marked: desired && !required && value.is_empty(),
            required_marked: required,
        }
    }

    /// Decoration of an inactive field. Marks are cleared and the field is
    /// always read-only.
    pub fn inactive(hidden: bool) -> Self {
        Self {
            hidden,
            readonly: true,
            desired_marked: false,
            required_marked: false,
        }
    }
}

/// Inline validation rule attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRef {
    pub expr: String,
    pub kind: RuleKind,
    pub message: String,
}

impl RuleRef {
    pub fn new(expr: impl Into<String>, kind: RuleKind) -> Self {
        let expr = expr.into();
        let message = format!("Expression \"{expr}\" failed");
        Self {
            expr,
            kind,
            message,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Implicit rule of a required field.
    pub fn required(field: &FieldName) -> Self {
        Self::new(format!("bool(${field})"), RuleKind::Error)
            .with_message("This field is required. You must provide a value")
    }

    /// Implicit rule of a desired field.
    pub fn desired(field: &FieldName) -> Self {
        Self::new(format!("bool(${field})"), RuleKind::Warning)
            .with_message("This field is desired. Please provide a value")
    }
}

/// Per-field state held by the field store for one form session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: FieldName,
    pub kind: FieldKind,
    pub value: FieldValue,
    pub state: FieldState,
    pub required: bool,
    pub desired: bool,
    pub datatype: Datatype,
    /// Rules declared in the markup (implicit required/desired rules are not
    /// stored here, see [`FieldRecord::effective_rules`]).
    pub rules: Vec<RuleRef>,
    /// Enclosing `formgroup`, if any.
    pub group: Option<String>,
    pub decoration: Decoration,
    /// Value captured when a reset-on-deactivate conditional cleared the field.
    pub stash: Option<FieldValue>,
}

impl FieldRecord {
    pub fn new(name: FieldName, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            value: FieldValue::empty_for(kind),
            state: FieldState::Active,
            required: false,
            desired: false,
            datatype: Datatype::Unset,
            rules: Vec::new(),
            group: None,
            decoration: Decoration::default(),
            stash: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Recompute the decoration of an active field from its flags and value.
    pub fn refresh_decoration(&mut self) {
        if self.is_active() {
            self.decoration = Decoration::active(self.required, self.desired, &self.value);
        }
    }

    /// Implicit required/desired rules followed by the declared rules.
    pub fn effective_rules(&self) -> Vec<RuleRef> {
        let mut rules = Vec::with_capacity(self.rules.len() + 2);
        if self.required {
            rules.push(RuleRef::required(&self.name));
        }
        if self.desired {
            rules.push(RuleRef::desired(&self.name));
        }
        rules.extend(self.rules.iter().cloned());
        rules
    }
}
