#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use formbar_core::{EvalError, EvalValue, Evaluator, FieldChange, FormSession};
use formbar_markup::FormMarkup;
use formbar_model::{FieldName, FieldValue};

/// Evaluator answering from a table of substituted expressions. Unknown
/// expressions are rejected. Every call is logged.
#[derive(Default)]
pub struct Script {
    answers: RefCell<HashMap<String, Value>>,
    calls: RefCell<Vec<String>>,
}

impl Script {
    pub fn new(answers: &[(&str, Value)]) -> Rc<Self> {
        let script = Self::default();
        for (expr, value) in answers {
            script.set(expr, value.clone());
        }
        Rc::new(script)
    }

    pub fn set(&self, expr: &str, value: Value) {
        self.answers.borrow_mut().insert(expr.to_string(), value);
    }

    pub fn answer(&self, expr: &str) -> Result<EvalValue, EvalError> {
        self.calls.borrow_mut().push(expr.to_string());
        self.answers
            .borrow()
            .get(expr)
            .cloned()
            .ok_or_else(|| EvalError::Rejected(expr.to_string()))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }
}

pub fn scripted(script: &Rc<Script>) -> impl Evaluator + use<> {
    let script = Rc::clone(script);
    move |expr: &str| script.answer(expr)
}

pub fn session(
    markup: &str,
    answers: &[(&str, Value)],
) -> (FormSession<impl Evaluator + use<>>, Rc<Script>) {
    let form = FormMarkup::parse(markup).expect("parse form");
    let script = Script::new(answers);
    (FormSession::new(form, scripted(&script)), script)
}

pub fn change(field: &str, value: &str) -> FieldChange {
    FieldChange::new(
        FieldName::new(field).expect("field name"),
        FieldValue::scalar(value),
    )
}

pub fn name(field: &str) -> FieldName {
    FieldName::new(field).expect("field name")
}
