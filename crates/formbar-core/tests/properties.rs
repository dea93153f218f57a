mod common;

use proptest::prelude::*;
use serde_json::json;

use formbar_core::{
    DependencyIndex, EvalError, EvalValue, Evaluator, FormSession, referenced_fields,
};
use formbar_markup::FormMarkup;
use formbar_model::{
    ConditionalId, ConditionalMode, ConditionalRecord, FieldRecord, FieldValue,
};

use common::change;

const IDS: [&str; 3] = ["outer", "inner", "resetting"];

const FORM: &str = r#"
<form>
  <input type="text" name="t0"/>
  <input type="text" name="t1"/>
  <input type="text" name="t2"/>
  <div class="formbar-conditional" id="outer" expr="$t0">
    <input type="text" name="a" datatype="string" value="alpha"/>
    <div class="formbar-conditional readonly" id="inner" expr="$t1">
      <input type="text" name="b" datatype="string" value="beta" required="true"/>
    </div>
  </div>
  <div class="formbar-conditional" id="resetting" expr="$t2" reset-value="true">
    <input type="checkbox" name="c" value="x" checked="checked"/>
    <input type="text" name="d" datatype="string" desired="true"/>
  </div>
</form>
"#;

fn open_session() -> FormSession<impl Evaluator> {
    let form = FormMarkup::parse(FORM).expect("parse form");
    let mut session = FormSession::new(form, |_: &str| -> Result<EvalValue, EvalError> {
        Ok(json!(true))
    });
    session.initialize();
    session
}

fn snapshot<E: Evaluator>(session: &FormSession<E>) -> Vec<FieldRecord> {
    session.fields().cloned().collect()
}

fn assert_consistent<E: Evaluator>(session: &FormSession<E>) -> Result<(), TestCaseError> {
    for field in session.fields() {
        if field.is_active() {
            prop_assert!(!field.decoration.hidden, "{} active but hidden", field.name);
            prop_assert!(!field.decoration.readonly, "{} active but readonly", field.name);
        } else {
            prop_assert!(field.decoration.readonly, "{} inactive but editable", field.name);
            prop_assert!(!field.decoration.required_marked);
            prop_assert!(!field.decoration.desired_marked);
        }
    }
    Ok(())
}

fn result_strategy() -> impl Strategy<Value = Result<bool, u16>> {
    prop_oneof![any::<bool>().prop_map(Ok), (400u16..600).prop_map(Err)]
}

fn to_eval(result: Result<bool, u16>) -> Result<EvalValue, EvalError> {
    result.map(|b| json!(b)).map_err(EvalError::Status)
}

fn expr_strategy() -> impl Strategy<Value = String> {
    let token = prop_oneof![
        "\\$[a-c]".prop_map(String::from),
        "\\$[a-c]\\.x".prop_map(String::from),
        Just("==".to_string()),
        Just("and".to_string()),
        "[0-9]{1,2}".prop_map(String::from),
    ];
    proptest::collection::vec(token, 1..6).prop_map(|tokens| tokens.join(" "))
}

fn records(exprs: &[String]) -> Vec<ConditionalRecord> {
    exprs
        .iter()
        .enumerate()
        .map(|(position, expr)| ConditionalRecord {
            id: ConditionalId::generated(position),
            expr: expr.clone(),
            governs: Vec::new(),
            reset_on_deactivate: false,
            mode: ConditionalMode::Visibility,
            position,
        })
        .collect()
}

proptest! {
    #[test]
    fn index_build_is_deterministic(exprs in proptest::collection::vec(expr_strategy(), 0..8)) {
        let conditionals = records(&exprs);
        let index = DependencyIndex::build(&conditionals);
        prop_assert_eq!(&DependencyIndex::build(&conditionals), &index);

        for conditional in &conditionals {
            for name in referenced_fields(&conditional.expr) {
                let dependants = index.dependants(name);
                prop_assert_eq!(
                    dependants.iter().filter(|id| **id == conditional.id).count(),
                    1
                );
            }
        }
        for (_, dependants) in index.iter() {
            let positions: Vec<usize> = dependants
                .iter()
                .map(|id| conditionals.iter().position(|c| &c.id == id).unwrap())
                .collect();
            prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn repeated_result_is_a_no_op(
        steps in proptest::collection::vec((0usize..3, result_strategy()), 1..24)
    ) {
        let mut session = open_session();
        for (index, result) in steps {
            session.reconcile(IDS[index], to_eval(result)).expect("reconcile");
            assert_consistent(&session)?;
            let before = snapshot(&session);

            let again = session.reconcile(IDS[index], to_eval(result)).expect("reconcile");
            prop_assert!(again.effects.is_empty());
            prop_assert!(again.transitioned.is_empty());
            prop_assert_eq!(snapshot(&session), before);
        }
    }

    #[test]
    fn failures_never_activate(
        steps in proptest::collection::vec((0usize..3, any::<bool>()), 0..16),
        failing in 0usize..3,
        status in 400u16..600,
    ) {
        let mut session = open_session();
        for (index, result) in steps {
            session.reconcile(IDS[index], Ok(json!(result))).expect("reconcile");
        }
        session.reconcile(IDS[failing], Err(EvalError::Status(status))).expect("reconcile");

        prop_assert_eq!(session.conditional_result(IDS[failing]), Some(false));
        let governed = session.conditionals()[failing].governs.clone();
        for name in governed {
            prop_assert!(!session.field(name.as_str()).unwrap().is_active());
        }
        assert_consistent(&session)?;
    }

    #[test]
    fn reset_region_restores_the_entered_value(value in "[a-z][a-z0-9 ]{0,11}") {
        let mut session = open_session();
        session.set_value(change("d", &value)).expect("set d");

        session.reconcile("resetting", Err(EvalError::Transport("down".into()))).expect("reconcile");
        prop_assert_eq!(&session.field("d").unwrap().value, &FieldValue::Unset);
        prop_assert_eq!(&session.field("c").unwrap().value, &FieldValue::List(Vec::new()));

        session.reconcile("resetting", Ok(json!(true))).expect("reconcile");
        prop_assert_eq!(&session.field("d").unwrap().value, &FieldValue::scalar(value.as_str()));
        prop_assert_eq!(&session.field("c").unwrap().value, &FieldValue::list(["x"]));
        assert_consistent(&session)?;
    }
}
