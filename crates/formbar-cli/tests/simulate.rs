use std::time::Duration;

use serde_json::json;

use formbar_cli::simulate::{inspect_form, run_simulation};
use formbar_core::{EvalError, EvalValue, Unavailable};
use formbar_markup::FormMarkup;
use formbar_model::{DiagnosticKind, FieldState};

const FORM: &str = r#"
<form evalurl="/rules/evaluate">
  <input type="text" name="age" datatype="integer" value="17"/>
  <div class="formbar-conditional readonly" id="adult" expr="$age >= 18" reset-value="true">
    <input type="text" name="license" datatype="string"/>
  </div>
</form>
"#;

fn form() -> FormMarkup {
    FormMarkup::parse(FORM).expect("parse form")
}

fn adult_rules(expr: &str) -> Result<EvalValue, EvalError> {
    match expr {
        "17 >= 18" => Ok(json!(false)),
        "20 >= 18" => Ok(json!(true)),
        other => Err(EvalError::Rejected(other.to_string())),
    }
}

fn assignments(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

#[test]
fn simulation_applies_values_in_order() {
    let result = run_simulation(
        form(),
        adult_rules,
        &assignments(&[("age", "20"), ("license", "B-1234")]),
        Duration::from_millis(750),
    )
    .expect("simulate");

    assert!(!result.has_errors());
    insta::assert_json_snapshot!(result, @r#"
    {
      "fields": [
        {
          "name": "age",
          "kind": "text",
          "state": "active",
          "value": "20",
          "hidden": false,
          "readonly": false,
          "required": false,
          "desired": false
        },
        {
          "name": "license",
          "kind": "text",
          "state": "active",
          "value": "B-1234",
          "hidden": false,
          "readonly": false,
          "required": false,
          "desired": false
        }
      ],
      "conditionals": [
        {
          "id": "adult",
          "expr": "$age >= 18",
          "mode": "readonly",
          "result": true,
          "governs": [
            "license"
          ]
        }
      ],
      "computed": [],
      "diagnostics": [],
      "rule_failures": [],
      "aborted": false
    }
    "#);
}

#[test]
fn without_an_evaluator_everything_fails_closed() {
    let result = run_simulation(
        form(),
        Unavailable,
        &assignments(&[("age", "20")]),
        Duration::from_millis(750),
    )
    .expect("simulate");

    let license = result
        .fields
        .iter()
        .find(|f| f.name.as_str() == "license")
        .expect("license");
    assert_eq!(license.state, FieldState::Inactive);
    assert!(license.readonly);
    assert!(!license.hidden);
    assert_eq!(result.conditionals[0].result, Some(false));
    assert!(
        result
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::EvaluationFailure)
    );
    assert!(!result.diagnostics.is_empty());
    assert!(!result.has_errors());
}

#[test]
fn editing_an_inactive_field_fails() {
    let err = run_simulation(
        form(),
        Unavailable,
        &assignments(&[("license", "B-1234")]),
        Duration::from_millis(750),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("set field 'license'"), "{err:#}");
}

#[test]
fn unknown_field_is_reported() {
    let err = run_simulation(
        form(),
        adult_rules,
        &assignments(&[("nope", "1")]),
        Duration::from_millis(750),
    )
    .unwrap_err();
    assert!(err.to_string().contains("no field named 'nope'"), "{err}");
}

#[test]
fn inspect_lists_dependencies_without_evaluating() {
    let report = inspect_form(form());
    assert_eq!(report.eval_url.as_deref(), Some("/rules/evaluate"));
    assert_eq!(report.index.len(), 1);
    assert_eq!(report.index[0].field, "age");
    assert_eq!(report.index[0].conditionals[0].as_str(), "adult");
    assert_eq!(report.conditionals[0].result, None);
    assert!(!report.has_errors());
}

#[test]
fn inspect_reports_undeclared_references() {
    let markup = r#"<form>
      <input type="text" name="age"/>
      <div class="formbar-conditional" id="broken" expr="$missing == 1">
        <input type="text" name="inner"/>
      </div>
    </form>"#;
    let report = inspect_form(FormMarkup::parse(markup).expect("parse"));
    assert!(report.has_errors());
    assert_eq!(
        report.diagnostics[0].kind,
        DiagnosticKind::MalformedDeclaration
    );
    assert_eq!(
        report.diagnostics[0]
            .conditional
            .as_ref()
            .map(|id| id.as_str()),
        Some("broken")
    );
}
