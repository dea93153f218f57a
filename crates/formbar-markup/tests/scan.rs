//! Integration tests for the form-load scan.

use formbar_markup::{FormMarkup, MarkupError};
use formbar_model::{ConditionalMode, Datatype, FieldKind, FieldValue, RuleKind};

const FORM: &str = r#"
<div class="formbar-form">
  <form evalurl="/rules/evaluate" method="POST">
    <div formgroup="person">
      <input type="text" name="age" datatype="integer" value="17">
      <input type="checkbox" name="hobbies" datatype="string" value="chess" checked>
      <input type="checkbox" name="hobbies" datatype="string" value="music" checked="checked"/>
      <input type="checkbox" name="hobbies" datatype="string" value="golf"/>
    </div>
    <div class="formbar-conditional readonly" id="adult" expr="$age >= 18" reset-value="true">
      <input type="text" name="license_number" datatype="string" desired="true"/>
      <div class="formbar-conditional" expr="$license_number != None">
        <select name="license_class" datatype="string" required="true">
          <option value="">--</option>
          <option value="B" selected="selected">B</option>
        </select>
      </div>
    </div>
    <input type="radio" name="smoker" datatype="boolean" value="true"/>
    <input type="radio" name="smoker" datatype="boolean" value="false" checked/>
    <textarea name="notes" datatype="text" rules="len($notes) &lt; 200,warning">Hello
world</textarea>
    <div name="bmi" value="22.5">22.5 kg/m2</div>
    <div class="formbar-evaluate" id="years_left" expr="18 - $age"/>
    <input type="submit" name="save" value="Save"/>
  </form>
</div>
"#;

fn scan() -> FormMarkup {
    FormMarkup::parse(FORM).expect("scan form")
}

#[test]
fn collects_fields_in_document_order() {
    let form = scan();
    let names: Vec<&str> = form.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "age",
            "hobbies",
            "license_number",
            "license_class",
            "smoker",
            "notes",
            "bmi"
        ]
    );
    assert_eq!(form.eval_url.as_deref(), Some("/rules/evaluate"));
}

#[test]
fn reads_field_attributes_and_initial_values() {
    let form = scan();

    let age = form.field("age").unwrap();
    assert_eq!(age.kind, FieldKind::Text);
    assert_eq!(age.datatype, Datatype::Number);
    assert_eq!(age.value, FieldValue::scalar("17"));
    assert_eq!(age.group.as_deref(), Some("person"));

    let hobbies = form.field("hobbies").unwrap();
    assert_eq!(hobbies.kind, FieldKind::Checkbox);
    assert_eq!(hobbies.value, FieldValue::list(["chess", "music"]));

    let smoker = form.field("smoker").unwrap();
    assert_eq!(smoker.value, FieldValue::scalar("false"));
    assert_eq!(smoker.group, None);

    let class = form.field("license_class").unwrap();
    assert_eq!(class.kind, FieldKind::Select);
    assert_eq!(class.value, FieldValue::scalar("B"));
    assert!(class.required);
    assert!(class.decoration.required_marked);

    let notes = form.field("notes").unwrap();
    assert_eq!(notes.kind, FieldKind::Textarea);
    assert_eq!(notes.value, FieldValue::scalar("Hello\nworld"));
    assert_eq!(notes.rules.len(), 1);
    assert_eq!(notes.rules[0].expr, "len($notes) < 200");
    assert_eq!(notes.rules[0].kind, RuleKind::Warning);

    let bmi = form.field("bmi").unwrap();
    assert_eq!(bmi.kind, FieldKind::Static);
    assert_eq!(bmi.value, FieldValue::scalar("22.5"));

    let license = form.field("license_number").unwrap();
    assert!(license.desired);
    assert!(license.decoration.desired_marked);

    assert!(form.field("save").is_none());
}

#[test]
fn nested_conditionals_govern_inner_fields() {
    let form = scan();
    assert_eq!(form.conditionals.len(), 2);

    let adult = form.conditional("adult").unwrap();
    assert_eq!(adult.mode, ConditionalMode::ReadOnly);
    assert!(adult.reset_on_deactivate);
    assert_eq!(adult.position, 0);
    let governed: Vec<&str> = adult.governs.iter().map(|f| f.as_str()).collect();
    assert_eq!(governed, vec!["license_number", "license_class"]);

    let inner = form.conditional("conditional-1").unwrap();
    assert_eq!(inner.mode, ConditionalMode::Visibility);
    assert!(!inner.reset_on_deactivate);
    assert_eq!(inner.expr, "$license_number != None");
    let governed: Vec<&str> = inner.governs.iter().map(|f| f.as_str()).collect();
    assert_eq!(governed, vec!["license_class"]);
}

#[test]
fn computed_fields_are_collected() {
    let form = scan();
    assert_eq!(form.computed.len(), 1);
    assert_eq!(form.computed[0].id, "years_left");
    assert_eq!(form.computed[0].expr, "18 - $age");
}

#[test]
fn duplicate_conditional_ids_are_rejected() {
    let markup = r#"<form>
        <div class="formbar-conditional" id="c" expr="$a"></div>
        <div class="formbar-conditional" id="c" expr="$b"></div>
    </form>"#;
    let err = FormMarkup::parse(markup).unwrap_err();
    assert!(matches!(err, MarkupError::DuplicateConditional(id) if id == "c"));
}

#[test]
fn conditional_without_expr_is_rejected() {
    let markup = r#"<form><div class="formbar-conditional" id="c"></div></form>"#;
    let err = FormMarkup::parse(markup).unwrap_err();
    assert!(matches!(err, MarkupError::MissingExpr { .. }));
}

#[test]
fn serializes_to_json() {
    let form = scan();
    let json = serde_json::to_value(&form).expect("serialize form");
    assert_eq!(json["conditionals"][0]["id"], "adult");
    assert_eq!(json["fields"][0]["datatype"], "number");
}
