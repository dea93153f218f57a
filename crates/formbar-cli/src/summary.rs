use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use formbar_cli::simulate::{
    ComputedSummary, ConditionalSummary, FieldSummary, IndexEntry, InspectReport,
    SimulationResult,
};
use formbar_core::RuleOutcome;
use formbar_model::{ConditionalId, Diagnostic, FieldName, RuleKind, Severity};

pub fn print_inspect(report: &InspectReport) {
    match &report.eval_url {
        Some(url) => println!("Evaluator: {url}"),
        None => println!("Evaluator: -"),
    }
    println!("{}", fields_table(&report.fields));
    if !report.conditionals.is_empty() {
        println!();
        println!("Conditionals:");
        println!("{}", conditionals_table(&report.conditionals));
        println!();
        println!("Dependencies:");
        println!("{}", index_table(&report.index));
    }
    print_computed(&report.computed);
    print_diagnostics(&report.diagnostics);
}

pub fn print_simulation(result: &SimulationResult) {
    println!("{}", fields_table(&result.fields));
    if !result.conditionals.is_empty() {
        println!();
        println!("Conditionals:");
        println!("{}", conditionals_table(&result.conditionals));
    }
    print_computed(&result.computed);
    if !result.rule_failures.is_empty() {
        println!();
        println!("Failing rules:");
        println!("{}", rules_table(&result.rule_failures));
    }
    print_diagnostics(&result.diagnostics);
    if result.aborted {
        eprintln!("A dispatch chain was aborted by a cascade cycle.");
    }
}

fn print_computed(computed: &[ComputedSummary]) {
    if computed.is_empty() {
        return;
    }
    println!();
    println!("Computed:");
    println!("{}", computed_table(computed));
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    println!();
    println!("Diagnostics:");
    println!("{}", diagnostics_table(diagnostics));
}

pub fn fields_table(fields: &[FieldSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Kind"),
        header_cell("State"),
        header_cell("Value"),
        header_cell("Hidden"),
        header_cell("Read-only"),
        header_cell("Marked"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Center);
    align_column(&mut table, 5, CellAlignment::Center);
    for field in fields {
        let marked = if field.required {
            Cell::new("required").fg(Color::Red)
        } else if field.desired {
            Cell::new("desired").fg(Color::Yellow)
        } else {
            dim_cell("-")
        };
        table.add_row(vec![
            Cell::new(field.name.as_str())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(field.kind.as_str()),
            state_cell(field.state.is_active()),
            value_cell(&field.value),
            flag_cell(field.hidden),
            flag_cell(field.readonly),
            marked,
        ]);
    }
    table
}

pub fn conditionals_table(conditionals: &[ConditionalSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Conditional"),
        header_cell("Expression"),
        header_cell("Mode"),
        header_cell("Result"),
        header_cell("Governs"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Center);
    for conditional in conditionals {
        let result = match conditional.result {
            Some(true) => Cell::new("true").fg(Color::Green),
            Some(false) => Cell::new("false").fg(Color::Red),
            None => dim_cell("-"),
        };
        let governs: Vec<&str> = conditional.governs.iter().map(FieldName::as_str).collect();
        table.add_row(vec![
            Cell::new(conditional.id.as_str()).add_attribute(Attribute::Bold),
            Cell::new(&conditional.expr),
            Cell::new(conditional.mode.as_str()),
            result,
            Cell::new(governs.join(", ")),
        ]);
    }
    table
}

pub fn index_table(index: &[IndexEntry]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Field"), header_cell("Re-evaluates")]);
    apply_table_style(&mut table);
    for entry in index {
        let conditionals: Vec<&str> = entry
            .conditionals
            .iter()
            .map(ConditionalId::as_str)
            .collect();
        table.add_row(vec![
            Cell::new(&entry.field).fg(Color::Blue),
            Cell::new(conditionals.join(", ")),
        ]);
    }
    table
}

pub fn computed_table(computed: &[ComputedSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Computed"),
        header_cell("Expression"),
        header_cell("Shows"),
    ]);
    apply_table_style(&mut table);
    for field in computed {
        table.add_row(vec![
            Cell::new(&field.id).add_attribute(Attribute::Bold),
            Cell::new(&field.expr),
            match &field.text {
                Some(text) => Cell::new(text),
                None => dim_cell("-"),
            },
        ]);
    }
    table
}

pub fn rules_table(outcomes: &[RuleOutcome]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Kind"),
        header_cell("Rule"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    for outcome in outcomes {
        let kind = match outcome.rule.kind {
            RuleKind::Error => Cell::new("ERROR").fg(Color::Red),
            RuleKind::Warning => Cell::new("WARN").fg(Color::Yellow),
            RuleKind::Info => Cell::new("INFO").fg(Color::Cyan),
        };
        table.add_row(vec![
            Cell::new(outcome.field.as_str()).fg(Color::Blue),
            kind,
            Cell::new(&outcome.rule.expr),
            Cell::new(&outcome.rule.message),
        ]);
    }
    table
}

pub fn diagnostics_table(diagnostics: &[Diagnostic]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Kind"),
        header_cell("Subject"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    for diagnostic in diagnostics {
        let subject = diagnostic
            .conditional
            .as_ref()
            .map(ToString::to_string)
            .or_else(|| diagnostic.field.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            severity_cell(diagnostic.severity()),
            Cell::new(diagnostic.kind.as_str()),
            Cell::new(subject),
            Cell::new(&diagnostic.message),
        ]);
    }
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn state_cell(active: bool) -> Cell {
    if active {
        Cell::new("active").fg(Color::Green)
    } else {
        Cell::new("inactive").fg(Color::DarkGrey)
    }
}

fn value_cell(value: &str) -> Cell {
    if value.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(value)
    }
}

fn flag_cell(set: bool) -> Cell {
    if set {
        Cell::new("✓").fg(Color::Yellow)
    } else {
        dim_cell("-")
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formbar_model::{
        ConditionalId, ConditionalMode, DiagnosticKind, FieldKind, FieldName, FieldState,
    };

    fn field(name: &str, active: bool) -> FieldSummary {
        FieldSummary {
            name: FieldName::new(name).unwrap(),
            kind: FieldKind::Text,
            state: if active {
                FieldState::Active
            } else {
                FieldState::Inactive
            },
            value: String::new(),
            hidden: !active,
            readonly: !active,
            required: active,
            desired: false,
        }
    }

    #[test]
    fn fields_table_lists_state_and_marks() {
        let table = fields_table(&[field("age", true), field("license", false)]).to_string();
        assert!(table.contains("age"));
        assert!(table.contains("license"));
        assert!(table.contains("inactive"));
        assert!(table.contains("required"));
    }

    #[test]
    fn unevaluated_conditional_shows_dash() {
        let conditional = ConditionalSummary {
            id: ConditionalId::new("adult").unwrap(),
            expr: "$age >= 18".to_string(),
            mode: ConditionalMode::ReadOnly,
            result: None,
            governs: vec![FieldName::new("license").unwrap()],
        };
        let table = conditionals_table(&[conditional]).to_string();
        assert!(table.contains("adult"));
        assert!(table.contains("$age >= 18"));
        assert!(table.contains("readonly"));
    }

    #[test]
    fn diagnostics_name_their_subject() {
        let diagnostic = Diagnostic::new(DiagnosticKind::CascadeCycle, "flipped twice")
            .with_conditional(&ConditionalId::new("loop").unwrap());
        let table = diagnostics_table(&[diagnostic]).to_string();
        assert!(table.contains("ERROR"));
        assert!(table.contains("cascade-cycle"));
        assert!(table.contains("loop"));
    }
}
