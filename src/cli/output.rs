//! Table and text output formatting for CLI commands.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};

use crate::domain::models::{GateAction, GateResult, Stage, WorkflowState, STAGE_ORDER};
use crate::domain::ports::ReadinessReport;
use crate::services::SchemaRegistry;

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_BORDERS_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header(cells: Vec<&str>) -> Vec<Cell> {
    cells.into_iter().map(|c| Cell::new(c).add_attribute(Attribute::Bold)).collect()
}

/// One-line-per-stage pipeline view with completion markers.
pub fn pipeline_table(state: &WorkflowState) -> String {
    let mut table = base_table();
    table.set_header(header(vec!["Stage", "State", "Retries"]));

    for stage in STAGE_ORDER {
        let marker = if state.completed_stages.contains(&stage) {
            Cell::new("done").fg(Color::Green)
        } else if state.current_stage == stage {
            Cell::new("current").fg(Color::Yellow).add_attribute(Attribute::Bold)
        } else {
            Cell::new("pending")
        };
        let retries = state.retry_count(stage);
        table.add_row(vec![
            Cell::new(stage.as_str()),
            marker,
            Cell::new(if retries == 0 { String::from("-") } else { retries.to_string() }),
        ]);
    }
    if state.current_stage.is_terminal() {
        let color = if state.current_stage == Stage::Complete { Color::Green } else { Color::Red };
        table.add_row(vec![
            Cell::new(state.current_stage.as_str()),
            Cell::new("current").fg(color).add_attribute(Attribute::Bold),
            Cell::new("-"),
        ]);
    }
    table.to_string()
}

/// Workflow summary block.
pub fn status_summary(state: &WorkflowState) -> String {
    format!(
        "Workflow:   {}\nObjective:  {}\nStage:      {}\nStarted:    {}\nTodos:      {}\nEvidence:   {}",
        state.workflow_id,
        state.user_objective,
        state.current_stage,
        state.start_time.to_rfc3339(),
        state.todos.len(),
        state.evidence.len(),
    )
}

/// Gate verdict table.
pub fn gate_result_table(result: &GateResult) -> String {
    let mut table = base_table();
    table.set_header(header(vec!["Field", "Value"]));

    let action_cell = match result.action {
        GateAction::Proceed => Cell::new("PROCEED").fg(Color::Green),
        GateAction::Revise => Cell::new("REVISE").fg(Color::Yellow),
        GateAction::Escalate => Cell::new("ESCALATE").fg(Color::Magenta),
        GateAction::Stop => Cell::new("STOP").fg(Color::Red),
    };
    table.add_row(vec![Cell::new("Stage"), Cell::new(&result.stage)]);
    table.add_row(vec![Cell::new("Action"), action_cell]);
    table.add_row(vec![Cell::new("Valid"), Cell::new(result.valid.to_string())]);
    table.add_row(vec![Cell::new("Checked"), Cell::new(result.checked.join(", "))]);
    table.add_row(vec![Cell::new("Errors"), Cell::new(result.errors.len().to_string())]);
    table.add_row(vec![Cell::new("Retry"), Cell::new(result.retry.to_string())]);
    table.to_string()
}

/// Startup readiness checklist.
pub fn readiness_table(report: &ReadinessReport) -> String {
    let mut table = base_table();
    table.set_header(header(vec!["Check", "Result", "Detail"]));
    for check in &report.checks {
        let result = if check.passed {
            Cell::new("pass").fg(Color::Green)
        } else {
            Cell::new("fail").fg(Color::Red)
        };
        table.add_row(vec![Cell::new(&check.name), result, Cell::new(&check.detail)]);
    }
    table.to_string()
}

/// Registry reference: every schema plus the stages that require it.
pub fn schema_table(registry: &SchemaRegistry) -> String {
    let mut table = base_table();
    table.set_header(header(vec!["Schema", "Required by", "Description"]));

    for name in registry.schema_names() {
        let required_by: Vec<&str> = STAGE_ORDER
            .iter()
            .filter(|stage| registry.required_for(**stage).contains(&name))
            .map(Stage::as_str)
            .collect();
        table.add_row(vec![
            Cell::new(name),
            Cell::new(if required_by.is_empty() { "-".to_string() } else { required_by.join(", ") }),
            Cell::new(registry.description(name)),
        ]);
    }
    table.to_string()
}
