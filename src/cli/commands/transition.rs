//! `stageward transition` - attempt a gated stage transition.

use std::process::ExitCode;

use anyhow::Result;
use console::style;
use serde_json::json;

use crate::cli::context::{parse_stage, AppContext};
use crate::cli::output;
use crate::services::TransitionOutcome;

pub async fn execute(
    ctx: &AppContext,
    target: String,
    id: Option<String>,
    json: bool,
) -> Result<ExitCode> {
    let target = parse_stage(&target)?;
    let mut controller = ctx.open(id)?;

    let outcome = controller.transition(target).await?;
    let succeeded = outcome.succeeded();

    if json {
        print_json(&outcome, &controller.state().workflow_id)?;
    } else {
        print_human(&outcome, &controller);
    }

    if succeeded {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn print_json(outcome: &TransitionOutcome, workflow_id: &str) -> Result<()> {
    let body = match outcome {
        TransitionOutcome::Transitioned { from, to } => json!({
            "workflow_id": workflow_id, "outcome": "transitioned",
            "from": from.as_str(), "to": to.as_str(),
        }),
        TransitionOutcome::InvalidOrder { from, requested } => json!({
            "workflow_id": workflow_id, "outcome": "invalid_order",
            "from": from.as_str(), "requested": requested.as_str(),
        }),
        TransitionOutcome::Terminal { stage } => json!({
            "workflow_id": workflow_id, "outcome": "terminal", "stage": stage.as_str(),
        }),
        TransitionOutcome::NotReady { failing } => json!({
            "workflow_id": workflow_id, "outcome": "not_ready", "failing": failing,
        }),
        TransitionOutcome::GateFailed { result, reprompt } => json!({
            "workflow_id": workflow_id, "outcome": "gate_failed",
            "result": result, "reprompt": reprompt,
        }),
    };
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn print_human(outcome: &TransitionOutcome, controller: &crate::services::WorkflowController) {
    match outcome {
        TransitionOutcome::Transitioned { from, to } => {
            println!("{} {from} -> {to}", style("Transitioned").green().bold());
            println!("{}", output::pipeline_table(controller.state()));
        }
        TransitionOutcome::InvalidOrder { from, requested } => {
            println!("Cannot jump from {from} to {requested}: stages are strictly ordered.");
        }
        TransitionOutcome::Terminal { stage } => {
            println!("Workflow is terminal ({stage}); nothing to transition.");
        }
        TransitionOutcome::NotReady { failing } => {
            println!("Startup readiness failed: {}", failing.join(", "));
        }
        TransitionOutcome::GateFailed { result, reprompt } => {
            println!("{}", style("Gate refused the transition").red().bold());
            println!("{}", output::gate_result_table(result));
            println!("{reprompt}");
        }
    }
}
