//! `stageward check` - run the quality gate without transitioning.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::cli::context::{parse_stage, AppContext};
use crate::cli::output;
use crate::domain::models::GateAction;

pub async fn execute(
    ctx: &AppContext,
    id: Option<String>,
    stage: Option<String>,
    outputs: Option<PathBuf>,
    json: bool,
) -> Result<ExitCode> {
    let controller = ctx.open(id)?;
    let stage = stage.as_deref().map(parse_stage).transpose()?;

    let (result, seq) = match outputs {
        // Check records from a file instead of the persisted stage outputs.
        Some(path) => {
            let stage = stage.unwrap_or(controller.state().current_stage);
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let parsed: Value = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not valid JSON", path.display()))?;
            let records: Vec<Value> = match parsed {
                Value::Array(items) => items,
                other => vec![other],
            };
            let retry = controller.state().retry_count(stage);
            controller.evaluator().evaluate_and_log(
                ctx.store.as_ref(),
                &controller.state().workflow_id,
                stage,
                &records,
                retry,
            )?
        }
        None => controller.check(stage)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&json!({
            "workflow_id": controller.state().workflow_id,
            "seq": seq,
            "result": result,
        }))?);
    } else {
        println!("{}", output::gate_result_table(&result));
        for error in &result.errors {
            println!("  - {error}");
        }
    }

    // Exit code is the contract: 0 only on PROCEED.
    if result.action == GateAction::Proceed {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
