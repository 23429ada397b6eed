//! `stageward resume` - rehydrate a persisted workflow.

use std::process::ExitCode;

use anyhow::Result;

use crate::cli::context::AppContext;
use crate::cli::output;

pub async fn execute(ctx: &AppContext, id: Option<String>, json: bool) -> Result<ExitCode> {
    // Resolution fails, with a non-zero exit, when nothing is persisted.
    let controller = ctx.open(id)?;
    let state = controller.state();
    let report = controller.run_readiness().await;

    if json {
        println!("{}", serde_json::to_string_pretty(state)?);
    } else {
        println!("Resumed workflow {}", state.workflow_id);
        println!("{}", output::status_summary(state));
        println!();
        println!("{}", output::pipeline_table(state));
        println!("{}", output::readiness_table(&report));
    }
    Ok(ExitCode::SUCCESS)
}
