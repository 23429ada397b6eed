//! `stageward status` - show a workflow's pipeline position.

use std::process::ExitCode;

use anyhow::Result;

use crate::cli::context::AppContext;
use crate::cli::output;
use crate::domain::ports::StateStore;

pub async fn execute(ctx: &AppContext, id: Option<String>, json: bool) -> Result<ExitCode> {
    let id = ctx.resolve_id(id)?;
    let state = ctx.store.load(&id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        println!("{}", output::status_summary(&state));
        println!();
        println!("{}", output::pipeline_table(&state));
    }
    Ok(ExitCode::SUCCESS)
}
