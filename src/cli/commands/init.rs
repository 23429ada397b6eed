//! `stageward init` - create a new workflow.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use console::style;

use crate::cli::context::AppContext;
use crate::cli::output;

pub async fn execute(ctx: &AppContext, objective: String, json: bool) -> Result<ExitCode> {
    write_default_config(&ctx.config)?;

    let controller = ctx.create(&objective)?;
    let state = controller.state();
    let report = controller.run_readiness().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({
            "state": state,
            "readiness": report,
        }))?);
    } else {
        println!("{} workflow {}", style("Created").green().bold(), state.workflow_id);
        println!("{}", output::status_summary(state));
        println!();
        println!("{}", output::readiness_table(&report));
        if report.all_passed() {
            println!("Leave STARTUP with: stageward transition PLAN");
        } else {
            println!("{}: {}", style("Readiness failed").red().bold(), report.failing().join(", "));
        }
    }

    if report.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

// First init writes the project config so later runs and operators have a
// file to edit. Never overwrites an existing one.
fn write_default_config(config: &crate::domain::models::config::Config) -> Result<()> {
    let dir = Path::new(&config.state_root);
    let path = dir.join("config.yaml");
    if path.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let yaml = serde_yaml::to_string(config)?;
    fs::write(&path, yaml).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote default configuration");
    Ok(())
}
