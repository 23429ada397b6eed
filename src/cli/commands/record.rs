//! `stageward todo`, `evidence`, and `submit` - record factories and raw
//! stage outputs.

use std::io::Read;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::cli::context::{parse_stage, AppContext};
use crate::domain::models::TodoPriority;
use crate::services::TodoOverrides;

pub struct TodoArgs {
    pub content: String,
    pub priority: String,
    pub objective: Option<String>,
    pub success_criteria: Option<String>,
    pub fail_criteria: Option<String>,
    pub time_budget: Option<String>,
    pub id: Option<String>,
}

pub async fn execute_todo(ctx: &AppContext, args: TodoArgs, json: bool) -> Result<ExitCode> {
    let priority = TodoPriority::from_str(&args.priority)
        .with_context(|| format!("Unknown priority: {}", args.priority))?;
    let mut controller = ctx.open(args.id)?;

    let overrides = TodoOverrides {
        objective: args.objective,
        success_criteria: args.success_criteria,
        fail_criteria: args.fail_criteria,
        time_budget: args.time_budget,
        ..TodoOverrides::default()
    };
    let todo = controller.create_todo(args.content, priority, overrides)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&todo)?);
    } else {
        println!("Recorded todo {} in stage {}", todo.id, todo.metadata.workflow_stage);
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn execute_evidence(
    ctx: &AppContext,
    claim: String,
    stage: Option<String>,
    location: Option<String>,
    id: Option<String>,
    json: bool,
) -> Result<ExitCode> {
    let mut controller = ctx.open(id)?;
    let stage = match stage.as_deref() {
        Some(name) => parse_stage(name)?,
        None => controller.state().current_stage,
    };

    let record = controller.create_evidence(stage, claim, location)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("Recorded evidence {} at {}", record.id, record.location);
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn execute_submit(
    ctx: &AppContext,
    record: Option<String>,
    stage: Option<String>,
    id: Option<String>,
    json: bool,
) -> Result<ExitCode> {
    let raw = match record {
        Some(raw) => raw,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read record from stdin")?;
            buf
        }
    };
    let value: Value = serde_json::from_str(&raw).context("Record is not valid JSON")?;
    if !value.is_object() {
        bail!("Record must be a JSON object");
    }

    let mut controller = ctx.open(id)?;
    let stage = match stage.as_deref() {
        Some(name) => parse_stage(name)?,
        None => controller.state().current_stage,
    };

    let registry = controller.evaluator().registry();
    let detected = registry.detect(&value);
    let validation = detected.map(|name| registry.validate(&value, name));

    controller.record_output(stage, value)?;

    let errors: Vec<String> = validation.map(|(_, errors)| errors).unwrap_or_default();
    if json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({
            "stage": stage.as_str(),
            "detected_schema": detected,
            "errors": errors,
        }))?);
    } else {
        match detected {
            Some(name) => println!("Recorded {name} output for stage {stage}"),
            None => println!("Recorded unclassified output for stage {stage} (matches no schema)"),
        }
        if !errors.is_empty() {
            println!("Warning: record does not satisfy its schema yet:");
            for error in &errors {
                println!("  - {error}");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
