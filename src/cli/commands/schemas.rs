//! `stageward schemas` - registry reference for operators.

use std::process::ExitCode;

use anyhow::Result;
use serde_json::json;

use crate::cli::output;
use crate::domain::models::{Stage, STAGE_ORDER};
use crate::services::SchemaRegistry;

pub async fn execute(json: bool) -> Result<ExitCode> {
    let registry = SchemaRegistry::new();

    if json {
        let schemas: Vec<_> = registry
            .schema_names()
            .map(|name| {
                json!({
                    "name": name,
                    "description": registry.description(name),
                    "required_by": STAGE_ORDER
                        .iter()
                        .filter(|stage| registry.required_for(**stage).contains(&name))
                        .map(Stage::as_str)
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&schemas)?);
    } else {
        println!("{}", output::schema_table(&registry));
    }
    Ok(ExitCode::SUCCESS)
}
