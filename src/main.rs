//! Stageward CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use stageward::cli::{commands, AppContext, Cli, Commands};
use stageward::infrastructure::logging::Logger;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let ctx = match AppContext::new(cli.config.as_deref(), cli.state_root.as_deref()) {
        Ok(ctx) => ctx,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match Logger::init(
        &ctx.config.logging,
        std::path::Path::new(&ctx.config.state_root),
    ) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Init { objective } => commands::init::execute(&ctx, objective, cli.json).await,
        Commands::Check { id, stage, outputs } => {
            commands::check::execute(&ctx, id, stage, outputs, cli.json).await
        }
        Commands::Resume { id } => commands::resume::execute(&ctx, id, cli.json).await,
        Commands::Transition { target, id } => {
            commands::transition::execute(&ctx, target, id, cli.json).await
        }
        Commands::Todo {
            content,
            priority,
            objective,
            success_criteria,
            fail_criteria,
            time_budget,
            id,
        } => {
            let args = commands::record::TodoArgs {
                content,
                priority,
                objective,
                success_criteria,
                fail_criteria,
                time_budget,
                id,
            };
            commands::record::execute_todo(&ctx, args, cli.json).await
        }
        Commands::Evidence { claim, stage, location, id } => {
            commands::record::execute_evidence(&ctx, claim, stage, location, id, cli.json).await
        }
        Commands::Submit { record, stage, id } => {
            commands::record::execute_submit(&ctx, record, stage, id, cli.json).await
        }
        Commands::Status { id } => commands::status::execute(&ctx, id, cli.json).await,
        Commands::Schemas => commands::schemas::execute(cli.json).await,
        Commands::Watch { id, interval } => {
            commands::watch::execute(&ctx, id, interval, cli.json).await
        }
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            if cli.json {
                eprintln!("{}", serde_json::json!({ "error": format!("{err:#}") }));
            } else {
                eprintln!("Error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
