//! `stageward watch` - run the reprompt scheduler in the foreground.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use serde_json::json;

use crate::cli::context::AppContext;
use crate::services::reprompt::{RepromptScheduler, SchedulerConfig};

pub async fn execute(
    ctx: &AppContext,
    id: Option<String>,
    interval: Option<u64>,
    json: bool,
) -> Result<ExitCode> {
    let id = ctx.resolve_id(id)?;
    // Fail before spawning if the workflow does not exist.
    let state = crate::domain::ports::StateStore::load(ctx.store.as_ref(), &id)?;

    let config = SchedulerConfig {
        interval: interval.map_or_else(|| ctx.scheduler_interval(), Duration::from_secs),
        join_timeout: Duration::from_secs(ctx.config.scheduler.join_timeout_secs),
    };
    let interval = config.interval;

    let scheduler = RepromptScheduler::new(&id, ctx.store.clone(), ctx.evaluator(), config);
    let handle = scheduler.spawn();

    if !json {
        println!(
            "Watching workflow {} (stage {}), checking every {}s. Ctrl-C to stop.",
            id,
            state.current_stage,
            interval.as_secs()
        );
    }

    tokio::signal::ctrl_c().await?;
    handle.stop().await?;

    let status = handle.status().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&json!({
            "workflow_id": id,
            "checks": status.check_count,
            "skipped": status.skip_count,
            "failures": status.fail_count,
            "last_action": status.last_action.map(|a| a.as_str()),
        }))?);
    } else {
        println!(
            "Stopped after {} checks ({} skipped, {} failures).",
            status.check_count, status.skip_count, status.fail_count
        );
    }
    Ok(ExitCode::SUCCESS)
}
