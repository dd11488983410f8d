//! Auto-purge schedule commands

use std::time::Duration;

use chrono::Utc;
use colored::Colorize;

use crate::cli::{CommandContext, HostArgs, OutputFormat};
use crate::error::Result;
use crate::models::ScheduleDisplay;
use crate::output::{json, print_report, print_rows, report_line};

/// Arm the recurring task (plugin activation)
pub fn activate(ctx: &CommandContext) -> Result<()> {
    let config = ctx.coordinator.load_config();
    let armed = ctx.runner().activate(&config, Utc::now())?;

    match ctx.format {
        OutputFormat::Json => {
            let data = serde_json::json!({ "armed": armed, "task": ctx.runner().status() });
            println!("{}", json::format_json(&data)?);
        }
        _ if armed => println!(
            "{} Auto purge scheduled ({})",
            "✓".green(),
            config.auto_purge_frequency
        ),
        _ if !config.auto_purge => println!(
            "{} Auto purge is disabled; nothing scheduled",
            "○".dimmed()
        ),
        _ => println!("{} Auto purge already scheduled", "○".dimmed()),
    }

    Ok(())
}

/// Clear the recurring task (plugin deactivation)
pub fn deactivate(ctx: &CommandContext) -> Result<()> {
    let removed = ctx.runner().deactivate()?;

    match ctx.format {
        OutputFormat::Json => {
            let data = serde_json::json!({ "removed": removed });
            println!("{}", json::format_json(&data)?);
        }
        _ if removed > 0 => println!("{} Auto purge unscheduled", "✓".green()),
        _ => println!("{} No auto purge was scheduled", "○".dimmed()),
    }

    Ok(())
}

/// Show the scheduled task
pub fn status(ctx: &CommandContext) -> Result<()> {
    let task = ctx.runner().status();

    if ctx.format == OutputFormat::Pretty && task.is_none() {
        println!("{} No auto purge scheduled", "○".dimmed());
        return Ok(());
    }

    let rows: Vec<ScheduleDisplay> = task.iter().map(ScheduleDisplay::from).collect();
    print_rows(&rows, &task, ctx.format)
}

/// Run due tasks, or one purge immediately with `force`
pub async fn run(ctx: &CommandContext, force: bool, host: &HostArgs) -> Result<()> {
    let runner = ctx.runner();

    if force {
        let report = runner.tick(host.host_ref()).await?;
        return print_report(&report, ctx.format);
    }

    let ticks = runner.run_due(Utc::now(), host.host_ref()).await?;

    match ctx.format {
        OutputFormat::Json => println!("{}", json::format_json(&ticks)?),
        _ if ticks.is_empty() => println!("{} No scheduled purge is due", "○".dimmed()),
        _ => {
            for tick in &ticks {
                println!("{}", report_line(&tick.report));
            }
        }
    }

    Ok(())
}

/// Run due tasks until interrupted
pub async fn daemon(ctx: &CommandContext, poll_seconds: u64, host: &HostArgs) -> Result<()> {
    let poll = Duration::from_secs(poll_seconds.max(1));
    println!(
        "Watching {} (Ctrl-C to stop)",
        ctx.runner().schedule_store().path().display()
    );
    ctx.runner().run_forever(host.host_ref(), poll).await
}
