//! Settings commands

use chrono::Utc;
use colored::Colorize;

use crate::admin::AdminAction;
use crate::cli::{CommandContext, OutputFormat, SettingsSetArgs};
use crate::error::Result;
use crate::models::setting_rows;
use crate::output::{json, print_rows};
use crate::schedule::runner::SyncChange;

/// Show current settings
pub fn show(ctx: &CommandContext) -> Result<()> {
    let config = ctx.coordinator.load_config();
    print_rows(&setting_rows(&config), &config, ctx.format)
}

/// Print the settings file path
pub fn path(ctx: &CommandContext) -> Result<()> {
    println!("{}", ctx.store().path().display());
    Ok(())
}

/// Save changed settings after authorization, then re-sync the schedule
pub fn set(ctx: &CommandContext, args: &SettingsSetArgs) -> Result<()> {
    let now = Utc::now();
    let (guard, principal) = ctx.admin();
    guard.authorize(&principal, AdminAction::SaveSettings, args.token.as_deref(), now)?;

    let mut config = ctx.coordinator.load_config();
    args.apply(&mut config);
    ctx.coordinator.save_config(&config)?;

    let saved = ctx.coordinator.load_config();
    let change = ctx.runner().sync(&saved, now)?;

    match ctx.format {
        OutputFormat::Json => println!("{}", json::format_json(&saved)?),
        _ => {
            println!("{} Settings saved successfully.", "✓".green());
            println!("  {}", ctx.store().path().display().to_string().dimmed());
            match change {
                SyncChange::Armed => println!("  Auto purge scheduled ({})", saved.auto_purge_frequency),
                SyncChange::Rearmed => println!("  Auto purge rescheduled ({})", saved.auto_purge_frequency),
                SyncChange::Cleared => println!("  Auto purge unscheduled"),
                SyncChange::Unchanged => {}
            }
        }
    }

    Ok(())
}
