//! Status command implementation

use colored::Colorize;

use crate::cli::{CommandContext, OutputFormat};
use crate::error::Result;
use crate::output::json;

/// Run the status command to display configuration status
pub fn run(ctx: &CommandContext) -> Result<()> {
    let store = ctx.store();
    let config = ctx.coordinator.load_config();
    let task = ctx.runner().status();

    if ctx.format == OutputFormat::Json {
        let data = serde_json::json!({
            "settingsPath": store.path().display().to_string(),
            "settingsFound": store.exists(),
            "purgingActive": config.purging_active(),
            "settings": config,
            "schedule": task,
        });
        println!("{}", json::format_json(&data)?);
        return Ok(());
    }

    println!("{}\n", "Varnish Cache Status".bold());
    println!("Settings file: {}", store.path().display().to_string().cyan());

    if !store.exists() {
        println!("{} Settings file not found (using defaults)", "⚠".yellow());
        println!("  → Run 'varnishcache settings set' to create it");
    }

    println!();

    if config.enabled {
        println!("{} Purging enabled", "✓".green());
    } else {
        println!("{} Purging disabled", "✗".red());
    }

    if config.dev_mode {
        println!("{} Dev mode on (purges suppressed)", "⚠".yellow());
    }

    if config.server.is_empty() {
        println!("{} No cache server configured", "✗".red());
        println!("  → Run 'varnishcache settings set --server <HOST:PORT>'");
    } else {
        println!("{} Cache server: {}", "✓".green(), config.server);
    }

    let tag_prefix = ctx.coordinator.tag_prefix();
    if !tag_prefix.is_empty() {
        println!("{} Cache tag prefix: {}", "○".dimmed(), tag_prefix);
    }

    match config.site_host() {
        Some(host) => println!("{} Site host: {}", "○".dimmed(), host),
        None => println!("{} No site URL set (hosts must be given explicitly)", "○".dimmed()),
    }

    match task {
        Some(task) => println!(
            "{} Auto purge {} (next run {})",
            "✓".green(),
            task.frequency,
            task.next_run
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
        ),
        None if config.auto_purge => println!(
            "{} Auto purge enabled but not scheduled",
            "⚠".yellow()
        ),
        None => println!("{} Auto purge off", "○".dimmed()),
    }

    println!();
    Ok(())
}
