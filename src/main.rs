//! varnishcache CLI - manage Varnish cache settings and purge requests

use clap::Parser;

mod admin;
mod cli;
mod client;
mod config;
mod coordinator;
mod error;
mod models;
mod output;
mod schedule;

use cli::args::GlobalOptions;
use cli::{Cli, CommandContext, Commands, ScheduleCommands, SettingsCommands};
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Log to stderr; `--debug` overrides `RUST_LOG`
fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

async fn run(cli: Cli) -> Result<()> {
    let opts = GlobalOptions::from_cli(&cli);
    let context = || CommandContext::new(&opts);

    match cli.command {
        Commands::Version => {
            println!("varnishcache version {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Completion { shell } => {
            cli::completions::run(shell);
            Ok(())
        }
        Commands::Status => cli::status::run(&context()?),
        Commands::Settings(settings_cmd) => match settings_cmd {
            SettingsCommands::Show => cli::settings::show(&context()?),
            SettingsCommands::Path => cli::settings::path(&context()?),
            SettingsCommands::Set(args) => cli::settings::set(&context()?, &args),
        },
        Commands::Token { action } => cli::token::issue(&context()?, action),
        Commands::Purge { token, host } => {
            cli::purge::run(&context()?, token.as_deref(), &host).await
        }
        Commands::Event(event) => cli::event::run(&context()?, event).await,
        Commands::Schedule(schedule_cmd) => match schedule_cmd {
            ScheduleCommands::Activate => cli::schedule::activate(&context()?),
            ScheduleCommands::Deactivate => cli::schedule::deactivate(&context()?),
            ScheduleCommands::Status => cli::schedule::status(&context()?),
            ScheduleCommands::Run { force, host } => {
                cli::schedule::run(&context()?, force, &host).await
            }
            ScheduleCommands::Daemon { poll_seconds, host } => {
                cli::schedule::daemon(&context()?, poll_seconds, &host).await
            }
        },
    }
}
