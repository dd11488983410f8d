//! CLI command definitions and handlers

use clap::{Args, Parser, Subcommand};
pub use clap_complete::Shell;

use crate::admin::AdminAction;
use crate::config::CacheConfig;
use crate::coordinator::{ContentChangeEvent, PostSnapshot};
use crate::schedule::Frequency;

pub mod args;
pub mod completions;
pub mod context;
pub mod event;
pub mod purge;
pub mod schedule;
pub mod settings;
pub mod status;
pub mod token;

pub use args::{HostArgs, OutputFormat};
pub use context::CommandContext;

/// varnishcache - manage Varnish cache settings and purge requests
#[derive(Parser, Debug)]
#[command(name = "varnishcache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json)
    #[arg(
        long,
        global = true,
        env = "VARNISHCACHE_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override settings file location
    #[arg(long, global = true, env = "VARNISHCACHE_CONFIG", hide_env = true)]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true, env = "VARNISHCACHE_DEBUG", hide_env = true)]
    pub debug: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show cache configuration and schedule status
    Status,

    /// Display version information
    Version,

    /// View and change cache settings
    #[command(subcommand)]
    Settings(SettingsCommands),

    /// Issue an anti-forgery token for an administrative action
    #[command(after_help = "EXAMPLES:\n  \
        TOKEN=$(varnishcache token purge-entire-cache)\n  \
        varnishcache purge --token \"$TOKEN\" --host example.com")]
    Token {
        /// Action the token authorizes
        #[arg(value_enum)]
        action: AdminAction,
    },

    /// Purge the entire cache for the current host
    Purge {
        /// Anti-forgery token from `varnishcache token purge-entire-cache`
        #[arg(long, env = "VARNISHCACHE_TOKEN", hide_env = true)]
        token: Option<String>,

        #[command(flatten)]
        host: HostArgs,
    },

    /// Report a content change; purges when the settings allow it
    #[command(subcommand)]
    Event(EventCommands),

    /// Manage the recurring auto-purge task
    #[command(subcommand)]
    Schedule(ScheduleCommands),

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Settings subcommands
#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Show current settings
    Show,

    /// Print the settings file path
    Path,

    /// Change settings (requires a save-settings token)
    Set(SettingsSetArgs),
}

/// Fields to change; anything omitted keeps its current value
#[derive(Debug, Clone, Args, Default)]
pub struct SettingsSetArgs {
    /// Enable purging
    #[arg(long)]
    pub enabled: Option<bool>,

    /// Development mode (suppresses purging)
    #[arg(long = "dev-mode")]
    pub dev_mode: Option<bool>,

    /// Cache server as host[:port]; empty to unconfigure
    #[arg(long)]
    pub server: Option<String>,

    /// Cache lifetime in seconds
    #[arg(long = "cache-lifetime")]
    pub cache_lifetime: Option<u64>,

    /// Cache tag prefix
    #[arg(long = "tag-prefix")]
    pub tag_prefix: Option<String>,

    /// Comma-separated query parameters that disable caching
    #[arg(long = "excluded-params", value_delimiter = ',')]
    pub excluded_params: Option<Vec<String>>,

    /// URL pattern exempt from caching (repeatable; replaces the list)
    #[arg(long = "exclude")]
    pub excludes: Option<Vec<String>>,

    /// Site base URL, used when no host is given
    #[arg(long = "site-url")]
    pub site_url: Option<String>,

    /// Arm the recurring auto-purge task
    #[arg(long = "auto-purge")]
    pub auto_purge: Option<bool>,

    /// Auto-purge frequency
    #[arg(long, value_enum)]
    pub frequency: Option<Frequency>,

    /// Anti-forgery token from `varnishcache token save-settings`
    #[arg(long, env = "VARNISHCACHE_TOKEN", hide_env = true)]
    pub token: Option<String>,
}

impl SettingsSetArgs {
    /// Apply the supplied fields over `config`
    pub fn apply(&self, config: &mut CacheConfig) {
        if let Some(enabled) = self.enabled {
            config.enabled = enabled;
        }
        if let Some(dev_mode) = self.dev_mode {
            config.dev_mode = dev_mode;
        }
        if let Some(ref server) = self.server {
            config.server = server.clone();
        }
        if let Some(lifetime) = self.cache_lifetime {
            config.cache_lifetime = lifetime;
        }
        if let Some(ref prefix) = self.tag_prefix {
            config.tag_prefix = prefix.clone();
        }
        if let Some(ref params) = self.excluded_params {
            config.excluded_params = params.clone();
        }
        if let Some(ref excludes) = self.excludes {
            config.excludes = excludes.clone();
        }
        if let Some(ref site_url) = self.site_url {
            config.site_url = site_url.clone();
        }
        if let Some(auto_purge) = self.auto_purge {
            config.auto_purge = auto_purge;
        }
        if let Some(frequency) = self.frequency {
            config.auto_purge_frequency = frequency;
        }
    }
}

/// Content-change event kinds reported by the hook layer
#[derive(Subcommand, Debug)]
pub enum EventCommands {
    /// A post was created or updated
    PostSaved {
        /// Post ID
        #[arg(long)]
        id: Option<u64>,

        /// Post type
        #[arg(long = "type", default_value = "post")]
        post_type: String,

        /// The save came from autosave
        #[arg(long)]
        autosave: bool,

        /// The saved object is a revision
        #[arg(long)]
        revision: bool,

        /// The post type is not publicly visible
        #[arg(long = "not-public")]
        not_public: bool,

        #[command(flatten)]
        host: HostArgs,
    },

    /// A post was deleted
    PostDeleted {
        /// Post ID
        #[arg(long)]
        id: Option<u64>,

        #[command(flatten)]
        host: HostArgs,
    },

    /// A comment was added, edited, or deleted
    Comment {
        /// Comment ID
        #[arg(long)]
        id: Option<u64>,

        #[command(flatten)]
        host: HostArgs,
    },

    /// A taxonomy term was created, edited, or deleted
    Term {
        /// Term ID
        #[arg(long)]
        id: Option<u64>,

        /// Taxonomy name
        #[arg(long)]
        taxonomy: Option<String>,

        #[command(flatten)]
        host: HostArgs,
    },

    /// A manual purge request routed through the settings checks
    Manual {
        #[command(flatten)]
        host: HostArgs,
    },
}

impl EventCommands {
    /// Split into the event and the host it was reported for
    pub fn into_parts(self) -> (ContentChangeEvent, HostArgs) {
        match self {
            EventCommands::PostSaved {
                id,
                post_type,
                autosave,
                revision,
                not_public,
                host,
            } => (
                ContentChangeEvent::PostSaved(PostSnapshot {
                    post_id: id,
                    autosave,
                    revision,
                    public: !not_public,
                    ..PostSnapshot::public(&post_type)
                }),
                host,
            ),
            EventCommands::PostDeleted { id, host } => {
                (ContentChangeEvent::PostDeleted { post_id: id }, host)
            }
            EventCommands::Comment { id, host } => {
                (ContentChangeEvent::CommentChanged { comment_id: id }, host)
            }
            EventCommands::Term { id, taxonomy, host } => (
                ContentChangeEvent::TermChanged {
                    term_id: id,
                    taxonomy,
                },
                host,
            ),
            EventCommands::Manual { host } => (ContentChangeEvent::Manual, host),
        }
    }
}

/// Auto-purge schedule subcommands
#[derive(Subcommand, Debug)]
pub enum ScheduleCommands {
    /// Arm the recurring task if auto purge is enabled and it is not armed
    Activate,

    /// Clear the recurring task
    Deactivate,

    /// Show the scheduled task
    Status,

    /// Run due tasks now
    Run {
        /// Run one purge immediately even if nothing is due
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        host: HostArgs,
    },

    /// Keep running due tasks until interrupted
    Daemon {
        /// Seconds between checks for due tasks
        #[arg(long = "poll-seconds", default_value_t = 60)]
        poll_seconds: u64,

        #[command(flatten)]
        host: HostArgs,
    },
}
