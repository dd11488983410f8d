//! Common CLI types shared across commands

use clap::Args;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty format - human-optimized rich formatting
    #[default]
    Pretty,
    /// Table format - one row per setting
    Table,
    /// JSON format - structured for scripts
    Json,
}

/// Host whose cached content should be purged
#[derive(Debug, Clone, Args, Default)]
pub struct HostArgs {
    /// Host to purge (the current request's Host); falls back to the site URL
    #[arg(long, env = "VARNISHCACHE_HOST", hide_env = true)]
    pub host: Option<String>,
}

impl HostArgs {
    /// Get the host as `Option<&str>`, treating blank values as absent
    pub fn host_ref(&self) -> Option<&str> {
        self.host.as_deref().map(str::trim).filter(|h| !h.is_empty())
    }
}
