//! Command execution context
//!
//! Provides a unified context for command execution, eliminating boilerplate
//! for settings-store resolution and coordinator construction.

use crate::admin::{AdminGuard, LocalOperator};
use crate::cli::OutputFormat;
use crate::cli::args::GlobalOptions;
use crate::client::VarnishClient;
use crate::config::SettingsStore;
use crate::coordinator::InvalidationCoordinator;
use crate::error::Result;
use crate::schedule::ScheduledPurgeRunner;

/// Context for command execution containing the coordinator and runtime options.
///
/// Settings are not cached here; the coordinator re-reads them on each call.
pub struct CommandContext {
    /// Coordinator wired to the resolved settings file
    pub coordinator: InvalidationCoordinator<VarnishClient>,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Create a new command context.
    ///
    /// # Errors
    /// Returns error if the settings path cannot be resolved or the HTTP
    /// client cannot be built.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let store = SettingsStore::at(opts.config_ref())?;
        let client = VarnishClient::new()?;

        Ok(Self {
            coordinator: InvalidationCoordinator::new(store, client),
            format: opts.format,
        })
    }

    pub fn store(&self) -> &SettingsStore {
        self.coordinator.store()
    }

    /// Scheduled-purge runner sharing this context's coordinator
    pub fn runner(&self) -> ScheduledPurgeRunner<'_, VarnishClient> {
        ScheduledPurgeRunner::new(&self.coordinator)
    }

    /// Authorization guard and the principal invoking the command
    pub fn admin(&self) -> (AdminGuard, LocalOperator) {
        let store = self.store();
        (AdminGuard::for_store(store), LocalOperator::detect(store))
    }
}
