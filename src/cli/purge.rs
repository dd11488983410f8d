//! Manual purge command

use chrono::Utc;

use crate::admin::AdminAction;
use crate::cli::{CommandContext, HostArgs};
use crate::coordinator::{PurgeReport, resolve_host};
use crate::error::{PurgeError, Result};
use crate::output::print_report;

/// Purge the entire cache for the current host.
///
/// Requires a `purge-entire-cache` token. Bypasses the enabled and dev-mode
/// flags, like the admin-bar "Purge all" action.
pub async fn run(ctx: &CommandContext, token: Option<&str>, host: &HostArgs) -> Result<()> {
    let (guard, principal) = ctx.admin();
    guard.authorize(&principal, AdminAction::PurgeEntireCache, token, Utc::now())?;

    let config = ctx.coordinator.load_config();
    let Some(host) = resolve_host(host.host_ref(), &config) else {
        return Err(PurgeError::HostUndetermined.into());
    };

    log::debug!("Manual purge of {} via {}", host, ctx.coordinator.server());
    let outcome = ctx.coordinator.purge_host(&host).await;
    print_report(&PurgeReport::Purged(outcome), ctx.format)
}
