//! Content-change event command
//!
//! Entry point for hook scripts. A failed purge is reported but never turns
//! into a failing exit status, so the content operation that fired the hook
//! is not disturbed.

use crate::cli::{CommandContext, EventCommands};
use crate::error::Result;
use crate::output::print_report;

/// Handle a reported content change
pub async fn run(ctx: &CommandContext, event: EventCommands) -> Result<()> {
    let (event, host) = event.into_parts();
    let report = ctx.coordinator.dispatch(&event, host.host_ref()).await?;
    print_report(&report, ctx.format)
}
