//! Anti-forgery token command

use chrono::Utc;

use crate::admin::AdminAction;
use crate::cli::{CommandContext, OutputFormat};
use crate::error::Result;
use crate::output::json;

/// Issue a token for `action` and print it
pub fn issue(ctx: &CommandContext, action: AdminAction) -> Result<()> {
    let (guard, principal) = ctx.admin();
    let token = guard.issue(&principal, action, Utc::now())?;

    match ctx.format {
        OutputFormat::Json => {
            let data = serde_json::json!({
                "action": action.as_str(),
                "token": token,
            });
            println!("{}", json::format_json(&data)?);
        }
        // bare token so it can be captured by shell scripts
        _ => println!("{}", token),
    }

    Ok(())
}
