//! Output formatting for CLI results

use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::OutputFormat;
use crate::coordinator::PurgeReport;
use crate::error::{PurgeError, Result};

pub mod json;
pub mod table;

/// One-line notice for a purge report
pub fn report_line(report: &PurgeReport) -> String {
    match report {
        PurgeReport::Purged(outcome) if outcome.success => {
            format!("{} Cache has been purged successfully.", "✓".green())
        }
        PurgeReport::Purged(outcome) => format!(
            "{} Varnish Cache Purge Failed: {}",
            "✗".red(),
            outcome.error_message.as_deref().unwrap_or("unknown error")
        ),
        PurgeReport::Skipped => format!(
            "{} No purge performed (purging disabled, dev mode, or event filtered)",
            "○".dimmed()
        ),
        PurgeReport::HostUndetermined => format!(
            "{} Varnish Cache Purge Failed: {}",
            "✗".red(),
            PurgeError::HostUndetermined
        ),
    }
}

/// Print a purge report as a notice or JSON
pub fn print_report(report: &PurgeReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", json::format_json(report)?),
        _ => println!("{}", report_line(report)),
    }
    Ok(())
}

/// Print rows as a table, or `data` as JSON
pub fn print_rows<R: Tabled, D: Serialize + ?Sized>(
    rows: &[R],
    data: &D,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", json::format_json(data)?),
        _ => println!("{}", table::format_table(rows)),
    }
    Ok(())
}
