//! Settings and schedule display models

use serde::Serialize;
use tabled::Tabled;

use crate::config::CacheConfig;
use crate::schedule::ScheduledEvent;

const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One setting as a key/value row
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct SettingRow {
    #[tabled(rename = "SETTING")]
    pub key: &'static str,

    #[tabled(rename = "VALUE")]
    pub value: String,
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "--".to_string()
    } else {
        value.to_string()
    }
}

fn list(values: &[String]) -> String {
    if values.is_empty() {
        "--".to_string()
    } else {
        values.join(", ")
    }
}

/// Rows for every setting, in display order
pub fn setting_rows(config: &CacheConfig) -> Vec<SettingRow> {
    let row = |key, value| SettingRow { key, value };

    vec![
        row("Enabled", config.enabled.to_string()),
        row("Dev mode", config.dev_mode.to_string()),
        row("Server", or_dash(&config.server)),
        row("Cache lifetime", format!("{}s", config.cache_lifetime)),
        row("Tag prefix", or_dash(&config.tag_prefix)),
        row("Excluded params", list(&config.excluded_params)),
        row("Excludes", list(&config.excludes)),
        row("Site URL", or_dash(&config.site_url)),
        row("Auto purge", config.auto_purge.to_string()),
        row("Frequency", config.auto_purge_frequency.to_string()),
    ]
}

/// Scheduled task display model for table output
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct ScheduleDisplay {
    #[tabled(rename = "TASK")]
    pub hook: String,

    #[tabled(rename = "FREQUENCY")]
    pub frequency: String,

    #[tabled(rename = "NEXT RUN")]
    pub next_run: String,

    #[tabled(rename = "LAST RUN")]
    pub last_run: String,
}

impl From<&ScheduledEvent> for ScheduleDisplay {
    fn from(event: &ScheduledEvent) -> Self {
        let local = |t: chrono::DateTime<chrono::Utc>| {
            t.with_timezone(&chrono::Local)
                .format(LOCAL_TIME_FORMAT)
                .to_string()
        };

        Self {
            hook: event.hook.clone(),
            frequency: event.frequency.to_string(),
            next_run: local(event.next_run),
            last_run: event.last_run.map(local).unwrap_or_else(|| "--".to_string()),
        }
    }
}
