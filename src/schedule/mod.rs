//! Recurring purge scheduling
//!
//! Scheduled tasks are kept in a small JSON "schedule book" next to the
//! settings file. Each entry names a hook, how often it runs, and when it is
//! next due. The runner in [`runner`] arms, disarms, and executes entries.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::write_atomic;
use crate::error::{Result, ScheduleError};

pub mod runner;

pub use runner::ScheduledPurgeRunner;

/// Hook name of the recurring purge-all task
pub const AUTO_PURGE_HOOK: &str = "varnishcache_auto_purge";

/// File name of the schedule book, stored beside the settings file
pub const SCHEDULE_FILE: &str = "schedule.json";

/// How often the recurring purge runs
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Frequency {
    /// Every 30 minutes
    #[serde(rename = "thirty_minutes")]
    #[value(name = "thirty_minutes")]
    ThirtyMinutes,
    /// Every hour
    #[default]
    #[serde(rename = "hourly")]
    #[value(name = "hourly")]
    Hourly,
    /// Every 12 hours
    #[serde(rename = "twicedaily")]
    #[value(name = "twicedaily")]
    TwiceDaily,
    /// Every 24 hours
    #[serde(rename = "daily")]
    #[value(name = "daily")]
    Daily,
    /// Every 7 days
    #[serde(rename = "weekly")]
    #[value(name = "weekly")]
    Weekly,
}

impl Frequency {
    /// Interval between runs
    pub fn interval(self) -> chrono::Duration {
        match self {
            Frequency::ThirtyMinutes => chrono::Duration::minutes(30),
            Frequency::Hourly => chrono::Duration::hours(1),
            Frequency::TwiceDaily => chrono::Duration::hours(12),
            Frequency::Daily => chrono::Duration::days(1),
            Frequency::Weekly => chrono::Duration::weeks(1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::ThirtyMinutes => "thirty_minutes",
            Frequency::Hourly => "hourly",
            Frequency::TwiceDaily => "twicedaily",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurring task entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEvent {
    /// Hook the task triggers
    pub hook: String,

    /// Recurrence
    pub frequency: Frequency,

    /// When the task is next due
    pub next_run: DateTime<Utc>,

    /// When the task last ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<DateTime<Utc>>,
}

impl ScheduledEvent {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_run <= now
    }

    /// Record a run at `now` and move `next_run` past it by whole intervals
    pub fn advance(&mut self, now: DateTime<Utc>) {
        self.last_run = Some(now);

        let step = self.frequency.interval().num_seconds().max(1);
        if self.next_run <= now {
            let behind = (now - self.next_run).num_seconds();
            let missed = behind / step + 1;
            self.next_run += chrono::Duration::seconds(missed * step);
        }
    }
}

/// All scheduled tasks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleBook {
    #[serde(default)]
    pub events: Vec<ScheduledEvent>,
}

impl ScheduleBook {
    pub fn is_scheduled(&self, hook: &str) -> bool {
        self.events.iter().any(|e| e.hook == hook)
    }

    pub fn find(&self, hook: &str) -> Option<&ScheduledEvent> {
        self.events.iter().find(|e| e.hook == hook)
    }

    /// Append a task; callers are responsible for avoiding duplicates
    pub fn schedule(&mut self, hook: &str, frequency: Frequency, first_run: DateTime<Utc>) {
        self.events.push(ScheduledEvent {
            hook: hook.to_string(),
            frequency,
            next_run: first_run,
            last_run: None,
        });
    }

    /// Remove every task for `hook`, returning how many were removed
    pub fn clear(&mut self, hook: &str) -> usize {
        let before = self.events.len();
        self.events.retain(|e| e.hook != hook);
        before - self.events.len()
    }

    #[cfg(test)]
    pub fn count(&self, hook: &str) -> usize {
        self.events.iter().filter(|e| e.hook == hook).count()
    }
}

/// Persists the schedule book
#[derive(Debug, Clone)]
pub struct ScheduleStore {
    path: PathBuf,
}

impl ScheduleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the book; a missing or corrupt file means nothing is scheduled
    pub fn load(&self) -> ScheduleBook {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return ScheduleBook::default(),
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            log::warn!(
                "Schedule at {} is corrupt ({}), treating as empty",
                self.path.display(),
                e
            );
            ScheduleBook::default()
        })
    }

    pub fn save(&self, book: &ScheduleBook) -> Result<()> {
        let contents = serde_json::to_string_pretty(book)
            .map_err(|e| ScheduleError::Serialize(e.to_string()))?;
        write_atomic(&self.path, contents.as_bytes(), 0o600)
            .map_err(|e| ScheduleError::Write(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_frequency_intervals() {
        assert_eq!(Frequency::ThirtyMinutes.interval().num_minutes(), 30);
        assert_eq!(Frequency::Hourly.interval().num_hours(), 1);
        assert_eq!(Frequency::TwiceDaily.interval().num_hours(), 12);
        assert_eq!(Frequency::Daily.interval().num_hours(), 24);
        assert_eq!(Frequency::Weekly.interval().num_days(), 7);
    }

    #[test]
    fn test_frequency_serde_names() {
        let json = serde_json::to_string(&Frequency::TwiceDaily).unwrap();
        assert_eq!(json, "\"twicedaily\"");

        let parsed: Frequency = serde_json::from_str("\"thirty_minutes\"").unwrap();
        assert_eq!(parsed, Frequency::ThirtyMinutes);
    }

    #[test]
    fn test_advance_skips_missed_runs() {
        let mut event = ScheduledEvent {
            hook: AUTO_PURGE_HOOK.to_string(),
            frequency: Frequency::Hourly,
            next_run: at(1, 0),
            last_run: None,
        };

        event.advance(at(4, 30));
        assert_eq!(event.next_run, at(5, 0));
        assert_eq!(event.last_run, Some(at(4, 30)));
    }

    #[test]
    fn test_advance_exactly_on_due_time() {
        let mut event = ScheduledEvent {
            hook: AUTO_PURGE_HOOK.to_string(),
            frequency: Frequency::ThirtyMinutes,
            next_run: at(2, 0),
            last_run: None,
        };

        assert!(event.is_due(at(2, 0)));
        event.advance(at(2, 0));
        assert_eq!(event.next_run, at(2, 30));
        assert!(!event.is_due(at(2, 0)));
    }

    #[test]
    fn test_book_clear_removes_all_entries_for_hook() {
        let mut book = ScheduleBook::default();
        book.schedule(AUTO_PURGE_HOOK, Frequency::Hourly, at(1, 0));
        book.schedule(AUTO_PURGE_HOOK, Frequency::Daily, at(2, 0));
        book.schedule("other_hook", Frequency::Daily, at(3, 0));

        assert_eq!(book.clear(AUTO_PURGE_HOOK), 2);
        assert!(!book.is_scheduled(AUTO_PURGE_HOOK));
        assert!(book.is_scheduled("other_hook"));
    }

    #[test]
    fn test_store_round_trip() {
        let temp = tempdir().unwrap();
        let store = ScheduleStore::new(temp.path().join(SCHEDULE_FILE));

        let mut book = ScheduleBook::default();
        book.schedule(AUTO_PURGE_HOOK, Frequency::Weekly, at(6, 0));
        store.save(&book).unwrap();

        assert_eq!(store.load(), book);
    }

    #[test]
    fn test_store_missing_or_corrupt_is_empty() {
        let temp = tempdir().unwrap();
        let store = ScheduleStore::new(temp.path().join(SCHEDULE_FILE));
        assert!(store.load().events.is_empty());

        std::fs::write(store.path(), "garbage").unwrap();
        assert!(store.load().events.is_empty());
    }
}
