//! Recurring purge runner
//!
//! Arming and disarming mirror plugin activation and deactivation: activation
//! schedules the task only if auto purge is enabled and nothing is scheduled
//! yet, and deactivation always clears it. Ticks hand a `Scheduled` event to
//! the coordinator.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AUTO_PURGE_HOOK, SCHEDULE_FILE, ScheduleStore, ScheduledEvent};
use crate::client::PurgeApi;
use crate::config::CacheConfig;
use crate::coordinator::{ContentChangeEvent, InvalidationCoordinator, PurgeReport, resolve_host};
use crate::error::Result;

/// Report for one executed tick
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// When the tick was due
    pub scheduled_for: DateTime<Utc>,
    pub report: PurgeReport,
}

/// Change made by [`ScheduledPurgeRunner::sync`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncChange {
    Armed,
    Rearmed,
    Cleared,
    Unchanged,
}

/// Arms, disarms, and executes the recurring purge task
pub struct ScheduledPurgeRunner<'a, C: PurgeApi> {
    coordinator: &'a InvalidationCoordinator<C>,
    schedule: ScheduleStore,
}

impl<'a, C: PurgeApi> ScheduledPurgeRunner<'a, C> {
    /// Runner whose schedule book lives beside the coordinator's settings
    pub fn new(coordinator: &'a InvalidationCoordinator<C>) -> Self {
        let schedule = ScheduleStore::new(coordinator.store().sibling(SCHEDULE_FILE));
        Self::with_store(coordinator, schedule)
    }

    pub fn with_store(coordinator: &'a InvalidationCoordinator<C>, schedule: ScheduleStore) -> Self {
        Self {
            coordinator,
            schedule,
        }
    }

    pub fn schedule_store(&self) -> &ScheduleStore {
        &self.schedule
    }

    /// Currently scheduled auto-purge task, if any
    pub fn status(&self) -> Option<ScheduledEvent> {
        self.schedule.load().find(AUTO_PURGE_HOOK).cloned()
    }

    /// Arm the task if auto purge is enabled and it is not already armed.
    /// Returns whether a task was armed.
    pub fn activate(&self, config: &CacheConfig, now: DateTime<Utc>) -> Result<bool> {
        if !config.auto_purge {
            log::debug!("Auto purge disabled, not scheduling");
            return Ok(false);
        }

        let mut book = self.schedule.load();
        if book.is_scheduled(AUTO_PURGE_HOOK) {
            log::debug!("Auto purge already scheduled");
            return Ok(false);
        }

        let frequency = config.auto_purge_frequency;
        book.schedule(AUTO_PURGE_HOOK, frequency, now + frequency.interval());
        self.schedule.save(&book)?;

        log::info!("Scheduled auto purge ({})", frequency);
        Ok(true)
    }

    /// Clear every scheduled auto-purge task. Returns how many were removed.
    pub fn deactivate(&self) -> Result<usize> {
        let mut book = self.schedule.load();
        let removed = book.clear(AUTO_PURGE_HOOK);
        self.schedule.save(&book)?;

        if removed > 0 {
            log::info!("Cleared {} scheduled auto purge task(s)", removed);
        }
        Ok(removed)
    }

    /// Bring the schedule in line with freshly saved settings
    pub fn sync(&self, config: &CacheConfig, now: DateTime<Utc>) -> Result<SyncChange> {
        if !config.auto_purge {
            return Ok(if self.deactivate()? > 0 {
                SyncChange::Cleared
            } else {
                SyncChange::Unchanged
            });
        }

        match self.status() {
            None => {
                self.activate(config, now)?;
                Ok(SyncChange::Armed)
            }
            Some(event) if event.frequency != config.auto_purge_frequency => {
                self.deactivate()?;
                self.activate(config, now)?;
                Ok(SyncChange::Rearmed)
            }
            Some(_) => Ok(SyncChange::Unchanged),
        }
    }

    /// Run one scheduled purge immediately, without touching the schedule
    pub async fn tick(&self, host: Option<&str>) -> Result<PurgeReport> {
        let config = self.coordinator.load_config();
        let host = resolve_host(host, &config);
        self.coordinator
            .dispatch(&ContentChangeEvent::Scheduled, host.as_deref())
            .await
    }

    /// Execute every due task and advance its next run past `now`.
    ///
    /// The book is re-read after each purge, so a task cleared while the
    /// purge was in flight stays cleared.
    pub async fn run_due(&self, now: DateTime<Utc>, host: Option<&str>) -> Result<Vec<TickReport>> {
        let due: Vec<ScheduledEvent> = self
            .schedule
            .load()
            .events
            .into_iter()
            .filter(|e| e.hook == AUTO_PURGE_HOOK && e.is_due(now))
            .collect();

        let mut reports = Vec::with_capacity(due.len());
        for event in due {
            let report = self.tick(host).await?;

            let mut book = self.schedule.load();
            let entry = book
                .events
                .iter_mut()
                .find(|e| e.hook == event.hook && e.next_run == event.next_run);
            match entry {
                Some(entry) => {
                    entry.advance(now);
                    self.schedule.save(&book)?;
                }
                None => log::debug!("{} was cleared during its run, not rescheduling", event.hook),
            }

            reports.push(TickReport {
                scheduled_for: event.next_run,
                report,
            });
        }

        Ok(reports)
    }

    /// Poll for due tasks until interrupted with Ctrl-C
    pub async fn run_forever(&self, host: Option<&str>, poll: Duration) -> Result<()> {
        let mut interval = tokio::time::interval(poll);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);
        log::info!("Auto purge runner started (poll every {:?})", poll);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    for tick in self.run_due(Utc::now(), host).await? {
                        match &tick.report {
                            PurgeReport::Purged(outcome) if outcome.success => {
                                log::info!("Scheduled purge succeeded");
                            }
                            PurgeReport::Purged(outcome) => {
                                log::warn!(
                                    "Scheduled purge failed: {}",
                                    outcome.error_message.as_deref().unwrap_or("unknown error")
                                );
                            }
                            PurgeReport::Skipped => log::debug!("Scheduled purge skipped"),
                            PurgeReport::HostUndetermined => {
                                log::warn!("Scheduled purge skipped: host undetermined");
                            }
                        }
                    }
                }
                _ = &mut shutdown => {
                    log::info!("Auto purge runner stopping");
                    return Ok(());
                }
            }
        }
    }
}
