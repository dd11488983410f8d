//! Cache invalidation coordinator
//!
//! Decides whether a content change should trigger a purge, resolves the
//! target host, and delegates to a [`PurgeApi`] implementation. Settings are
//! re-read from the store on every call.

use serde::Serialize;

use crate::client::{PurgeApi, PurgeOutcome, PurgeRequest};
use crate::config::{CacheConfig, SettingsStore};
use crate::error::{Error, PurgeError, Result};

pub mod event;

pub use event::{ContentChangeEvent, EventFilter, PostSnapshot};

/// What happened when a trigger was handled
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PurgeReport {
    /// A purge was attempted
    Purged(PurgeOutcome),
    /// Filtered out, or purging is disabled
    Skipped,
    /// No host could be determined, so nothing was sent
    HostUndetermined,
}

impl PurgeReport {
    pub fn succeeded(&self) -> bool {
        matches!(self, PurgeReport::Purged(outcome) if outcome.success)
    }
}

/// Pick the explicitly supplied host, else the configured site's host
pub fn resolve_host(explicit: Option<&str>, config: &CacheConfig) -> Option<String> {
    explicit
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .or_else(|| config.site_host())
}

/// Coordinates purges for content changes, manual requests, and scheduled runs
pub struct InvalidationCoordinator<C: PurgeApi> {
    store: SettingsStore,
    client: C,
}

impl<C: PurgeApi> InvalidationCoordinator<C> {
    pub fn new(store: SettingsStore, client: C) -> Self {
        Self { store, client }
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Freshly read settings
    pub fn load_config(&self) -> CacheConfig {
        self.store.load()
    }

    pub fn save_config(&self, config: &CacheConfig) -> Result<()> {
        self.store.save(config)
    }

    /// Configured cache server address
    pub fn server(&self) -> String {
        self.load_config().server
    }

    pub fn tag_prefix(&self) -> String {
        self.load_config().tag_prefix
    }

    /// Purge everything cached for `host`, regardless of enabled/dev-mode flags
    pub async fn purge_host(&self, host: &str) -> PurgeOutcome {
        let config = self.load_config();
        self.purge_with(&config, host).await
    }

    async fn purge_with(&self, config: &CacheConfig, host: &str) -> PurgeOutcome {
        let request = PurgeRequest::for_host(host, &config.server);
        self.client.purge(&request).await
    }

    /// Decide whether `event` warrants a purge and perform it.
    ///
    /// Returns `Ok(None)` when the event is filtered or purging is disabled,
    /// and `PurgeError::HostUndetermined` when no host is available.
    pub async fn on_content_change(
        &self,
        event: &ContentChangeEvent,
        host: Option<&str>,
    ) -> Result<Option<PurgeOutcome>> {
        if let Some(filter) = event.filtered() {
            log::debug!("Skipping purge for {} event: {}", event.label(), filter);
            return Ok(None);
        }

        let config = self.load_config();
        if !config.enabled {
            log::debug!("Skipping purge for {} event: cache disabled", event.label());
            return Ok(None);
        }
        if config.dev_mode {
            log::debug!("Skipping purge for {} event: dev mode", event.label());
            return Ok(None);
        }

        let Some(host) = resolve_host(host, &config) else {
            log::warn!("Cannot purge for {} event: host undetermined", event.label());
            return Err(PurgeError::HostUndetermined.into());
        };

        log::info!("Purging {} for {} event", host, event.label());
        Ok(Some(self.purge_with(&config, &host).await))
    }

    /// Like [`Self::on_content_change`], folding the host-undetermined case
    /// into the report so callers can surface it without failing.
    pub async fn dispatch(
        &self,
        event: &ContentChangeEvent,
        host: Option<&str>,
    ) -> Result<PurgeReport> {
        match self.on_content_change(event, host).await {
            Ok(Some(outcome)) => Ok(PurgeReport::Purged(outcome)),
            Ok(None) => Ok(PurgeReport::Skipped),
            Err(Error::Purge(PurgeError::HostUndetermined)) => Ok(PurgeReport::HostUndetermined),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockPurgeClient;
    use tempfile::{TempDir, tempdir};

    fn setup(config: &CacheConfig) -> (TempDir, InvalidationCoordinator<MockPurgeClient>, MockPurgeClient) {
        let temp = tempdir().unwrap();
        let store = SettingsStore::new(temp.path().join("settings.json"));
        store.save(config).unwrap();

        let mock = MockPurgeClient::new();
        let coordinator = InvalidationCoordinator::new(store, mock.clone());
        (temp, coordinator, mock)
    }

    fn enabled_config() -> CacheConfig {
        CacheConfig {
            enabled: true,
            dev_mode: false,
            server: "cache.local:6081".to_string(),
            ..CacheConfig::default()
        }
    }

    fn all_events() -> Vec<ContentChangeEvent> {
        vec![
            ContentChangeEvent::PostSaved(PostSnapshot::public("post")),
            ContentChangeEvent::PostDeleted { post_id: Some(7) },
            ContentChangeEvent::CommentChanged { comment_id: Some(9) },
            ContentChangeEvent::TermChanged {
                term_id: Some(2),
                taxonomy: Some("category".to_string()),
            },
            ContentChangeEvent::Manual,
            ContentChangeEvent::Scheduled,
        ]
    }

    #[tokio::test]
    async fn test_disabled_config_suppresses_every_event() {
        let config = CacheConfig {
            enabled: false,
            ..enabled_config()
        };
        let (_temp, coordinator, mock) = setup(&config);

        for event in all_events() {
            let result = coordinator.on_content_change(&event, Some("example.com")).await.unwrap();
            assert_eq!(result, None, "{} was not suppressed", event.label());
        }
        assert_eq!(mock.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_dev_mode_suppresses_every_event() {
        let config = CacheConfig {
            dev_mode: true,
            ..enabled_config()
        };
        let (_temp, coordinator, mock) = setup(&config);

        for event in all_events() {
            let result = coordinator.on_content_change(&event, Some("example.com")).await.unwrap();
            assert_eq!(result, None, "{} was not suppressed", event.label());
        }
        assert_eq!(mock.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_autosave_and_revision_skip_even_when_enabled() {
        let (_temp, coordinator, mock) = setup(&enabled_config());

        let mut autosave = PostSnapshot::public("post");
        autosave.autosave = true;
        let mut revision = PostSnapshot::public("post");
        revision.revision = true;
        let mut private = PostSnapshot::public("internal_note");
        private.public = false;

        for post in [autosave, revision, private] {
            let event = ContentChangeEvent::PostSaved(post);
            let result = coordinator.on_content_change(&event, Some("example.com")).await.unwrap();
            assert_eq!(result, None);
        }
        assert_eq!(mock.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_public_post_saved_purges_current_host() {
        let (_temp, coordinator, mock) = setup(&enabled_config());

        let event = ContentChangeEvent::PostSaved(PostSnapshot::public("post"));
        let outcome = coordinator
            .on_content_change(&event, Some("www.example.com"))
            .await
            .unwrap()
            .expect("purge should run");

        assert!(outcome.success);
        let captured = mock.captured().await;
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].url(), "http://cache.local:6081/");
        assert_eq!(
            captured[0].headers.get("Host").map(String::as_str),
            Some("www.example.com")
        );
    }

    #[tokio::test]
    async fn test_every_unfiltered_kind_purges_when_enabled() {
        let (_temp, coordinator, mock) = setup(&enabled_config());

        for event in all_events() {
            let result = coordinator.on_content_change(&event, Some("example.com")).await.unwrap();
            assert!(result.is_some(), "{} did not purge", event.label());
        }
        assert_eq!(mock.call_count().await, all_events().len());
    }

    #[tokio::test]
    async fn test_falls_back_to_site_host() {
        let config = CacheConfig {
            site_url: "https://blog.example.com/".to_string(),
            ..enabled_config()
        };
        let (_temp, coordinator, mock) = setup(&config);

        let result = coordinator
            .on_content_change(&ContentChangeEvent::Scheduled, None)
            .await
            .unwrap();

        assert!(result.is_some());
        assert_eq!(mock.captured().await[0].target_host, "blog.example.com");
    }

    #[tokio::test]
    async fn test_blank_explicit_host_falls_back() {
        let config = CacheConfig {
            site_url: "http://example.net:8080".to_string(),
            ..enabled_config()
        };
        let (_temp, coordinator, mock) = setup(&config);

        coordinator
            .on_content_change(&ContentChangeEvent::Manual, Some("   "))
            .await
            .unwrap();

        assert_eq!(mock.captured().await[0].target_host, "example.net:8080");
    }

    #[tokio::test]
    async fn test_host_undetermined_is_reported() {
        let (_temp, coordinator, mock) = setup(&enabled_config());

        let result = coordinator
            .on_content_change(&ContentChangeEvent::PostDeleted { post_id: None }, None)
            .await;

        match result {
            Err(Error::Purge(PurgeError::HostUndetermined)) => (),
            other => panic!("Expected HostUndetermined, got {:?}", other),
        }
        assert_eq!(mock.call_count().await, 0);

        let report = coordinator
            .dispatch(&ContentChangeEvent::PostDeleted { post_id: None }, None)
            .await
            .unwrap();
        assert_eq!(report, PurgeReport::HostUndetermined);
    }

    #[tokio::test]
    async fn test_purge_host_ignores_enabled_flag() {
        let config = CacheConfig {
            enabled: false,
            ..enabled_config()
        };
        let (_temp, coordinator, mock) = setup(&config);

        let outcome = coordinator.purge_host("example.com").await;

        assert!(outcome.success);
        assert_eq!(mock.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_purge_outcome_passes_through_unchanged() {
        let temp = tempdir().unwrap();
        let store = SettingsStore::new(temp.path().join("settings.json"));
        store.save(&enabled_config()).unwrap();

        let failure = PurgeOutcome::failed(&PurgeError::NonSuccessStatus(503), Some(503));
        let mock = MockPurgeClient::new().with_outcome(failure.clone());
        let coordinator = InvalidationCoordinator::new(store, mock);

        let report = coordinator
            .dispatch(&ContentChangeEvent::Manual, Some("example.com"))
            .await
            .unwrap();

        assert_eq!(report, PurgeReport::Purged(failure));
        assert!(!report.succeeded());
    }

    #[tokio::test]
    async fn test_settings_are_reread_on_every_call() {
        let (_temp, coordinator, mock) = setup(&enabled_config());
        let event = ContentChangeEvent::Manual;

        assert!(coordinator.on_content_change(&event, Some("a.test")).await.unwrap().is_some());

        let mut config = coordinator.load_config();
        config.dev_mode = true;
        coordinator.save_config(&config).unwrap();

        assert!(coordinator.on_content_change(&event, Some("a.test")).await.unwrap().is_none());
        assert_eq!(mock.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_server_and_tag_prefix_accessors() {
        let config = CacheConfig {
            tag_prefix: "site-a".to_string(),
            ..enabled_config()
        };
        let (_temp, coordinator, _mock) = setup(&config);

        assert_eq!(coordinator.server(), "cache.local:6081");
        assert_eq!(coordinator.tag_prefix(), "site-a");
    }
}
