//! Mock purge client for testing
//!
//! Records every request it receives and replies with scripted outcomes,
//! so coordinator and runner tests can assert on "network" activity without
//! a cache server.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{PurgeApi, PurgeOutcome, PurgeRequest};

/// Mock purge client.
///
/// # Example
/// ```ignore
/// let mock = MockPurgeClient::new().with_outcome(PurgeOutcome::succeeded(200));
/// let coordinator = InvalidationCoordinator::new(store, mock.clone());
/// coordinator.purge_host("example.com").await;
/// assert_eq!(mock.call_count().await, 1);
/// ```
#[derive(Clone, Default)]
pub struct MockPurgeClient {
    /// Outcomes returned in order; success(200) once exhausted
    outcomes: Arc<Mutex<VecDeque<PurgeOutcome>>>,
    /// Requests received, in order
    captured: Arc<Mutex<Vec<PurgeRequest>>>,
}

impl MockPurgeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome for the next purge call
    pub fn with_outcome(self, outcome: PurgeOutcome) -> Self {
        if let Ok(mut outcomes) = self.outcomes.try_lock() {
            outcomes.push_back(outcome);
        }
        self
    }

    pub async fn captured(&self) -> Vec<PurgeRequest> {
        self.captured.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.captured.lock().await.len()
    }
}

#[async_trait]
impl PurgeApi for MockPurgeClient {
    async fn purge(&self, request: &PurgeRequest) -> PurgeOutcome {
        self.captured.lock().await.push(request.clone());
        self.outcomes
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| PurgeOutcome::succeeded(200))
    }
}
