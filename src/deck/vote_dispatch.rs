use crate::api::VoteClient;
use crate::deck::VoteDirection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Background retry for vote delivery. `max_attempts = 1` disables retries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Doubling backoff after the given (1-based) failed attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        let ms = self
            .initial_backoff_ms
            .saturating_mul(factor)
            .min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }
}

/// Fire-and-forget vote delivery.
///
/// Failures are logged and dropped; the caller never waits on the network.
#[derive(Debug)]
pub struct VoteDispatcher<V> {
    client: Arc<V>,
    retry: RetryPolicy,
}

impl<V> Clone for VoteDispatcher<V> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            retry: self.retry.clone(),
        }
    }
}

impl<V: VoteClient> VoteDispatcher<V> {
    pub fn new(client: Arc<V>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Spawns delivery; the handle resolves to whether the vote was accepted
    pub fn dispatch(&self, card_id: String, direction: VoteDirection) -> JoinHandle<bool> {
        let client = self.client.clone();
        let retry = self.retry.clone();
        debug!("Dispatching vote {} for {}", direction, card_id);
        tokio::spawn(async move { deliver(client.as_ref(), &card_id, direction, &retry).await })
    }
}

async fn deliver<V: VoteClient>(
    client: &V,
    card_id: &str,
    direction: VoteDirection,
    retry: &RetryPolicy,
) -> bool {
    let attempts = retry.max_attempts.max(1);
    for attempt in 1..=attempts {
        match client.send(card_id, direction).await {
            Ok(()) => {
                debug!("Vote {} for {} delivered (attempt {})", direction, card_id, attempt);
                return true;
            }
            Err(e) if e.is_transient() && attempt < attempts => {
                let wait = retry.backoff(attempt);
                warn!(
                    "Vote {} for {} failed (attempt {}/{}), retrying in {}ms: {}",
                    direction,
                    card_id,
                    attempt,
                    attempts,
                    wait.as_millis(),
                    e
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) => {
                warn!(
                    "Dropping vote {} for {} after {} attempt(s): {}",
                    direction, card_id, attempt, e
                );
                return false;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::deck::Card;

    fn backend() -> Arc<MemoryBackend> {
        Arc::new(MemoryBackend::new(vec![Card::new("a", "X")]))
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.backoff(1), Duration::from_millis(250));
        assert_eq!(retry.backoff(2), Duration::from_millis(500));
        assert_eq!(retry.backoff(3), Duration::from_millis(1_000));
        assert_eq!(retry.backoff(10), Duration::from_millis(2_000));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let backend = backend();
        backend.fail_next_votes(2);
        let dispatcher = VoteDispatcher::new(backend.clone(), RetryPolicy::default());

        let delivered = dispatcher
            .dispatch("a".to_string(), VoteDirection::Yes)
            .await
            .unwrap();
        assert!(delivered);
        assert_eq!(backend.vote_attempts(), 3);
        assert_eq!(backend.votes_received(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_are_swallowed() {
        let backend = backend();
        backend.fail_next_votes(5);
        let dispatcher = VoteDispatcher::new(backend.clone(), RetryPolicy::default());

        let delivered = dispatcher
            .dispatch("a".to_string(), VoteDirection::No)
            .await
            .unwrap();
        assert!(!delivered);
        assert_eq!(backend.vote_attempts(), 3);
        assert_eq!(backend.votes_received(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failures_are_not_retried() {
        let backend = backend();
        let dispatcher = VoteDispatcher::new(backend.clone(), RetryPolicy::default());
        let started = tokio::time::Instant::now();

        let delivered = dispatcher
            .dispatch("missing".to_string(), VoteDirection::Yes)
            .await
            .unwrap();
        assert!(!delivered);
        assert_eq!(backend.vote_attempts(), 1);
        assert!(started.elapsed() < Duration::from_millis(250));
    }
}
