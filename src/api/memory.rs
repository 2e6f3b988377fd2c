//! In-memory backend used for offline mode and as the collaborator in tests.
//!
//! Keeps proposals with a moderation flag like the real store: new ideas are
//! pending until released, and only released ideas are served to the deck.

use super::{ApiError, DeckDataSource, IdeaSubmission, VoteClient};
use crate::deck::{Card, VoteDirection};
use chrono::Local;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const SEED_IDEAS: &[(&str, &str)] = &[
    ("seed-1", "Free coffee in every meeting room"),
    ("seed-2", "Replace the weekly status call with a written update"),
    ("seed-3", "Meetings end five minutes early by default"),
    ("seed-4", "A quiet floor with no phone calls"),
    ("seed-5", "Rotate the on-call schedule every two weeks"),
];

#[derive(Debug, Clone)]
struct StoredIdea {
    card: Card,
    released: bool,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    ideas: Mutex<Vec<StoredIdea>>,
    auto_release: bool,
    latency: Duration,
    failing_loads: AtomicU32,
    failing_votes: AtomicU32,
    vote_attempts: AtomicU32,
    votes_received: AtomicU32,
    id_sequence: AtomicU64,
}

impl MemoryBackend {
    pub fn new(cards: Vec<Card>) -> Self {
        let ideas = cards
            .into_iter()
            .map(|card| StoredIdea {
                card,
                released: true,
            })
            .collect();
        Self {
            ideas: Mutex::new(ideas),
            ..Default::default()
        }
    }

    /// Backend preloaded with a handful of released ideas
    pub fn seeded() -> Self {
        Self::new(
            SEED_IDEAS
                .iter()
                .map(|(id, text)| Card::new(*id, *text))
                .collect(),
        )
    }

    /// Newly created ideas are served immediately instead of waiting for moderation
    pub fn with_auto_release(mut self) -> Self {
        self.auto_release = true;
        self
    }

    /// Delay applied to every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// The next `count` loads fail with a network error
    pub fn fail_next_loads(&self, count: u32) {
        self.failing_loads.store(count, Ordering::SeqCst);
    }

    /// The next `count` vote calls fail with a network error
    pub fn fail_next_votes(&self, count: u32) {
        self.failing_votes.store(count, Ordering::SeqCst);
    }

    /// Number of `send` calls, successful or not
    pub fn vote_attempts(&self) -> u32 {
        self.vote_attempts.load(Ordering::SeqCst)
    }

    /// Number of votes that reached the store
    pub fn votes_received(&self) -> u32 {
        self.votes_received.load(Ordering::SeqCst)
    }

    /// Server-side view of a card
    pub async fn card(&self, id: &str) -> Option<Card> {
        self.ideas
            .lock()
            .await
            .iter()
            .find(|idea| idea.card.id == id)
            .map(|idea| idea.card.clone())
    }

    /// Number of stored ideas, released or not
    pub async fn stored_count(&self) -> usize {
        self.ideas.lock().await.len()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl DeckDataSource for MemoryBackend {
    async fn load_released(&self) -> Result<Vec<Card>, ApiError> {
        self.simulate_latency().await;
        if take_failure(&self.failing_loads) {
            warn!("Simulated load failure");
            return Err(ApiError::Network("simulated load failure".to_string()));
        }

        let ideas = self.ideas.lock().await;
        let released: Vec<Card> = ideas
            .iter()
            .filter(|idea| idea.released)
            .map(|idea| idea.card.clone())
            .collect();
        debug!("Serving {} released ideas", released.len());
        Ok(released)
    }
}

impl VoteClient for MemoryBackend {
    async fn send(&self, card_id: &str, direction: VoteDirection) -> Result<(), ApiError> {
        self.vote_attempts.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if take_failure(&self.failing_votes) {
            return Err(ApiError::Network("simulated vote failure".to_string()));
        }

        let mut ideas = self.ideas.lock().await;
        let idea = ideas
            .iter_mut()
            .find(|idea| idea.card.id == card_id)
            .ok_or_else(|| ApiError::UnknownCard(card_id.to_string()))?;
        idea.card.record_vote(direction);
        self.votes_received.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl IdeaSubmission for MemoryBackend {
    async fn create(&self, text: &str) -> Result<Card, ApiError> {
        self.simulate_latency().await;
        let sequence = self.id_sequence.fetch_add(1, Ordering::SeqCst);
        let id = format!("{:x}-{:x}", Local::now().timestamp_millis(), sequence);
        let card = Card::new(id, text);

        // Newest first, matching the server's ordering
        self.ideas.lock().await.insert(
            0,
            StoredIdea {
                card: card.clone(),
                released: self.auto_release,
            },
        );
        info!("Stored idea {} (released: {})", card.id, self.auto_release);
        Ok(card)
    }
}
