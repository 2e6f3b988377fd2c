use super::vote_dispatch::VoteDispatcher;
use super::{Card, DeckError, ValidationError, VoteDirection};
use crate::api::{ApiError, DeckDataSource, IdeaSubmission, VoteClient};
use tracing::{debug, info, warn};

pub const IDEA_MIN_CHARS: usize = 3;
pub const IDEA_MAX_CHARS: usize = 120;

/// What the deck can show right now
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeckStatus {
    Loading,
    Failed(String),
    Reviewing,
    /// Every card has been voted on; only a reload leaves this state
    Exhausted,
}

/// Identifies one load request; results for older tickets are dropped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoadTicket(u64);

/// Trims and length-checks idea text before it goes anywhere
pub fn validate_idea(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    let length = trimmed.chars().count();
    if length < IDEA_MIN_CHARS {
        return Err(ValidationError::TooShort {
            length,
            min: IDEA_MIN_CHARS,
        });
    }
    if length > IDEA_MAX_CHARS {
        return Err(ValidationError::TooLong {
            length,
            max: IDEA_MAX_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

/// Ordered card queue with a review position.
///
/// `position == len` is the terminal state. A position receives at most
/// one committed vote; once `advance` moves past it the card is gone.
#[derive(Debug, Default)]
pub struct DeckController {
    cards: Vec<Card>,
    position: usize,
    load_generation: u64,
    in_flight: Option<LoadTicket>,
    loaded: bool,
    last_error: Option<String>,
    committed_position: Option<usize>,
}

impl DeckController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> DeckStatus {
        if self.in_flight.is_some() || !self.loaded {
            return DeckStatus::Loading;
        }
        if let Some(error) = &self.last_error {
            return DeckStatus::Failed(error.clone());
        }
        if self.position >= self.cards.len() {
            DeckStatus::Exhausted
        } else {
            DeckStatus::Reviewing
        }
    }

    pub fn current(&self) -> Option<&Card> {
        if self.in_flight.is_some() {
            return None;
        }
        self.cards.get(self.position)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Starts a reload: the queue is cleared and the position returns to 0
    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_generation += 1;
        let ticket = LoadTicket(self.load_generation);
        debug!("Starting deck load {:?}", ticket);
        self.in_flight = Some(ticket);
        self.last_error = None;
        self.cards.clear();
        self.position = 0;
        self.committed_position = None;
        ticket
    }

    /// Applies a load result. Returns the number of cards on success.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Card>, ApiError>,
    ) -> Result<usize, DeckError> {
        if self.in_flight != Some(ticket) {
            debug!("Discarding result of superseded load {:?}", ticket);
            return Err(DeckError::StaleLoad);
        }
        self.in_flight = None;
        self.loaded = true;

        match result {
            Ok(cards) => {
                info!("Deck loaded with {} cards", cards.len());
                self.cards = cards;
                self.position = 0;
                self.committed_position = None;
                Ok(self.cards.len())
            }
            Err(e) => {
                warn!("Deck load failed: {}", e);
                self.last_error = Some(e.to_string());
                Err(DeckError::Load(e))
            }
        }
    }

    pub async fn load<S: DeckDataSource>(&mut self, source: &S) -> Result<usize, DeckError> {
        let ticket = self.begin_load();
        let result = source.load_released().await;
        self.finish_load(ticket, result)
    }

    /// Optimistically counts the vote and dispatches it without waiting.
    /// The local count stays even if delivery fails.
    pub fn commit_vote<V: VoteClient>(
        &mut self,
        direction: VoteDirection,
        dispatcher: &VoteDispatcher<V>,
    ) -> Result<Card, DeckError> {
        if self.in_flight.is_some() {
            return Err(DeckError::NoCurrentCard);
        }
        let position = self.position;
        let already_committed = self.committed_position == Some(position);
        let card = self
            .cards
            .get_mut(position)
            .ok_or(DeckError::NoCurrentCard)?;
        if already_committed {
            return Err(DeckError::AlreadyCommitted(card.id.clone()));
        }

        card.record_vote(direction);
        self.committed_position = Some(position);
        info!(
            "Committed {} for {} (yes: {}, no: {})",
            direction, card.id, card.yes_count, card.no_count
        );
        dispatcher.dispatch(card.id.clone(), direction);
        Ok(card.clone())
    }

    pub fn advance(&mut self) {
        if self.position < self.cards.len() {
            self.position += 1;
        }
        self.committed_position = None;
        if self.position == self.cards.len() {
            info!("All {} cards reviewed", self.cards.len());
        } else {
            debug!("Advanced to card {}/{}", self.position + 1, self.cards.len());
        }
    }

    /// Validates, creates the idea, then reloads the deck
    pub async fn submit_idea<B>(&mut self, backend: &B, text: &str) -> Result<Card, DeckError>
    where
        B: IdeaSubmission + DeckDataSource,
    {
        let text = validate_idea(text)?;
        let card = backend.create(&text).await.map_err(DeckError::Submit)?;
        info!("Submitted idea {}", card.id);
        self.load(backend).await?;
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackend;
    use crate::deck::RetryPolicy;
    use std::sync::Arc;

    fn cards(n: usize) -> Vec<Card> {
        (0..n)
            .map(|i| Card::new(format!("c{}", i), format!("Idea {}", i)))
            .collect()
    }

    fn dispatcher(backend: &Arc<MemoryBackend>) -> VoteDispatcher<MemoryBackend> {
        VoteDispatcher::new(backend.clone(), RetryPolicy::no_retry())
    }

    #[test]
    fn starts_loading_until_first_result() {
        let mut deck = DeckController::new();
        assert_eq!(deck.status(), DeckStatus::Loading);

        let ticket = deck.begin_load();
        deck.finish_load(ticket, Ok(cards(2))).unwrap();
        assert_eq!(deck.status(), DeckStatus::Reviewing);
        assert_eq!(deck.current().unwrap().id, "c0");
    }

    #[tokio::test]
    async fn n_votes_reach_terminal_state_once() {
        let backend = Arc::new(MemoryBackend::new(cards(3)));
        let dispatcher = dispatcher(&backend);
        let mut deck = DeckController::new();
        deck.load(backend.as_ref()).await.unwrap();

        for _ in 0..3 {
            assert_eq!(deck.status(), DeckStatus::Reviewing);
            deck.commit_vote(VoteDirection::Yes, &dispatcher).unwrap();
            deck.advance();
        }
        assert_eq!(deck.status(), DeckStatus::Exhausted);
        assert_eq!(deck.position(), deck.len());
        assert!(deck.current().is_none());

        deck.advance();
        assert_eq!(deck.position(), 3);
        assert!(matches!(
            deck.commit_vote(VoteDirection::No, &dispatcher),
            Err(DeckError::NoCurrentCard)
        ));
    }

    #[tokio::test]
    async fn optimistic_update_survives_failed_delivery() {
        let backend = Arc::new(MemoryBackend::new(vec![Card::new("a", "X").with_counts(3, 1)]));
        backend.fail_next_votes(1);
        let dispatcher = dispatcher(&backend);
        let mut deck = DeckController::new();
        deck.load(backend.as_ref()).await.unwrap();

        let updated = deck.commit_vote(VoteDirection::Yes, &dispatcher).unwrap();
        assert_eq!((updated.yes_count, updated.no_count), (4, 1));
        let current = deck.current().unwrap();
        assert_eq!((current.yes_count, current.no_count), (4, 1));

        tokio::task::yield_now().await;
        let current = deck.current().unwrap();
        assert_eq!((current.yes_count, current.no_count), (4, 1));
    }

    #[tokio::test]
    async fn second_commit_on_same_card_is_rejected() {
        let backend = Arc::new(MemoryBackend::new(cards(2)));
        let dispatcher = dispatcher(&backend);
        let mut deck = DeckController::new();
        deck.load(backend.as_ref()).await.unwrap();

        deck.commit_vote(VoteDirection::No, &dispatcher).unwrap();
        assert!(matches!(
            deck.commit_vote(VoteDirection::Yes, &dispatcher),
            Err(DeckError::AlreadyCommitted(id)) if id == "c0"
        ));
        assert_eq!(deck.current().unwrap().no_count, 1);
        assert_eq!(deck.current().unwrap().yes_count, 0);

        deck.advance();
        assert_eq!(deck.current().unwrap().id, "c1");
        assert!(deck.commit_vote(VoteDirection::Yes, &dispatcher).is_ok());
    }

    #[test]
    fn reload_resets_position() {
        let mut deck = DeckController::new();
        let ticket = deck.begin_load();
        deck.finish_load(ticket, Ok(cards(3))).unwrap();
        deck.advance();
        deck.advance();
        assert_eq!(deck.position(), 2);

        let ticket = deck.begin_load();
        assert!(deck.current().is_none());
        deck.finish_load(ticket, Ok(cards(3))).unwrap();
        assert_eq!(deck.position(), 0);
        assert_eq!(deck.current().unwrap().id, "c0");
    }

    #[test]
    fn superseded_load_is_discarded() {
        let mut deck = DeckController::new();
        let first = deck.begin_load();
        let second = deck.begin_load();

        assert!(matches!(
            deck.finish_load(first, Ok(cards(5))),
            Err(DeckError::StaleLoad)
        ));
        assert_eq!(deck.status(), DeckStatus::Loading);
        deck.finish_load(second, Ok(cards(1))).unwrap();
        assert_eq!(deck.len(), 1);
    }

    #[tokio::test]
    async fn failed_load_is_recoverable() {
        let backend = MemoryBackend::new(cards(2));
        backend.fail_next_loads(1);
        let mut deck = DeckController::new();

        assert!(matches!(deck.load(&backend).await, Err(DeckError::Load(_))));
        assert!(matches!(deck.status(), DeckStatus::Failed(_)));
        assert!(deck.current().is_none());

        assert_eq!(deck.load(&backend).await.unwrap(), 2);
        assert_eq!(deck.status(), DeckStatus::Reviewing);
    }

    #[test]
    fn idea_text_is_trimmed_and_bounded() {
        assert_eq!(validate_idea("  abc  ").unwrap(), "abc");
        assert_eq!(validate_idea("äöü").unwrap(), "äöü");
        assert_eq!(
            validate_idea("  ab  "),
            Err(ValidationError::TooShort { length: 2, min: 3 })
        );
        assert!(validate_idea(&"x".repeat(120)).is_ok());
        assert_eq!(
            validate_idea(&"x".repeat(121)),
            Err(ValidationError::TooLong {
                length: 121,
                max: 120
            })
        );
    }

    #[tokio::test]
    async fn submitted_idea_reloads_deck() {
        let backend = MemoryBackend::new(cards(1)).with_auto_release();
        let mut deck = DeckController::new();
        deck.load(&backend).await.unwrap();
        deck.advance();
        assert_eq!(deck.status(), DeckStatus::Exhausted);

        let created = deck.submit_idea(&backend, "  Longer lunch breaks ").await.unwrap();
        assert_eq!(created.text, "Longer lunch breaks");
        assert_eq!(deck.position(), 0);
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.current().unwrap().id, created.id);
    }

    #[tokio::test]
    async fn invalid_idea_never_reaches_backend() {
        let backend = MemoryBackend::new(cards(1));
        let mut deck = DeckController::new();
        deck.load(&backend).await.unwrap();

        let result = deck.submit_idea(&backend, " x ").await;
        assert!(matches!(result, Err(DeckError::Validation(_))));
        assert_eq!(backend.stored_count().await, 1);
        assert_eq!(deck.status(), DeckStatus::Reviewing);
    }
}
