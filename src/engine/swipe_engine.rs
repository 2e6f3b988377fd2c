use crate::animation::{
    AnimationPhase, AnimationSequencer, AnimationSettings, PhaseEvent, PhaseTimer, PhaseToken,
};
use crate::api::{ApiError, VoteClient};
use crate::deck::{
    validate_idea, Card, DeckController, DeckError, DeckStatus, LoadTicket, RetryPolicy,
    VoteDirection, VoteDispatcher,
};
use crate::gesture::{
    GestureClassifier, GestureSettings, MoveStatus, PointerEvent, PointerTracker, ReleaseDecision,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything the engine needs to know up front; lives under `[engine]` in the config file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Initial layout width in logical pixels, updated through `Resize`
    pub viewport_width: f32,
    pub gesture: GestureSettings,
    pub animation: AnimationSettings,
    pub vote_retry: RetryPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            viewport_width: 390.0,
            gesture: GestureSettings::default(),
            animation: AnimationSettings::default(),
            vote_retry: RetryPolicy::default(),
        }
    }
}

/// Inputs accepted by the engine loop
#[derive(Debug, Clone, PartialEq)]
pub enum EngineInput {
    Pointer(PointerEvent),
    /// Button or keyboard vote on the resting card
    Vote(VoteDirection),
    Reload,
    SubmitIdea(String),
    Resize { viewport_width: f32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Info(message) | Notice::Error(message) => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Pending,
    /// Refused before reaching the backend
    Rejected,
    Failed,
    Accepted,
}

/// Result of the most recent `SubmitIdea`, numbered so a renderer can match
/// it to the input it sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub attempt: u64,
    pub outcome: SubmitOutcome,
}

/// Render snapshot published after every processed input
#[derive(Debug, Clone, PartialEq)]
pub struct DeckView {
    pub status: DeckStatus,
    pub current: Option<Card>,
    pub position: usize,
    pub total: usize,
    pub phase: AnimationPhase,
    pub dx: f32,
    pub committed: Option<VoteDirection>,
    /// Changes whenever a phase starts; renderers restart their phase clock on change
    pub phase_generation: u64,
    pub phase_duration: Duration,
    pub viewport_width: f32,
    pub submitting: bool,
    /// Count of `SubmitIdea` inputs seen so far
    pub submit_attempts: u64,
    pub last_submit: Option<SubmitReceipt>,
    pub notice: Option<Notice>,
}

impl DeckView {
    pub fn accepts_votes(&self) -> bool {
        self.current.is_some() && self.phase == AnimationPhase::Idle
    }
}

/// Synchronous core: tracker, classifier, sequencer and deck wired together.
///
/// Time only enters through the pointer timestamps and through `on_timer`,
/// which the owner calls once a returned [`PhaseTimer`] has elapsed.
pub struct SwipeEngine<V> {
    tracker: PointerTracker,
    classifier: GestureClassifier,
    sequencer: AnimationSequencer,
    deck: DeckController,
    dispatcher: VoteDispatcher<V>,
    viewport_width: f32,
    submit_attempts: u64,
    in_flight_submit: Option<u64>,
    last_submit: Option<SubmitReceipt>,
    notice: Option<Notice>,
}

impl<V: VoteClient> SwipeEngine<V> {
    pub fn new(settings: EngineSettings, dispatcher: VoteDispatcher<V>) -> Self {
        Self {
            tracker: PointerTracker::new(settings.gesture.axis_lock_px),
            classifier: GestureClassifier::new(settings.gesture),
            sequencer: AnimationSequencer::new(settings.animation),
            deck: DeckController::new(),
            dispatcher,
            viewport_width: settings.viewport_width,
            submit_attempts: 0,
            in_flight_submit: None,
            last_submit: None,
            notice: None,
        }
    }

    pub fn phase(&self) -> AnimationPhase {
        self.sequencer.phase()
    }

    pub fn set_viewport_width(&mut self, viewport_width: f32) {
        if viewport_width.is_finite() && viewport_width > 0.0 {
            self.viewport_width = viewport_width;
        } else {
            warn!("Ignoring invalid viewport width {}", viewport_width);
        }
    }

    /// Feeds one pointer event through the gesture pipeline.
    /// Returns the timer for a phase that started as a consequence.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<PhaseTimer> {
        match event {
            PointerEvent::Down {
                x,
                y,
                pointer_id,
                timestamp,
            } => {
                if self.deck.current().is_none() || !self.sequencer.is_idle() {
                    debug!(
                        "Ignoring pointer {} down during {:?}",
                        pointer_id,
                        self.sequencer.phase()
                    );
                    return None;
                }
                if self.tracker.on_pointer_down(x, y, pointer_id, timestamp) {
                    if let Err(e) = self.sequencer.begin_drag() {
                        warn!("Could not start drag: {}", e);
                        self.tracker.reset();
                    }
                }
                None
            }
            PointerEvent::Move {
                x, y, pointer_id, ..
            } => {
                match self.tracker.on_pointer_move(x, y, pointer_id)? {
                    MoveStatus::Pending => {}
                    MoveStatus::LockedHorizontal { dx } => {
                        self.sequencer.drag_to(dx);
                    }
                    MoveStatus::LockedVertical => {
                        if let Err(e) = self.sequencer.abort_drag() {
                            warn!("Could not abort drag: {}", e);
                        }
                    }
                }
                None
            }
            PointerEvent::Up {
                pointer_id,
                timestamp,
            } => {
                let release = self.tracker.on_pointer_up(pointer_id, timestamp)?;
                let decision = self
                    .classifier
                    .decide_on_release(release.dx, release.elapsed_ms);
                debug!("Release classified as {:?}", decision);
                let timer = match decision {
                    ReleaseDecision::SnapBack => self.sequencer.snap_back(self.viewport_width),
                    ReleaseDecision::Commit(direction) => self.sequencer.throw_out(direction),
                };
                match timer {
                    Ok(timer) => Some(timer),
                    Err(e) => {
                        warn!("Release ignored: {}", e);
                        None
                    }
                }
            }
            PointerEvent::Cancel { pointer_id, .. } => {
                if !self.tracker.on_pointer_cancel(pointer_id) {
                    return None;
                }
                match self.sequencer.snap_back(self.viewport_width) {
                    Ok(timer) => Some(timer),
                    Err(e) => {
                        warn!("Cancel ignored: {}", e);
                        None
                    }
                }
            }
        }
    }

    /// Throws the resting card out without a drag
    pub fn vote(&mut self, direction: VoteDirection) -> Option<PhaseTimer> {
        if self.deck.current().is_none() || !self.sequencer.is_idle() {
            debug!(
                "Ignoring {} vote during {:?}",
                direction,
                self.sequencer.phase()
            );
            return None;
        }
        self.sequencer.throw_out(direction).ok()
    }

    /// Completes the phase identified by `token` and applies its deck effect
    pub fn on_timer(&mut self, token: PhaseToken) -> Option<PhaseTimer> {
        let (event, next) = self.sequencer.on_timer(token)?;
        match event {
            PhaseEvent::ThrowLanded(direction) => {
                if let Err(e) = self.deck.commit_vote(direction, &self.dispatcher) {
                    warn!("Vote not committed: {}", e);
                }
            }
            PhaseEvent::ExitFinished => self.deck.advance(),
            PhaseEvent::SnapSettled | PhaseEvent::EnterSettled => {}
        }
        next
    }

    /// Drops every live gesture and pending phase, then empties the deck
    pub fn begin_reload(&mut self) -> LoadTicket {
        self.tracker.reset();
        self.sequencer.reset();
        self.deck.begin_load()
    }

    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Card>, ApiError>,
    ) -> Result<usize, DeckError> {
        let loaded = self.deck.finish_load(ticket, result);
        if let Err(DeckError::Load(e)) = &loaded {
            self.notice = Some(Notice::Error(format!("Could not load ideas: {}", e)));
        }
        loaded
    }

    /// Validates idea text and marks a submission as running
    pub fn begin_submit(&mut self, text: &str) -> Result<String, DeckError> {
        self.submit_attempts += 1;
        let attempt = self.submit_attempts;
        if self.in_flight_submit.is_some() {
            self.settle_submit(attempt, SubmitOutcome::Rejected);
            return Err(DeckError::SubmitInProgress);
        }
        match validate_idea(text) {
            Ok(text) => {
                self.in_flight_submit = Some(attempt);
                self.settle_submit(attempt, SubmitOutcome::Pending);
                self.notice = None;
                Ok(text)
            }
            Err(e) => {
                self.settle_submit(attempt, SubmitOutcome::Rejected);
                self.notice = Some(Notice::Error(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Returns the reload ticket when the idea was accepted
    pub fn finish_submit(&mut self, result: Result<Card, ApiError>) -> Option<LoadTicket> {
        let attempt = self.in_flight_submit.take().unwrap_or(self.submit_attempts);
        match result {
            Ok(card) => {
                info!("Idea {} accepted, reloading deck", card.id);
                self.settle_submit(attempt, SubmitOutcome::Accepted);
                self.notice = Some(Notice::Info("Thanks! Your idea was submitted.".to_string()));
                Some(self.begin_reload())
            }
            Err(e) => {
                warn!("Idea submission failed: {}", e);
                self.settle_submit(attempt, SubmitOutcome::Failed);
                self.notice = Some(Notice::Error(DeckError::Submit(e).to_string()));
                None
            }
        }
    }

    fn settle_submit(&mut self, attempt: u64, outcome: SubmitOutcome) {
        self.last_submit = Some(SubmitReceipt { attempt, outcome });
    }

    pub fn view(&self) -> DeckView {
        DeckView {
            status: self.deck.status(),
            current: self.deck.current().cloned(),
            position: self.deck.position(),
            total: self.deck.len(),
            phase: self.sequencer.phase(),
            dx: self.sequencer.dx(),
            committed: self.sequencer.committed(),
            phase_generation: self.sequencer.generation(),
            phase_duration: self.sequencer.phase_duration(),
            viewport_width: self.viewport_width,
            submitting: self.in_flight_submit.is_some(),
            submit_attempts: self.submit_attempts,
            last_submit: self.last_submit,
            notice: self.notice.clone(),
        }
    }
}
