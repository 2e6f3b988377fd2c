use crate::deck::VoteDirection;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Visual phase of the active card
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AnimationPhase {
    #[default]
    Idle,
    Dragging,
    SnappingBack,
    ThrowingOut,
    Exiting,
    Entering,
}

/// Phase timings and throw geometry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub snap_base_ms: u64,
    pub snap_extra_ms: u64,
    /// Share of the viewport width at which the snap-back reaches its longest duration
    pub snap_overshoot_ratio: f32,
    pub throw_ms: u64,
    pub throw_distance_px: f32,
    pub exit_ms: u64,
    pub enter_ms: u64,
    pub max_rotation_deg: f32,
    /// Share of the viewport width at which rotation saturates
    pub rotation_span_ratio: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            snap_base_ms: 220,
            snap_extra_ms: 180,
            snap_overshoot_ratio: 0.6,
            throw_ms: 320,
            throw_distance_px: 900.0,
            exit_ms: 400,
            enter_ms: 200,
            max_rotation_deg: 10.0,
            rotation_span_ratio: 0.5,
        }
    }
}

impl AnimationSettings {
    /// Longer snap-backs for larger overshoots, between base and base + extra
    pub fn snap_duration(&self, dx: f32, viewport_width: f32) -> Duration {
        let span = viewport_width * self.snap_overshoot_ratio;
        let ratio = if span > 0.0 && dx.is_finite() {
            (dx.abs() / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let ms = (self.snap_base_ms as f32 + ratio * self.snap_extra_ms as f32).round();
        Duration::from_millis(ms as u64)
    }
}

/// Identifies one scheduled phase transition. Tokens from before a reset,
/// or from a phase that already ended, are rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PhaseToken {
    generation: u64,
}

impl PhaseToken {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Request to call [`AnimationSequencer::on_timer`] after `delay`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseTimer {
    pub token: PhaseToken,
    pub delay: Duration,
}

/// What finished when a phase timer fired
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseEvent {
    SnapSettled,
    ThrowLanded(VoteDirection),
    ExitFinished,
    EnterSettled,
}

#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("Cannot {action} while the card is {phase:?}")]
    WrongPhase {
        action: &'static str,
        phase: AnimationPhase,
    },
}

/// Timed state machine driving the active card.
///
/// Exactly one phase is current and at most one transition is scheduled.
/// Every phase change bumps the generation, which invalidates any token
/// handed out before it.
#[derive(Debug, Default)]
pub struct AnimationSequencer {
    settings: AnimationSettings,
    phase: AnimationPhase,
    dx: f32,
    committed: Option<VoteDirection>,
    generation: u64,
    pending: Option<PhaseToken>,
    phase_duration: Duration,
}

impl AnimationSequencer {
    pub fn new(settings: AnimationSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &AnimationSettings {
        &self.settings
    }

    pub fn phase(&self) -> AnimationPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == AnimationPhase::Idle
    }

    /// Displacement at the start of the current phase (live while dragging)
    pub fn dx(&self) -> f32 {
        self.dx
    }

    pub fn committed(&self) -> Option<VoteDirection> {
        self.committed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending(&self) -> Option<PhaseToken> {
        self.pending
    }

    pub fn phase_duration(&self) -> Duration {
        self.phase_duration
    }

    fn enter_untimed(&mut self, phase: AnimationPhase) {
        self.generation += 1;
        debug!("Phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
        self.phase_duration = Duration::ZERO;
        self.pending = None;
    }

    fn enter_timed(&mut self, phase: AnimationPhase, delay: Duration) -> PhaseTimer {
        self.generation += 1;
        debug!(
            "Phase {:?} -> {:?} for {}ms",
            self.phase,
            phase,
            delay.as_millis()
        );
        self.phase = phase;
        self.phase_duration = delay;
        let token = PhaseToken {
            generation: self.generation,
        };
        self.pending = Some(token);
        PhaseTimer { token, delay }
    }

    fn wrong_phase(&self, action: &'static str) -> SequencerError {
        SequencerError::WrongPhase {
            action,
            phase: self.phase,
        }
    }

    pub fn begin_drag(&mut self) -> Result<(), SequencerError> {
        if self.phase != AnimationPhase::Idle {
            return Err(self.wrong_phase("begin a drag"));
        }
        self.dx = 0.0;
        self.committed = None;
        self.enter_untimed(AnimationPhase::Dragging);
        Ok(())
    }

    /// Live displacement update; ignored outside of Dragging
    pub fn drag_to(&mut self, dx: f32) -> bool {
        if self.phase != AnimationPhase::Dragging {
            return false;
        }
        self.dx = dx;
        true
    }

    /// The gesture turned into a scroll before any displacement was applied
    pub fn abort_drag(&mut self) -> Result<(), SequencerError> {
        if self.phase != AnimationPhase::Dragging {
            return Err(self.wrong_phase("abort a drag"));
        }
        self.dx = 0.0;
        self.enter_untimed(AnimationPhase::Idle);
        Ok(())
    }

    pub fn snap_back(&mut self, viewport_width: f32) -> Result<PhaseTimer, SequencerError> {
        if self.phase != AnimationPhase::Dragging {
            return Err(self.wrong_phase("snap back"));
        }
        let duration = self.settings.snap_duration(self.dx, viewport_width);
        Ok(self.enter_timed(AnimationPhase::SnappingBack, duration))
    }

    /// Starts the throw from a release, or from rest for a button vote
    pub fn throw_out(&mut self, direction: VoteDirection) -> Result<PhaseTimer, SequencerError> {
        if !matches!(self.phase, AnimationPhase::Dragging | AnimationPhase::Idle) {
            return Err(self.wrong_phase("throw out"));
        }
        info!("Throwing card out: {}", direction);
        self.committed = Some(direction);
        let delay = Duration::from_millis(self.settings.throw_ms);
        Ok(self.enter_timed(AnimationPhase::ThrowingOut, delay))
    }

    /// Completes the current timed phase. Returns `None` for stale tokens.
    pub fn on_timer(&mut self, token: PhaseToken) -> Option<(PhaseEvent, Option<PhaseTimer>)> {
        if self.pending != Some(token) {
            debug!(
                "Ignoring stale phase timer {} (current generation {})",
                token.generation, self.generation
            );
            return None;
        }
        self.pending = None;

        match self.phase {
            AnimationPhase::SnappingBack => {
                self.dx = 0.0;
                self.enter_untimed(AnimationPhase::Idle);
                Some((PhaseEvent::SnapSettled, None))
            }
            AnimationPhase::ThrowingOut => {
                let direction = self.committed?;
                self.dx = direction.sign() * self.settings.throw_distance_px;
                let delay = Duration::from_millis(self.settings.exit_ms);
                let next = self.enter_timed(AnimationPhase::Exiting, delay);
                Some((PhaseEvent::ThrowLanded(direction), Some(next)))
            }
            AnimationPhase::Exiting => {
                self.dx = 0.0;
                self.committed = None;
                let delay = Duration::from_millis(self.settings.enter_ms);
                let next = self.enter_timed(AnimationPhase::Entering, delay);
                Some((PhaseEvent::ExitFinished, Some(next)))
            }
            AnimationPhase::Entering => {
                self.enter_untimed(AnimationPhase::Idle);
                Some((PhaseEvent::EnterSettled, None))
            }
            AnimationPhase::Idle | AnimationPhase::Dragging => {
                warn!("Phase timer fired in untimed phase {:?}", self.phase);
                None
            }
        }
    }

    /// Returns to rest and invalidates every outstanding token
    pub fn reset(&mut self) {
        if self.pending.is_some() {
            debug!("Invalidating pending {:?} transition", self.phase);
        }
        self.dx = 0.0;
        self.committed = None;
        self.enter_untimed(AnimationPhase::Idle);
    }
}
