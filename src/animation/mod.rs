//! Card animation sequencing
//!
//! # State Machine
//!
//! ```text
//!          pointer-down            release: SnapBack          timer
//! Idle ───────────────► Dragging ───────────────► SnappingBack ─────► Idle
//!  │                       │
//!  │ button vote           │ release: Commit(direction)
//!  ▼                       ▼
//! ThrowingOut ◄────────────┘
//!      │ timer (throw landed: vote committed)
//!      ▼
//!   Exiting ──timer (deck advances)──► Entering ──timer──► Idle
//! ```
//!
//! Timed phases always run to completion. Each one hands out a
//! [`PhaseTimer`] whose token must be returned to
//! [`AnimationSequencer::on_timer`]; a reset makes all outstanding tokens stale.

pub mod sequencer;
pub mod visuals;

pub use sequencer::{
    AnimationPhase, AnimationSequencer, AnimationSettings, PhaseEvent, PhaseTimer, PhaseToken,
    SequencerError,
};
pub use visuals::{card_visual, rotation_deg, Aura, AuraTint, CardVisual, FrameInput, Stamp};
