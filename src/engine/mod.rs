//! Engine orchestration
//!
//! ```text
//! PointerEvent ─► PointerTracker ─► GestureClassifier ─► AnimationSequencer
//!                                                            │ PhaseEvent
//!                                                            ▼
//!                                          DeckController ─► VoteDispatcher
//! ```
//!
//! [`SwipeEngine`] wires the pieces together without owning a clock.
//! [`EngineHandle`] runs it on a single tokio task that waits on inputs,
//! network completions and the one pending phase timer.

pub mod engine_handle;
pub mod swipe_engine;

pub use engine_handle::EngineHandle;
pub use swipe_engine::{
    DeckView, EngineInput, EngineSettings, Notice, SubmitOutcome, SubmitReceipt, SwipeEngine,
};
